// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Dump Command
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use merger_core::input::dump::{load_dump_file, RescaleConstants};

use super::{profile_and_write, ProfileOptions};

#[derive(Args)]
pub struct DumpArgs {
    /// Whitespace-delimited cell dump
    pub input: PathBuf,

    #[command(flatten)]
    pub profile: ProfileOptions,

    /// Rescale to this white-dwarf mass [Msun], overriding the configuration
    #[arg(long)]
    pub initial_mass: Option<f64>,

    /// Treat the dump as already in cgs units
    #[arg(long, conflicts_with = "initial_mass")]
    pub no_rescale: bool,
}

pub fn execute(args: DumpArgs) -> Result<()> {
    let mut config = args.profile.load_config()?;
    if let Some(m) = args.initial_mass {
        config.initial_mass = m;
    }
    let scale = if args.no_rescale {
        RescaleConstants::identity()
    } else {
        RescaleConstants::from_initial_mass(config.initial_mass)
            .context("computing rescale constants")?
    };
    let dataset = load_dump_file(&args.input, &scale)
        .with_context(|| format!("reading dump {}", args.input.display()))?;
    profile_and_write(&dataset, config, &args.profile.output_dir)
}
