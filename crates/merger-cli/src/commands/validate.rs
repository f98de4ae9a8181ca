// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Validate Command
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Configuration check: parses the file, validates it, and loads its
//! composition table and entropy model so a batch run fails early.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use merger_core::composition::CompositionTable;
use merger_core::stitch::EntropyProfile;
use merger_types::config::RunConfig;

#[derive(Args)]
pub struct ValidateArgs {
    /// JSON run configuration
    pub config: PathBuf,

    /// Print the configuration with every default filled in
    #[arg(long)]
    pub print: bool,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let config = RunConfig::from_file(&args.config)
        .with_context(|| format!("loading configuration {}", args.config.display()))?;

    let table = match &config.network_file {
        Some(path) => CompositionTable::from_file(path)
            .with_context(|| format!("loading network {}", path.display()))?,
        None => CompositionTable::builtin(&config.network).context("loading built-in network")?,
    };
    info!("network `{}`: {} isotopes", table.name(), table.n_isotopes());

    if let Some(stitch) = &config.entropy_stitch {
        let model = EntropyProfile::from_table_file(&stitch.profile)
            .with_context(|| format!("loading entropy model {}", stitch.profile.display()))?;
        info!("entropy model: {} points", model.len());
    }

    if args.print {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    info!("{} is valid", args.config.display());
    Ok(())
}
