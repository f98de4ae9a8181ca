// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Mesh Command
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use merger_core::input::mesh::{load_mesh, NpzMesh};

use super::{profile_and_write, ProfileOptions};

#[derive(Args)]
pub struct MeshArgs {
    /// `.npz` archive of flattened leaf-cell fields
    pub input: PathBuf,

    #[command(flatten)]
    pub profile: ProfileOptions,
}

pub fn execute(args: MeshArgs) -> Result<()> {
    let config = args.profile.load_config()?;
    let mut mesh = NpzMesh::open(&args.input)
        .with_context(|| format!("opening mesh archive {}", args.input.display()))?;
    let dataset = load_mesh(&mut mesh, &config.mesh_tracers).context("reading mesh fields")?;
    profile_and_write(&dataset, config, &args.profile.output_dir)
}
