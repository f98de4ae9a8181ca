// ─────────────────────────────────────────────────────────────────────
// Merger Profile — CLI Commands
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
pub mod dump;
pub mod mesh;
pub mod networks;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use merger_core::eos::IdealGasEos;
use merger_core::pipeline::ProfilePipeline;
use merger_types::config::{Cutoff, RunConfig};
use merger_types::state::CellDataset;

/// Options shared by every profiling command.
#[derive(Args)]
pub struct ProfileOptions {
    /// JSON run configuration; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the output tables
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Fixed cutoff radius [cm], overriding the configuration
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// Number of spherical bins, overriding the configuration
    #[arg(long)]
    pub resolution: Option<usize>,
}

impl ProfileOptions {
    pub fn load_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => RunConfig::default(),
        };
        if let Some(r_max) = self.cutoff {
            config.cutoff = Cutoff::Fixed(r_max);
        }
        if let Some(n) = self.resolution {
            config.resolution = n;
        }
        config.validate().context("validating configuration")?;
        Ok(config)
    }
}

/// Run the pipeline on a loaded dataset and write every table.
pub fn profile_and_write(dataset: &CellDataset, config: RunConfig, output_dir: &Path) -> Result<()> {
    let eos = IdealGasEos;
    let pipeline = ProfilePipeline::new(config, &eos).context("preparing pipeline")?;
    let artifacts = pipeline.run(dataset).context("profiling snapshot")?;
    let tables = artifacts.tables().context("building output tables")?;
    let written = tables
        .write_to_dir(output_dir)
        .with_context(|| format!("writing tables to {}", output_dir.display()))?;
    info!(
        "done: {} bins, cutoff {:.4e} cm, {} files",
        artifacts.spherical.len(),
        artifacts.cutoff,
        written.len()
    );
    Ok(())
}
