// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! ProfilePipeline: one batch run from a cell dataset to output tables.
//!
//! Stages:
//! 1. Resolve the cutoff (fixed, or a provisional pass at max(r)/√3 followed
//!    by the bound-edge search)
//! 2. Spherical and cylindrical binning at the cutoff
//! 3. Mass coordinates and binding energy
//! 4. Composition reconstruction
//! 5. EOS inversion and core policy
//! 6. Optional entropy stitching
//!
//! Every table is built before any file is written.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use merger_math::interp::nearest_index;
use merger_types::config::{Cutoff, RunConfig, Spacing};
use merger_types::constants::M_SUN;
use merger_types::error::{ProfileError, ProfileResult};
use merger_types::state::{CellDataset, CylindricalProfile, SphericalProfile};
use ndarray::Array1;

use crate::assembler::ProfileAssembler;
use crate::binding::{BindingEnergy, BoundEdge};
use crate::composition::{reconstruct, Abundances, CompositionTable};
use crate::core_policy::{apply_core_policy, CoreReport};
use crate::eos::{EosInput, EosOutput, EquationOfState};
use crate::mass_coord::MassCoordinate;
use crate::output::{
    abundance_table, angular_momentum_table, density_temperature_table, entropy_table, Table,
    ABUNDANCE_FILE, ANGULAR_MOMENTUM_FILE, DENSITY_TEMPERATURE_FILE, ENTROPY_FILE,
};
use crate::stitch::{stitch_entropy, EntropyProfile};

/// Everything one run computes.
#[derive(Debug, Clone)]
pub struct ProfileArtifacts {
    pub cutoff: f64,
    pub spherical: SphericalProfile,
    pub cylindrical: CylindricalProfile,
    pub mass: MassCoordinate,
    pub cylindrical_mass: MassCoordinate,
    pub binding: BindingEnergy,
    /// Bound edge of the final profile, if total energy changes sign.
    pub bound_edge: Option<BoundEdge>,
    pub abundances: Abundances,
    /// EOS output with the core policy applied to the temperature.
    pub thermo: EosOutput,
    pub core: CoreReport,
    pub stitched_entropy: Option<EntropyProfile>,
}

#[derive(Debug, Clone)]
pub struct OutputTables {
    pub density_temperature: Table,
    pub angular_momentum: Table,
    pub abundance: Table,
    pub entropy: Option<Table>,
}

impl ProfileArtifacts {
    pub fn tables(&self) -> ProfileResult<OutputTables> {
        let q = self.mass.q();
        Ok(OutputTables {
            density_temperature: density_temperature_table(
                q,
                self.spherical.density(),
                self.thermo.temperature.view(),
            )?,
            angular_momentum: angular_momentum_table(
                self.cylindrical_mass.q(),
                self.cylindrical.angular_momentum(),
            )?,
            abundance: abundance_table(q, self.abundances.abundance())?,
            entropy: self
                .stitched_entropy
                .as_ref()
                .map(|s| entropy_table(s.q(), s.entropy()))
                .transpose()?,
        })
    }
}

impl OutputTables {
    /// Write every table into `dir`, returning the written paths.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> ProfileResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut targets = vec![
            (DENSITY_TEMPERATURE_FILE, &self.density_temperature),
            (ANGULAR_MOMENTUM_FILE, &self.angular_momentum),
            (ABUNDANCE_FILE, &self.abundance),
        ];
        if let Some(entropy) = &self.entropy {
            targets.push((ENTROPY_FILE, entropy));
        }
        let mut written = Vec::with_capacity(targets.len());
        for (name, table) in targets {
            let path = dir.join(name);
            table.write_file(&path)?;
            info!("wrote {} rows to {}", table.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

pub struct ProfilePipeline<'a> {
    config: RunConfig,
    table: CompositionTable,
    eos: &'a dyn EquationOfState,
}

impl<'a> ProfilePipeline<'a> {
    /// Validate the configuration and load its composition table.
    pub fn new(config: RunConfig, eos: &'a dyn EquationOfState) -> ProfileResult<Self> {
        config.validate()?;
        let table = match &config.network_file {
            Some(path) => CompositionTable::from_file(path)?,
            None => CompositionTable::builtin(&config.network)?,
        };
        info!(
            "network `{}` with {} isotopes, EOS `{}`",
            table.name(),
            table.n_isotopes(),
            eos.name()
        );
        Ok(Self::with_table(config, table, eos))
    }

    pub fn with_table(
        config: RunConfig,
        table: CompositionTable,
        eos: &'a dyn EquationOfState,
    ) -> Self {
        ProfilePipeline { config, table, eos }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn table(&self) -> &CompositionTable {
        &self.table
    }

    /// Fixed cutoff, or the bound edge of a provisional pass.
    pub fn resolve_cutoff(&self, dataset: &CellDataset) -> ProfileResult<f64> {
        match self.config.cutoff {
            Cutoff::Fixed(r_max) => Ok(r_max),
            Cutoff::Auto => {
                let provisional = dataset.max_radius() / 3f64.sqrt();
                debug!("provisional cutoff {provisional:.4e} cm");
                let assembler = ProfileAssembler::from_config(&self.config);
                let profile = assembler.spherical(dataset, provisional)?;
                let mass = MassCoordinate::from_masses(profile.mass())?;
                let edge = BindingEnergy::estimate(&profile, &mass)?
                    .bound_edge(self.config.boundary_scan_offset)?;
                if self.config.spacing == Spacing::Logarithmic && edge.radius <= 1.0 {
                    return Err(ProfileError::ConfigError(format!(
                        "bound edge at {:.4e} cm is too small for logarithmic binning",
                        edge.radius
                    )));
                }
                info!(
                    "bound edge at r = {:.4e} cm, mr = {:.4} Msun",
                    edge.radius,
                    edge.interior_mass / M_SUN
                );
                Ok(edge.radius)
            }
        }
    }

    pub fn run(&self, dataset: &CellDataset) -> ProfileResult<ProfileArtifacts> {
        info!(
            "profiling {} cells, total mass {:.4} Msun",
            dataset.len(),
            dataset.total_mass() / M_SUN
        );
        let cutoff = self.resolve_cutoff(dataset)?;
        let assembled = ProfileAssembler::from_config(&self.config).assemble(dataset, cutoff)?;
        let spherical = assembled.spherical;
        let cylindrical = assembled.cylindrical;

        let mass = MassCoordinate::from_masses(spherical.mass())?;
        let cylindrical_mass = MassCoordinate::from_masses(cylindrical.mass())?;
        info!(
            "profile mass {:.4} Msun in {} bins ({} empty bins removed)",
            mass.total_mass() / M_SUN,
            spherical.len(),
            self.config.resolution.saturating_sub(spherical.len())
        );

        let binding = BindingEnergy::estimate(&spherical, &mass)?;
        let bound_edge = match binding.bound_edge(self.config.boundary_scan_offset) {
            Ok(edge) => Some(edge),
            Err(ProfileError::BoundaryNotFound { .. }) => {
                debug!("final profile has no bound edge");
                None
            }
            Err(e) => return Err(e),
        };

        let mut abundances = reconstruct(
            spherical.tracers(),
            spherical.tracer_names(),
            &self.table,
            &self.config.untraced_population,
        )?;
        log_composition_seam(&spherical, &mass);

        let eint = spherical.internal_energy();
        let energy_density = &eint * &spherical.density();
        let mut thermo = self.eos.evaluate(&EosInput {
            density: spherical.density(),
            energy_density: energy_density.view(),
            abar: abundances.abar(),
            zbar: abundances.zbar(),
        })?;
        let core = apply_core_policy(
            &self.config.core_policy,
            &mut thermo.temperature,
            spherical.density(),
            &mass,
            &mut abundances,
            &self.table,
        )?;

        let stitched_entropy = match &self.config.entropy_stitch {
            Some(stitch) => {
                let model = EntropyProfile::from_table_file(&stitch.profile)?;
                let merger = EntropyProfile::new(mass.q().to_owned(), thermo.entropy.clone())?;
                Some(stitch_entropy(&model, &merger, stitch.q_transition)?)
            }
            None => None,
        };

        Ok(ProfileArtifacts {
            cutoff,
            spherical,
            cylindrical,
            mass,
            cylindrical_mass,
            binding,
            bound_edge,
            abundances,
            thermo,
            core,
            stitched_entropy,
        })
    }
}

/// Log where the two stellar populations are equally mixed.
fn log_composition_seam(profile: &SphericalProfile, mass: &MassCoordinate) {
    let names = profile.tracer_names();
    let primary = names.iter().position(|n| n == "primary");
    let secondary = names.iter().position(|n| n == "secondary");
    if let (Some(p), Some(s)) = (primary, secondary) {
        let tracers = profile.tracers();
        let diff: Array1<f64> = (&tracers.column(p) - &tracers.column(s)).mapv(f64::abs);
        if let Some(i) = nearest_index(diff.view(), 0.0) {
            info!("populations equally mixed at q = {:.4}", mass.q()[i]);
        }
    } else {
        warn!("no primary/secondary tracer pair, skipping mixing diagnostic");
    }
}
