// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};

/// Top-level run configuration for one profile extraction.
/// Every field has a default so a partial JSON file is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Outer cutoff radius for binning, or `auto` to find the bound edge.
    #[serde(default)]
    pub cutoff: Cutoff,
    /// Number of spherical bins.
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    /// Number of cylindrical bins. Defaults to `resolution / 10`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cylindrical_resolution: Option<usize>,
    #[serde(default)]
    pub spacing: Spacing,
    /// Built-in nuclear network name (ignored when `network_file` is set).
    #[serde(default = "default_network")]
    pub network: String,
    /// Custom composition table in the built-in JSON schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_file: Option<PathBuf>,
    #[serde(default)]
    pub core_policy: CorePolicy,
    /// First bin considered by the bound-edge search.
    #[serde(default = "default_scan_offset")]
    pub boundary_scan_offset: usize,
    /// Target stellar mass [Msun] used to rescale simulation-native dumps.
    #[serde(default = "default_initial_mass")]
    pub initial_mass: f64,
    /// Optional core/envelope entropy stitching against a 1D model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy_stitch: Option<EntropyStitch>,
    /// Mesh partial-density fields summed into each tracer population.
    #[serde(default = "default_mesh_tracers")]
    pub mesh_tracers: Vec<TracerSource>,
    /// Population assigned to bins that carry no tracer at all.
    #[serde(default = "default_untraced_population")]
    pub untraced_population: String,
}

/// Outer cutoff radius policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Bin once with a provisional cutoff, then re-bin at the bound edge.
    #[default]
    Auto,
    /// Fixed cutoff radius [cm].
    Fixed(f64),
}

/// Bin spacing law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    Linear,
    #[default]
    Logarithmic,
}

/// Post-EOS treatment of the core temperature and composition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CorePolicy {
    /// Leave EOS temperatures untouched.
    #[default]
    None,
    /// Raise cold, dense bins to a temperature floor.
    Floor(TemperatureFloor),
    /// Force an isothermal core and a sharp composition transition.
    IsothermalCore(IsothermalCore),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureFloor {
    #[serde(default = "default_floor_temperature")]
    pub temperature: f64,
    /// Only bins denser than this [g/cm³] are raised.
    #[serde(default = "default_floor_density")]
    pub min_density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsothermalCore {
    /// Interior mass whose nearest bin closes the core.
    pub target: CoreMassTarget,
    #[serde(default = "default_floor_temperature")]
    pub temperature: f64,
    /// Where the composition transition is placed.
    #[serde(default)]
    pub placement: TransitionPlacement,
    /// Tracer population that fills the core.
    #[serde(default = "default_inner_population")]
    pub inner_population: String,
    /// Tracer population that fills everything outside the transition.
    #[serde(default = "default_outer_population")]
    pub outer_population: String,
}

/// Interior-mass target of the isothermal core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreMassTarget {
    /// Fraction of the total profile mass, in (0, 1).
    MassFraction(f64),
    /// Absolute interior mass [Msun].
    SolarMasses(f64),
}

/// Index at which the composition switches populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPlacement {
    /// Bin whose interior mass is nearest the core target.
    #[default]
    NearestMass,
    /// Bin of peak temperature after the core is imposed.
    TemperaturePeak,
}

/// One tracer population read from mesh partial densities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSource {
    pub population: String,
    /// Partial-density fields, e.g. `rho_1`, summed then divided by density.
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyStitch {
    /// Two-column (q, entropy) table of the 1D model, any row order.
    pub profile: PathBuf,
    /// Exterior-mass coordinate of the seam.
    pub q_transition: f64,
}

fn default_resolution() -> usize {
    1000
}
fn default_network() -> String {
    "mesa_75_lowz".to_string()
}
fn default_scan_offset() -> usize {
    10
}
fn default_initial_mass() -> f64 {
    0.85
}
fn default_floor_temperature() -> f64 {
    1.0e7
}
fn default_floor_density() -> f64 {
    1.0e4
}
fn default_inner_population() -> String {
    "primary".to_string()
}
fn default_outer_population() -> String {
    "secondary".to_string()
}
fn default_untraced_population() -> String {
    "secondary".to_string()
}
fn default_mesh_tracers() -> Vec<TracerSource> {
    vec![
        TracerSource {
            population: "primary".to_string(),
            fields: vec!["rho_1".to_string(), "rho_2".to_string()],
        },
        TracerSource {
            population: "secondary".to_string(),
            fields: vec!["rho_3".to_string(), "rho_4".to_string()],
        },
    ]
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            cutoff: Cutoff::default(),
            resolution: default_resolution(),
            cylindrical_resolution: None,
            spacing: Spacing::default(),
            network: default_network(),
            network_file: None,
            core_policy: CorePolicy::default(),
            boundary_scan_offset: default_scan_offset(),
            initial_mass: default_initial_mass(),
            entropy_stitch: None,
            mesh_tracers: default_mesh_tracers(),
            untraced_population: default_untraced_population(),
        }
    }
}

impl RunConfig {
    /// Load from a JSON file and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ProfileResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Cylindrical bin count, one tenth of the spherical count unless set.
    pub fn cylindrical_resolution(&self) -> usize {
        self.cylindrical_resolution
            .unwrap_or(self.resolution / 10)
            .max(2)
    }

    pub fn validate(&self) -> ProfileResult<()> {
        if self.resolution < 2 {
            return Err(ProfileError::ConfigError(format!(
                "resolution must be >= 2, got {}",
                self.resolution
            )));
        }
        if let Some(n) = self.cylindrical_resolution {
            if n < 2 {
                return Err(ProfileError::ConfigError(format!(
                    "cylindrical_resolution must be >= 2, got {n}"
                )));
            }
        }
        if let Cutoff::Fixed(r_max) = self.cutoff {
            if !r_max.is_finite() || r_max <= 0.0 {
                return Err(ProfileError::ConfigError(format!(
                    "fixed cutoff must be finite and > 0, got {r_max}"
                )));
            }
            if self.spacing == Spacing::Logarithmic && r_max <= 1.0 {
                return Err(ProfileError::ConfigError(format!(
                    "logarithmic spacing needs a cutoff > 1 cm, got {r_max}"
                )));
            }
        }
        if !self.initial_mass.is_finite() || self.initial_mass <= 0.0 {
            return Err(ProfileError::ConfigError(format!(
                "initial_mass must be finite and > 0, got {}",
                self.initial_mass
            )));
        }
        if self.network_file.is_none() && self.network.trim().is_empty() {
            return Err(ProfileError::ConfigError(
                "either network or network_file must be set".to_string(),
            ));
        }
        match &self.core_policy {
            CorePolicy::None => {}
            CorePolicy::Floor(floor) => {
                if !floor.temperature.is_finite() || floor.temperature <= 0.0 {
                    return Err(ProfileError::ConfigError(format!(
                        "floor temperature must be finite and > 0, got {}",
                        floor.temperature
                    )));
                }
            }
            CorePolicy::IsothermalCore(core) => {
                if !core.temperature.is_finite() || core.temperature <= 0.0 {
                    return Err(ProfileError::ConfigError(format!(
                        "isothermal core temperature must be finite and > 0, got {}",
                        core.temperature
                    )));
                }
                match core.target {
                    CoreMassTarget::MassFraction(f) if !(f > 0.0 && f < 1.0) => {
                        return Err(ProfileError::ConfigError(format!(
                            "core mass fraction must lie in (0, 1), got {f}"
                        )));
                    }
                    CoreMassTarget::SolarMasses(m) if !m.is_finite() || m <= 0.0 => {
                        return Err(ProfileError::ConfigError(format!(
                            "core mass must be finite and > 0 Msun, got {m}"
                        )));
                    }
                    _ => {}
                }
                if core.inner_population == core.outer_population {
                    return Err(ProfileError::ConfigError(format!(
                        "core inner and outer populations must differ, both are `{}`",
                        core.inner_population
                    )));
                }
            }
        }
        if self.untraced_population.trim().is_empty() {
            return Err(ProfileError::ConfigError(
                "untraced_population must name a population".to_string(),
            ));
        }
        if self.mesh_tracers.is_empty() {
            return Err(ProfileError::ConfigError(
                "mesh_tracers must name at least one population".to_string(),
            ));
        }
        for (k, source) in self.mesh_tracers.iter().enumerate() {
            if source.fields.is_empty() {
                return Err(ProfileError::ConfigError(format!(
                    "mesh tracer `{}` has no fields",
                    source.population
                )));
            }
            if self.mesh_tracers[..k]
                .iter()
                .any(|s| s.population == source.population)
            {
                return Err(ProfileError::ConfigError(format!(
                    "mesh tracer `{}` is listed twice",
                    source.population
                )));
            }
        }
        if let Some(stitch) = &self.entropy_stitch {
            if !(0.0..=1.0).contains(&stitch.q_transition) {
                return Err(ProfileError::ConfigError(format!(
                    "entropy stitch q_transition must lie in [0, 1], got {}",
                    stitch.q_transition
                )));
            }
        }
        Ok(())
    }
}
