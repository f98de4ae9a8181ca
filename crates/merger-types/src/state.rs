// ─────────────────────────────────────────────────────────────────────
// Merger Profile — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::fmt;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::constants::TAU_EXPONENT;
use crate::error::{ProfileError, ProfileResult};

/// Raw per-cell columns as delivered by an input adapter, in cgs units.
/// Positions are cell centres; they need not be centred yet.
#[derive(Debug, Clone)]
pub struct CellColumns {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array1<f64>,
    pub volume: Array1<f64>,  // dV [cm³]
    pub density: Array1<f64>, // rho [g/cm³]
    pub sx: Array1<f64>,      // momentum density [g cm⁻² s⁻¹]
    pub sy: Array1<f64>,
    pub sz: Array1<f64>,
    pub tau: Array1<f64>, // entropy tracer, (rho e)^(3/5)
    /// Tracer mass fractions [n_cells, n_tracers]
    pub tracers: Array2<f64>,
    pub tracer_names: Vec<String>,
}

/// Whether momenta are shifted into the density-maximum cell's rest frame
/// when centring a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShift {
    /// Keep inertial-frame momenta.
    Inertial,
    /// Subtract the central cell's velocity from every cell.
    CentralCell,
}

/// Immutable AMR cell set with eagerly derived per-cell scalars.
/// Matches Python: d['r'], d['R'], d['dm'], d['j'], d['ek'], ...
#[derive(Debug, Clone)]
pub struct CellDataset {
    columns: CellColumns,
    r: Array1<f64>,        // spherical radius [cm]
    r_cyl: Array1<f64>,    // cylindrical radius [cm]
    mass: Array1<f64>,     // dm = rho dV [g]
    j: Array1<f64>,        // |x sy - y sx| / rho [cm²/s]
    ek: Array1<f64>,       // 0.5 |s|² / rho² [erg/g]
}

impl CellDataset {
    /// Build from columns whose positions are already relative to the
    /// stellar centre.
    pub fn new(columns: CellColumns) -> ProfileResult<Self> {
        validate_columns(&columns)?;

        let n = columns.x.len();
        let mut r = Array1::zeros(n);
        let mut r_cyl = Array1::zeros(n);
        let mut mass = Array1::zeros(n);
        let mut j = Array1::zeros(n);
        let mut ek = Array1::zeros(n);
        for i in 0..n {
            let (x, y, z) = (columns.x[i], columns.y[i], columns.z[i]);
            let (sx, sy, sz) = (columns.sx[i], columns.sy[i], columns.sz[i]);
            let rho = columns.density[i];
            r[i] = (x * x + y * y + z * z).sqrt();
            r_cyl[i] = (x * x + y * y).sqrt();
            mass[i] = rho * columns.volume[i];
            j[i] = (x * sy - y * sx).abs() / rho;
            ek[i] = 0.5 * (sx * sx + sy * sy + sz * sz) / (rho * rho);
        }

        Ok(CellDataset {
            columns,
            r,
            r_cyl,
            mass,
            j,
            ek,
        })
    }

    /// Centre absolute-position columns on the density-maximum cell.
    ///
    /// The central cell gets the radius of a sphere with its volume instead of
    /// zero, and zero cylindrical radii get the same value, so that every cell
    /// has a strictly positive coordinate on both axes.
    pub fn centered_on_density_max(
        mut columns: CellColumns,
        frame: FrameShift,
    ) -> ProfileResult<Self> {
        validate_columns(&columns)?;

        let center = argmax(columns.density.view());
        let (x0, y0, z0) = (columns.x[center], columns.y[center], columns.z[center]);
        columns.x.mapv_inplace(|v| v - x0);
        columns.y.mapv_inplace(|v| v - y0);
        columns.z.mapv_inplace(|v| v - z0);

        if frame == FrameShift::CentralCell {
            let rho_c = columns.density[center];
            let (vx0, vy0, vz0) = (
                columns.sx[center] / rho_c,
                columns.sy[center] / rho_c,
                columns.sz[center] / rho_c,
            );
            for i in 0..columns.x.len() {
                let rho = columns.density[i];
                columns.sx[i] -= vx0 * rho;
                columns.sy[i] -= vy0 * rho;
                columns.sz[i] -= vz0 * rho;
            }
        }

        let r_center = (3.0 * columns.volume[center] / (4.0 * std::f64::consts::PI)).cbrt();
        let mut dataset = CellDataset::new(columns)?;
        dataset.r[center] = r_center;
        let on_axis = dataset.r_cyl.iter().filter(|&&v| v == 0.0).count();
        dataset
            .r_cyl
            .mapv_inplace(|v| if v == 0.0 { r_center } else { v });
        debug!(
            "centred on cell {center}: {on_axis} zero cylindrical radii set to {r_center:.4e} cm"
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    pub fn radius(&self) -> ArrayView1<'_, f64> {
        self.r.view()
    }

    pub fn cylindrical_radius(&self) -> ArrayView1<'_, f64> {
        self.r_cyl.view()
    }

    pub fn volume(&self) -> ArrayView1<'_, f64> {
        self.columns.volume.view()
    }

    pub fn density(&self) -> ArrayView1<'_, f64> {
        self.columns.density.view()
    }

    pub fn mass(&self) -> ArrayView1<'_, f64> {
        self.mass.view()
    }

    pub fn tau(&self) -> ArrayView1<'_, f64> {
        self.columns.tau.view()
    }

    pub fn angular_momentum(&self) -> ArrayView1<'_, f64> {
        self.j.view()
    }

    pub fn kinetic_energy(&self) -> ArrayView1<'_, f64> {
        self.ek.view()
    }

    pub fn position(&self) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        (
            self.columns.x.view(),
            self.columns.y.view(),
            self.columns.z.view(),
        )
    }

    pub fn tracers(&self) -> ArrayView2<'_, f64> {
        self.columns.tracers.view()
    }

    pub fn tracer(&self, k: usize) -> ArrayView1<'_, f64> {
        self.columns.tracers.column(k)
    }

    pub fn tracer_names(&self) -> &[String] {
        &self.columns.tracer_names
    }

    pub fn total_mass(&self) -> f64 {
        self.mass.sum()
    }

    pub fn max_radius(&self) -> f64 {
        self.r.iter().copied().fold(0.0, f64::max)
    }
}

fn argmax(values: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn validate_columns(c: &CellColumns) -> ProfileResult<()> {
    const STAGE: &str = "cell dataset";
    let n = c.x.len();
    if n == 0 {
        return Err(ProfileError::malformed(STAGE, 0, "dataset has no cells"));
    }
    let named = [
        ("y", c.y.len()),
        ("z", c.z.len()),
        ("volume", c.volume.len()),
        ("density", c.density.len()),
        ("sx", c.sx.len()),
        ("sy", c.sy.len()),
        ("sz", c.sz.len()),
        ("tau", c.tau.len()),
        ("tracers", c.tracers.len_of(Axis(0))),
    ];
    for (column, found) in named {
        if found != n {
            return Err(ProfileError::LengthMismatch {
                stage: STAGE,
                column: column.to_string(),
                expected: n,
                found,
            });
        }
    }
    if c.tracers.len_of(Axis(1)) != c.tracer_names.len() {
        return Err(ProfileError::LengthMismatch {
            stage: STAGE,
            column: "tracer_names".to_string(),
            expected: c.tracers.len_of(Axis(1)),
            found: c.tracer_names.len(),
        });
    }

    for i in 0..n {
        let dv = c.volume[i];
        if !dv.is_finite() || dv <= 0.0 {
            return Err(ProfileError::malformed(
                STAGE,
                i,
                format!("cell volume must be finite and > 0, got {dv}"),
            ));
        }
        let rho = c.density[i];
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ProfileError::malformed(
                STAGE,
                i,
                format!("density must be finite and > 0, got {rho}"),
            ));
        }
        let finite = [c.x[i], c.y[i], c.z[i], c.sx[i], c.sy[i], c.sz[i], c.tau[i]]
            .iter()
            .all(|v| v.is_finite());
        if !finite || c.tracers.row(i).iter().any(|v| !v.is_finite()) {
            return Err(ProfileError::malformed(STAGE, i, "non-finite cell value"));
        }
    }
    Ok(())
}

/// Which coordinate a profile was binned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAxis {
    Spherical,
    Cylindrical,
}

impl fmt::Display for ProfileAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileAxis::Spherical => write!(f, "spherical"),
            ProfileAxis::Cylindrical => write!(f, "cylindrical"),
        }
    }
}

/// Spherically averaged profile, innermost bin first, empty bins removed.
/// All arrays share one length; there is no way to resize a single column.
#[derive(Debug, Clone)]
pub struct SphericalProfile {
    radius: Array1<f64>,  // bin radius [cm]
    volume: Array1<f64>,  // Σ dV [cm³]
    mass: Array1<f64>,    // Σ dm [g]
    density: Array1<f64>, // volume-weighted rho [g/cm³]
    tau: Array1<f64>,     // volume-weighted tau
    ek: Array1<f64>,      // volume-weighted specific kinetic energy [erg/g]
    j: Array1<f64>,       // mass-weighted specific angular momentum [cm²/s]
    tracers: Array2<f64>, // mass-weighted tracer fractions [n_bins, n_tracers]
    tracer_names: Vec<String>,
}

/// Column set used to build a [`SphericalProfile`].
#[derive(Debug, Clone)]
pub struct SphericalColumns {
    pub radius: Array1<f64>,
    pub volume: Array1<f64>,
    pub mass: Array1<f64>,
    pub density: Array1<f64>,
    pub tau: Array1<f64>,
    pub ek: Array1<f64>,
    pub j: Array1<f64>,
    pub tracers: Array2<f64>,
    pub tracer_names: Vec<String>,
}

impl SphericalProfile {
    pub fn new(c: SphericalColumns) -> ProfileResult<Self> {
        const STAGE: &str = "spherical profile";
        let n = c.radius.len();
        let named = [
            ("volume", c.volume.len()),
            ("mass", c.mass.len()),
            ("density", c.density.len()),
            ("tau", c.tau.len()),
            ("ek", c.ek.len()),
            ("j", c.j.len()),
            ("tracers", c.tracers.len_of(Axis(0))),
        ];
        check_aligned(STAGE, n, &named)?;
        if c.tracers.len_of(Axis(1)) != c.tracer_names.len() {
            return Err(ProfileError::LengthMismatch {
                stage: STAGE,
                column: "tracer_names".to_string(),
                expected: c.tracers.len_of(Axis(1)),
                found: c.tracer_names.len(),
            });
        }
        Ok(SphericalProfile {
            radius: c.radius,
            volume: c.volume,
            mass: c.mass,
            density: c.density,
            tau: c.tau,
            ek: c.ek,
            j: c.j,
            tracers: c.tracers,
            tracer_names: c.tracer_names,
        })
    }

    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    pub fn radius(&self) -> ArrayView1<'_, f64> {
        self.radius.view()
    }

    pub fn volume(&self) -> ArrayView1<'_, f64> {
        self.volume.view()
    }

    pub fn mass(&self) -> ArrayView1<'_, f64> {
        self.mass.view()
    }

    pub fn density(&self) -> ArrayView1<'_, f64> {
        self.density.view()
    }

    pub fn tau(&self) -> ArrayView1<'_, f64> {
        self.tau.view()
    }

    pub fn kinetic_energy(&self) -> ArrayView1<'_, f64> {
        self.ek.view()
    }

    pub fn angular_momentum(&self) -> ArrayView1<'_, f64> {
        self.j.view()
    }

    pub fn tracers(&self) -> ArrayView2<'_, f64> {
        self.tracers.view()
    }

    pub fn tracer_names(&self) -> &[String] {
        &self.tracer_names
    }

    /// Specific internal energy from the averaged entropy tracer:
    /// e = tau^(5/3) / rho [erg/g].
    pub fn internal_energy(&self) -> Array1<f64> {
        let mut e = self.tau.mapv(|t| t.max(0.0).powf(TAU_EXPONENT));
        e.zip_mut_with(&self.density, |e, &rho| *e /= rho);
        e
    }

    /// Keep only bins whose mask entry is true, across every column at once.
    pub fn retain(&mut self, keep: &[bool]) -> ProfileResult<()> {
        if keep.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                stage: "spherical profile",
                column: "mask".to_string(),
                expected: self.len(),
                found: keep.len(),
            });
        }
        let idx = kept_indices(keep);
        self.radius = self.radius.select(Axis(0), &idx);
        self.volume = self.volume.select(Axis(0), &idx);
        self.mass = self.mass.select(Axis(0), &idx);
        self.density = self.density.select(Axis(0), &idx);
        self.tau = self.tau.select(Axis(0), &idx);
        self.ek = self.ek.select(Axis(0), &idx);
        self.j = self.j.select(Axis(0), &idx);
        self.tracers = self.tracers.select(Axis(0), &idx);
        Ok(())
    }
}

/// Cylindrically averaged angular-momentum profile, innermost bin first.
#[derive(Debug, Clone)]
pub struct CylindricalProfile {
    radius: Array1<f64>, // cylindrical bin radius [cm]
    volume: Array1<f64>,
    mass: Array1<f64>,
    j: Array1<f64>, // mass-weighted specific angular momentum [cm²/s]
}

impl CylindricalProfile {
    pub fn new(
        radius: Array1<f64>,
        volume: Array1<f64>,
        mass: Array1<f64>,
        j: Array1<f64>,
    ) -> ProfileResult<Self> {
        let named = [
            ("volume", volume.len()),
            ("mass", mass.len()),
            ("j", j.len()),
        ];
        check_aligned("cylindrical profile", radius.len(), &named)?;
        Ok(CylindricalProfile {
            radius,
            volume,
            mass,
            j,
        })
    }

    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    pub fn radius(&self) -> ArrayView1<'_, f64> {
        self.radius.view()
    }

    pub fn volume(&self) -> ArrayView1<'_, f64> {
        self.volume.view()
    }

    pub fn mass(&self) -> ArrayView1<'_, f64> {
        self.mass.view()
    }

    pub fn angular_momentum(&self) -> ArrayView1<'_, f64> {
        self.j.view()
    }

    pub fn retain(&mut self, keep: &[bool]) -> ProfileResult<()> {
        if keep.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                stage: "cylindrical profile",
                column: "mask".to_string(),
                expected: self.len(),
                found: keep.len(),
            });
        }
        let idx = kept_indices(keep);
        self.radius = self.radius.select(Axis(0), &idx);
        self.volume = self.volume.select(Axis(0), &idx);
        self.mass = self.mass.select(Axis(0), &idx);
        self.j = self.j.select(Axis(0), &idx);
        Ok(())
    }
}

fn kept_indices(keep: &[bool]) -> Vec<usize> {
    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

fn check_aligned(stage: &'static str, n: usize, named: &[(&str, usize)]) -> ProfileResult<()> {
    for &(column, found) in named {
        if found != n {
            return Err(ProfileError::LengthMismatch {
                stage,
                column: column.to_string(),
                expected: n,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_cells() -> CellColumns {
        CellColumns {
            x: array![1.0, 0.0],
            y: array![0.0, 2.0],
            z: array![0.0, 0.0],
            volume: array![1.0, 2.0],
            density: array![2.0, 4.0],
            sx: array![0.0, -4.0],
            sy: array![2.0, 0.0],
            sz: array![0.0, 0.0],
            tau: array![1.0, 1.0],
            tracers: array![[1.0, 0.0], [0.0, 1.0]],
            tracer_names: vec!["primary".into(), "secondary".into()],
        }
    }

    #[test]
    fn test_derived_quantities() {
        let ds = CellDataset::new(two_cells()).unwrap();
        assert_eq!(ds.len(), 2);
        assert!((ds.radius()[1] - 2.0).abs() < 1e-15);
        assert!((ds.cylindrical_radius()[0] - 1.0).abs() < 1e-15);
        assert!((ds.mass()[1] - 8.0).abs() < 1e-15);
        // j = |x sy - y sx| / rho = |1*2 - 0| / 2 = 1
        assert!((ds.angular_momentum()[0] - 1.0).abs() < 1e-15);
        // j = |0 - 2*(-4)| / 4 = 2
        assert!((ds.angular_momentum()[1] - 2.0).abs() < 1e-15);
        // ek = 0.5 * 4 / 4 = 0.5
        assert!((ds.kinetic_energy()[0] - 0.5).abs() < 1e-15);
        assert!((ds.total_mass() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_nonpositive_volume() {
        let mut cols = two_cells();
        cols.volume[1] = 0.0;
        let err = CellDataset::new(cols).expect_err("zero volume must fail");
        match err {
            ProfileError::MalformedInput { index, message, .. } => {
                assert_eq!(index, 1);
                assert!(message.contains("volume"));
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_nonpositive_density() {
        let mut cols = two_cells();
        cols.density[0] = -1.0;
        assert!(matches!(
            CellDataset::new(cols),
            Err(ProfileError::MalformedInput { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut cols = two_cells();
        cols.tau = array![1.0];
        match CellDataset::new(cols).unwrap_err() {
            ProfileError::LengthMismatch {
                column,
                expected,
                found,
                ..
            } => {
                assert_eq!(column, "tau");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_centering_on_density_max() {
        let cols = CellColumns {
            x: array![10.0, 12.0],
            y: array![5.0, 5.0],
            z: array![1.0, 1.0],
            volume: array![8.0, 8.0],
            density: array![1.0, 3.0],
            sx: array![1.0, 3.0],
            sy: array![0.0, 0.0],
            sz: array![0.0, 0.0],
            tau: array![1.0, 1.0],
            tracers: array![[1.0], [1.0]],
            tracer_names: vec!["secondary".into()],
        };
        let ds = CellDataset::centered_on_density_max(cols, FrameShift::CentralCell).unwrap();
        let (x, _, _) = ds.position();
        assert!((x[1]).abs() < 1e-15);
        assert!((x[0] + 2.0).abs() < 1e-15);
        // Central cell radius replaced by its equivalent-sphere radius
        let expected = (3.0 * 8.0 / (4.0 * std::f64::consts::PI)).cbrt();
        assert!((ds.radius()[1] - expected).abs() < 1e-12);
        assert!((ds.cylindrical_radius()[1] - expected).abs() < 1e-12);
        // Both cells move with v = 1, so the shifted momenta vanish
        assert!(ds.kinetic_energy().iter().all(|&e| e.abs() < 1e-15));
    }

    #[test]
    fn test_centering_replaces_every_on_axis_cylindrical_radius() {
        let cols = CellColumns {
            x: array![0.0, 0.0, 3.0],
            y: array![0.0, 0.0, 0.0],
            z: array![0.0, 4.0, 0.0],
            volume: array![1.0, 1.0, 1.0],
            density: array![5.0, 1.0, 1.0],
            sx: array![0.0, 0.0, 0.0],
            sy: array![0.0, 0.0, 0.0],
            sz: array![0.0, 0.0, 0.0],
            tau: array![1.0, 1.0, 1.0],
            tracers: array![[1.0], [1.0], [1.0]],
            tracer_names: vec!["secondary".into()],
        };
        let ds = CellDataset::centered_on_density_max(cols, FrameShift::Inertial).unwrap();
        let r_center = (3.0 / (4.0 * std::f64::consts::PI)).cbrt();
        // Cell 1 sits on the z axis above the centre
        assert!((ds.radius()[1] - 4.0).abs() < 1e-15);
        assert!((ds.cylindrical_radius()[1] - r_center).abs() < 1e-15);
        assert!((ds.cylindrical_radius()[2] - 3.0).abs() < 1e-15);
        assert!(ds.cylindrical_radius().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_profile_rejects_misaligned_columns() {
        let err = CylindricalProfile::new(
            array![1.0, 2.0],
            array![1.0, 1.0],
            array![1.0],
            array![0.0, 0.0],
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::LengthMismatch { .. }));
    }

    #[test]
    fn test_profile_retain_keeps_alignment() {
        let mut p = CylindricalProfile::new(
            array![1.0, 2.0, 3.0],
            array![1.0, 0.0, 1.0],
            array![2.0, 0.0, 2.0],
            array![5.0, 0.0, 7.0],
        )
        .unwrap();
        p.retain(&[true, false, true]).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.radius().to_vec(), vec![1.0, 3.0]);
        assert_eq!(p.angular_momentum().to_vec(), vec![5.0, 7.0]);
        assert_eq!(p.mass().len(), p.volume().len());
    }

    #[test]
    fn test_internal_energy_from_tau() {
        let p = SphericalProfile::new(SphericalColumns {
            radius: array![1.0],
            volume: array![1.0],
            mass: array![2.0],
            density: array![2.0],
            tau: array![8.0],
            ek: array![0.0],
            j: array![0.0],
            tracers: Array2::zeros((1, 0)),
            tracer_names: vec![],
        })
        .unwrap();
        // 8^(5/3) = 32, / rho = 16
        assert!((p.internal_energy()[0] - 16.0).abs() < 1e-10);
    }
}
