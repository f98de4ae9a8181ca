// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Output Tables
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Whitespace-delimited profile tables for stellar-evolution relaxation.
//!
//! Layout: one header line of counts (`rows` or `rows n_isotopes`), then one
//! row per bin from the surface inward, every value in `%.18e` notation.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};

/// Default artifact file names.
pub const DENSITY_TEMPERATURE_FILE: &str = "eosDT.dat";
pub const ANGULAR_MOMENTUM_FILE: &str = "am.dat";
pub const ABUNDANCE_FILE: &str = "abund.dat";
pub const ENTROPY_FILE: &str = "combined_entropy.dat";

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    header: Vec<usize>,
    /// Rows in file order.
    rows: Array2<f64>,
}

impl Table {
    pub fn new(header: Vec<usize>, rows: Array2<f64>) -> ProfileResult<Self> {
        if header.first().copied() != Some(rows.nrows()) {
            return Err(ProfileError::malformed(
                "output table",
                0,
                format!(
                    "header {header:?} does not start with the row count {}",
                    rows.nrows()
                ),
            ));
        }
        Ok(Table { header, rows })
    }

    /// Stack innermost-first columns into rows ordered outermost first.
    pub fn outer_to_inner(
        extra_header: &[usize],
        columns: &[ArrayView1<'_, f64>],
    ) -> ProfileResult<Self> {
        let n = columns.first().map_or(0, |c| c.len());
        let mut rows = Array2::zeros((n, columns.len()));
        for (k, col) in columns.iter().enumerate() {
            if col.len() != n {
                return Err(ProfileError::LengthMismatch {
                    stage: "output table",
                    column: format!("#{k}"),
                    expected: n,
                    found: col.len(),
                });
            }
            rows.column_mut(k).assign(&col.slice(s![..;-1]));
        }
        let mut header = vec![n];
        header.extend_from_slice(extra_header);
        Table::new(header, rows)
    }

    pub fn header(&self) -> &[usize] {
        &self.header
    }

    pub fn rows(&self) -> ArrayView2<'_, f64> {
        self.rows.view()
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    /// Column `k` in file order.
    pub fn column(&self, k: usize) -> ArrayView1<'_, f64> {
        self.rows.column(k)
    }

    pub fn write<W: Write>(&self, mut w: W) -> ProfileResult<()> {
        let header: Vec<String> = self.header.iter().map(|h| h.to_string()).collect();
        writeln!(w, "{}", header.join(" "))?;
        for row in self.rows.axis_iter(Axis(0)) {
            let line: Vec<String> = row.iter().map(|&v| format_e18(v)).collect();
            writeln!(w, "{}", line.join(" "))?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> ProfileResult<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    pub fn read<R: BufRead>(reader: R) -> ProfileResult<Self> {
        const STAGE: &str = "table reader";
        let mut lines = reader.lines().enumerate();
        let header = loop {
            match lines.next() {
                Some((i, line)) => {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let parsed: Result<Vec<usize>, _> =
                        line.split_whitespace().map(str::parse::<usize>).collect();
                    break parsed.map_err(|e| {
                        ProfileError::malformed(STAGE, i + 1, format!("bad header `{line}`: {e}"))
                    })?;
                }
                None => return Err(ProfileError::malformed(STAGE, 0, "empty table")),
            }
        };

        let mut values = Vec::new();
        let mut width: Option<usize> = None;
        for (i, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row: Result<Vec<f64>, _> = line.split_whitespace().map(str::parse::<f64>).collect();
            let row = row.map_err(|e| ProfileError::malformed(STAGE, i + 1, e.to_string()))?;
            match width {
                None => width = Some(row.len()),
                Some(w) if w != row.len() => {
                    return Err(ProfileError::malformed(
                        STAGE,
                        i + 1,
                        format!("row has {} values, expected {w}", row.len()),
                    ))
                }
                Some(_) => {}
            }
            values.extend(row);
        }
        let width = width.unwrap_or(0);
        let n_rows = if width == 0 { 0 } else { values.len() / width };
        let rows = Array2::from_shape_vec((n_rows, width), values)
            .map_err(|e| ProfileError::malformed(STAGE, 0, e.to_string()))?;
        Table::new(header, rows)
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> ProfileResult<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }
}

/// `(q, rho, T)`
pub fn density_temperature_table<'a>(
    q: ArrayView1<'a, f64>,
    density: ArrayView1<'a, f64>,
    temperature: ArrayView1<'a, f64>,
) -> ProfileResult<Table> {
    Table::outer_to_inner(&[], &[q, density, temperature])
}

/// `(q_cyl, j)`
pub fn angular_momentum_table<'a>(
    q: ArrayView1<'a, f64>,
    j: ArrayView1<'a, f64>,
) -> ProfileResult<Table> {
    Table::outer_to_inner(&[], &[q, j])
}

/// `(q, X_1 .. X_n)` with header `rows n`.
pub fn abundance_table(
    q: ArrayView1<'_, f64>,
    abundance: ArrayView2<'_, f64>,
) -> ProfileResult<Table> {
    let n = q.len();
    if abundance.nrows() != n {
        return Err(ProfileError::LengthMismatch {
            stage: "output table",
            column: "abundance".to_string(),
            expected: n,
            found: abundance.nrows(),
        });
    }
    let mut rows = Array2::zeros((n, abundance.ncols() + 1));
    rows.column_mut(0).assign(&q);
    rows.slice_mut(s![.., 1..]).assign(&abundance);
    rows.invert_axis(Axis(0));
    Table::new(vec![n, abundance.ncols()], rows)
}

/// `(q, s)`
pub fn entropy_table<'a>(
    q: ArrayView1<'a, f64>,
    entropy: ArrayView1<'a, f64>,
) -> ProfileResult<Table> {
    Table::outer_to_inner(&[], &[q, entropy])
}

/// NumPy `%.18e`: 18 mantissa digits, signed exponent of at least two digits.
pub fn format_e18(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{v:.18e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_format_matches_numpy() {
        assert_eq!(format_e18(1.0), "1.000000000000000000e+00");
        assert_eq!(format_e18(0.0), "0.000000000000000000e+00");
        assert_eq!(format_e18(0.1), "1.000000000000000056e-01");
        assert_eq!(format_e18(-2.5e-7), "-2.499999999999999887e-07");
        assert_eq!(format_e18(3.0e120), "3.000000000000000227e+120");
        assert_eq!(format_e18(f64::NAN), "nan");
    }

    #[test]
    fn test_rows_written_outer_to_inner() {
        let q = array![0.75, 0.25, 0.0];
        let rho = array![10.0, 5.0, 1.0];
        let t = array![1e7, 5e6, 1e6];
        let table = density_temperature_table(q.view(), rho.view(), t.view()).unwrap();
        let mut buf = Vec::new();
        table.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("3"));
        assert_eq!(
            lines.next(),
            Some("0.000000000000000000e+00 1.000000000000000000e+00 1.000000000000000000e+06")
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_abundance_header_and_roundtrip() {
        let q = array![0.5, 0.0];
        let ab = array![[0.2, 0.8], [0.6, 0.4]];
        let table = abundance_table(q.view(), ab.view()).unwrap();
        assert_eq!(table.header(), &[2, 2]);
        let mut buf = Vec::new();
        table.write(&mut buf).unwrap();
        let back = Table::read(buf.as_slice()).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.column(1).to_vec(), vec![0.6, 0.2]);
    }

    #[test]
    fn test_read_rejects_count_mismatch() {
        let text = "3\n1.0 2.0\n3.0 4.0\n";
        assert!(matches!(
            Table::read(text.as_bytes()),
            Err(ProfileError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_read_rejects_ragged_rows() {
        let text = "2\n1.0 2.0\n3.0\n";
        match Table::read(text.as_bytes()).unwrap_err() {
            ProfileError::MalformedInput { index, .. } => assert_eq!(index, 3),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_misaligned_columns_rejected() {
        let q = array![0.5, 0.0];
        let j = array![1.0];
        assert!(angular_momentum_table(q.view(), j.view()).is_err());
    }

    #[test]
    fn test_abundance_rows_reversed_with_q_first() {
        let q = array![0.9, 0.4, 0.0];
        let ab = array![[0.1, 0.9], [0.5, 0.5], [1.0, 0.0]];
        let table = abundance_table(q.view(), ab.view()).unwrap();
        assert_eq!(table.header(), &[3, 2]);
        assert_eq!(table.rows().row(0).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(table.rows().row(2).to_vec(), vec![0.9, 0.1, 0.9]);
    }

    #[test]
    fn test_abundance_row_count_mismatch_rejected() {
        let q = array![0.5, 0.0];
        let ab = array![[1.0, 0.0]];
        match abundance_table(q.view(), ab.view()).unwrap_err() {
            ProfileError::LengthMismatch { column, found, .. } => {
                assert_eq!(column, "abundance");
                assert_eq!(found, 1);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_builders_accept_views_of_separate_owners() {
        let q = array![0.5, 0.0];
        let entropy = array![7.0, 8.0];
        let table = entropy_table(q.view(), entropy.view()).unwrap();
        assert_eq!(table.column(1).to_vec(), vec![8.0, 7.0]);
    }
}
