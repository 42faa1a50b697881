//! Dense matrix helpers on top of `ndarray`.
//!
//! Rows index resources (or gene signals), columns index individuals or
//! cells. ndarray already covers elementwise arithmetic and broadcasting;
//! this module adds the gather/scatter and sampling operations the
//! population lifecycle needs, each with an explicit shape check.

use crate::error::{check_index, EngineError, Result};
use ndarray::{Array1, Array2, Axis};

pub type Matrix = Array2<f64>;
pub type Vector = Array1<f64>;

/// Fails unless `m` is exactly `rows x cols`.
pub fn check_shape(context: &'static str, m: &Matrix, rows: usize, cols: usize) -> Result<()> {
    if m.dim() == (rows, cols) {
        Ok(())
    } else {
        Err(EngineError::shape(context, (rows, cols), m.dim()))
    }
}

/// Fails unless `v` has `len` entries.
pub fn check_len(context: &'static str, v: &Vector, len: usize) -> Result<()> {
    if v.len() == len {
        Ok(())
    } else {
        Err(EngineError::shape(context, (len, 1), (v.len(), 1)))
    }
}

/// Copies the listed columns, in order, into a new matrix.
pub fn gather_columns(m: &Matrix, columns: &[usize]) -> Result<Matrix> {
    for &c in columns {
        check_index("matrix column", c, m.ncols())?;
    }
    Ok(m.select(Axis(1), columns))
}

/// Returns `[a | b]`.
pub fn append_columns(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.nrows() != b.nrows() {
        return Err(EngineError::shape(
            "append_columns",
            (a.nrows(), b.ncols()),
            b.dim(),
        ));
    }
    ndarray::concatenate(Axis(1), &[a.view(), b.view()])
        .map_err(|_| EngineError::shape("append_columns", a.dim(), b.dim()))
}

/// Adds every column of `source` onto the column of `target` named by
/// `locations`. Several source columns may land on the same target column.
pub fn scatter_add_columns(target: &mut Matrix, source: &Matrix, locations: &[usize]) -> Result<()> {
    if source.ncols() != locations.len() || source.nrows() != target.nrows() {
        return Err(EngineError::shape(
            "scatter_add_columns",
            (target.nrows(), locations.len()),
            source.dim(),
        ));
    }
    for (col, &cell) in source.axis_iter(Axis(1)).zip(locations) {
        check_index("scatter target column", cell, target.ncols())?;
        let mut dst = target.column_mut(cell);
        dst += &col;
    }
    Ok(())
}

/// Sums `values` per location into a vector of `len` bins.
pub fn scatter_sum(values: &Vector, locations: &[usize], len: usize) -> Result<Vector> {
    if values.len() != locations.len() {
        return Err(EngineError::shape(
            "scatter_sum",
            (locations.len(), 1),
            (values.len(), 1),
        ));
    }
    let mut bins = Vector::zeros(len);
    for (&v, &cell) in values.iter().zip(locations) {
        check_index("scatter bin", cell, len)?;
        bins[cell] += v;
    }
    Ok(bins)
}

/// `weights · m`: one weighted sum per column.
pub fn weighted_column_sums(m: &Matrix, weights: &Vector) -> Result<Vector> {
    check_len("weighted_column_sums", weights, m.nrows())?;
    Ok(weights.dot(m))
}

/// Minimum of each column; `+inf` for a matrix with no rows.
#[must_use]
pub fn column_min(m: &Matrix) -> Vector {
    m.fold_axis(Axis(0), f64::INFINITY, |acc, &x| acc.min(x))
}

/// Maximum of each column; `-inf` for a matrix with no rows.
#[must_use]
pub fn column_max(m: &Matrix) -> Vector {
    m.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &x| acc.max(x))
}

/// Running sum down each column, so row `i` holds the sum of rows `0..=i`.
#[must_use]
pub fn cumsum_rows(m: &Matrix) -> Matrix {
    let mut out = m.clone();
    out.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
    out
}

/// Picks one row per column from a cumulative table.
///
/// `draws[j]` is a uniform number in `[0, 1)`; it is scaled by the column's
/// last (total) entry and the first row whose cumulative value exceeds it is
/// returned. Columns whose total is zero select the last row.
pub fn sample_categorical(cdf: &Matrix, draws: &[f64]) -> Result<Vec<usize>> {
    if cdf.ncols() != draws.len() {
        return Err(EngineError::shape(
            "sample_categorical",
            (cdf.nrows(), draws.len()),
            cdf.dim(),
        ));
    }
    if cdf.nrows() == 0 {
        return Err(EngineError::EmptySelection("sample_categorical"));
    }
    let last = cdf.nrows() - 1;
    Ok(cdf
        .axis_iter(Axis(1))
        .zip(draws)
        .map(|(col, &u)| {
            let target = u * col[last];
            col.iter().position(|&c| target < c).unwrap_or(last)
        })
        .collect())
}
