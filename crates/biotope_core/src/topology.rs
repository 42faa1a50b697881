//! Spatial cells, their neighbours, and the diffusion operator between them.

use crate::error::{check_index, EngineError, Result};
use crate::matrix::{check_shape, Matrix};
use std::collections::HashMap;

/// Graph of cells where every cell has the same number of neighbours.
///
/// Immutable after construction. Each undirected link appears once in
/// `edges`, so the diffusion operator touches both endpoints of a link with
/// opposite signs.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    adjacency: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
    neighbors_per_cell: usize,
    unit_length: f64,
}

impl Topology {
    /// Builds a topology from a per-cell neighbour table.
    ///
    /// Every row must have the same length and the table must be symmetric:
    /// if `b` appears `k` times among `a`'s neighbours, `a` appears `k` times
    /// among `b`'s.
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>, unit_length: f64) -> Result<Self> {
        if adjacency.is_empty() {
            return Err(EngineError::topology("no cells"));
        }
        if !(unit_length > 0.0) {
            return Err(EngineError::topology(format!(
                "unit length must be positive, got {unit_length}"
            )));
        }
        let neighbors_per_cell = adjacency[0].len();
        if neighbors_per_cell == 0 {
            return Err(EngineError::topology("cells have no neighbours"));
        }

        let cells = adjacency.len();
        let mut links: HashMap<(usize, usize), usize> = HashMap::new();
        for (cell, neighbors) in adjacency.iter().enumerate() {
            if neighbors.len() != neighbors_per_cell {
                return Err(EngineError::topology(format!(
                    "cell {cell} has {} neighbours, expected {neighbors_per_cell}",
                    neighbors.len()
                )));
            }
            for &n in neighbors {
                check_index("neighbour cell", n, cells)?;
                if n == cell {
                    return Err(EngineError::topology(format!("cell {cell} links to itself")));
                }
                *links.entry((cell, n)).or_default() += 1;
            }
        }
        for (&(a, b), &count) in &links {
            if links.get(&(b, a)).copied().unwrap_or(0) != count {
                return Err(EngineError::topology(format!(
                    "link {a} -> {b} is not mirrored"
                )));
            }
        }

        let edges = adjacency
            .iter()
            .enumerate()
            .flat_map(|(cell, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |&&n| cell < n)
                    .map(move |&n| (cell, n))
            })
            .collect();

        Ok(Self {
            adjacency,
            edges,
            neighbors_per_cell,
            unit_length,
        })
    }

    /// The three-neighbour reference lattice: a brick-wall honeycomb wrapped
    /// on a torus.
    ///
    /// Cell `(x, y)` has index `y * width + x` and links to its left and
    /// right cells, plus the cell above when `x + y` is even or below when it
    /// is odd. Direction order is `[left, right, vertical]`.
    pub fn honeycomb(width: usize, height: usize, unit_length: f64) -> Result<Self> {
        if width < 3 {
            return Err(EngineError::topology(format!(
                "honeycomb width must be at least 3, got {width}"
            )));
        }
        if height < 2 || height % 2 != 0 {
            return Err(EngineError::topology(format!(
                "honeycomb height must be even and at least 2, got {height}"
            )));
        }
        let index = |x: usize, y: usize| y * width + x;
        let mut adjacency = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let left = index((x + width - 1) % width, y);
                let right = index((x + 1) % width, y);
                let vertical = if (x + y) % 2 == 0 {
                    index(x, (y + 1) % height)
                } else {
                    index(x, (y + height - 1) % height)
                };
                adjacency.push(vec![left, right, vertical]);
            }
        }
        Self::from_adjacency(adjacency, unit_length)
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub fn neighbors_per_cell(&self) -> usize {
        self.neighbors_per_cell
    }

    #[must_use]
    pub fn unit_length(&self) -> f64 {
        self.unit_length
    }

    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// The cell reached from `cell` by moving in `direction`.
    pub fn adjacent(&self, cell: usize, direction: usize) -> Result<usize> {
        check_index("cell", cell, self.cell_count())?;
        check_index("direction", direction, self.neighbors_per_cell)?;
        Ok(self.adjacency[cell][direction])
    }

    /// Diffusion flux for every resource row of `field` (rows = resources,
    /// columns = cells).
    ///
    /// For each link the exchanged amount is the field difference times the
    /// smaller of the two endpoints' coefficients, so the slower side
    /// throttles the exchange. The accumulator is divided by
    /// `neighbors_per_cell * unit_length`. The caller integrates with
    /// `field += flux * dt`; the columns of the result always sum to zero.
    pub fn flux(&self, field: &Matrix, alpha: &Matrix) -> Result<Matrix> {
        check_shape("flux field", field, field.nrows(), self.cell_count())?;
        check_shape("flux alpha", alpha, field.nrows(), self.cell_count())?;

        let mut acc = Matrix::zeros(field.dim());
        for row in 0..field.nrows() {
            let f = field.row(row);
            let a = alpha.row(row);
            let mut out = acc.row_mut(row);
            for &(from, to) in &self.edges {
                let d = (f[to] - f[from]) * a[from].min(a[to]);
                out[from] += d;
                out[to] -= d;
            }
        }
        acc /= self.neighbors_per_cell as f64 * self.unit_length;
        Ok(acc)
    }

    /// Longest `dt` for which `field += flux * dt` moves at most half of
    /// any cell's surplus toward its neighbours. Within it the explicit step
    /// never drives a cell negative. Infinite when nothing diffuses.
    pub fn stable_time_step(&self, alpha: &Matrix) -> Result<f64> {
        check_shape("flux alpha", alpha, alpha.nrows(), self.cell_count())?;
        let scale = self.neighbors_per_cell as f64 * self.unit_length;
        let mut fastest = 0.0_f64;
        for a in alpha.rows() {
            let mut rate = vec![0.0; self.cell_count()];
            for &(from, to) in &self.edges {
                let k = a[from].min(a[to]) / scale;
                rate[from] += k;
                rate[to] += k;
            }
            fastest = rate.into_iter().fold(fastest, f64::max);
        }
        Ok(if fastest > 0.0 {
            0.5 / fastest
        } else {
            f64::INFINITY
        })
    }
}
