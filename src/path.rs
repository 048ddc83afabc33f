//! Banks of sampled paths.
//!
//! A [`PathBank`] is the rank-3 array `(N, l, d)`: `N` paths, each with `l`
//! observations in `d` dimensions. Each path is stored contiguously, observation
//! by observation, so `path(i)` is a zero-copy `l * d` slice.

/// Fixed-size collection of equally long, equally dimensioned paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBank {
    data: Vec<f64>,
    n_paths: usize,
    length: usize,
    dim: usize,
}

impl PathBank {
    /// Create from flat data laid out as `data[(i * length + t) * dim + c]`.
    ///
    /// Returns `None` if `data.len() != n_paths * length * dim`.
    pub fn new(data: Vec<f64>, n_paths: usize, length: usize, dim: usize) -> Option<Self> {
        if data.len() != n_paths * length * dim {
            return None;
        }
        Some(Self {
            data,
            n_paths,
            length,
            dim,
        })
    }

    /// Build from one `Vec` of observations per path.
    ///
    /// Each inner observation is a `dim`-vector. Returns `None` for ragged input
    /// or an empty bank.
    pub fn from_paths(paths: &[Vec<Vec<f64>>]) -> Option<Self> {
        let first = paths.first()?;
        let length = first.len();
        let dim = first.first().map_or(0, |obs| obs.len());

        let mut data = Vec::with_capacity(paths.len() * length * dim);
        for path in paths {
            if path.len() != length {
                return None;
            }
            for obs in path {
                if obs.len() != dim {
                    return None;
                }
                data.extend_from_slice(obs);
            }
        }
        Self::new(data, paths.len(), length, dim)
    }

    /// Number of paths `N`.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// State dimension `d`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Shape as `(N, l, d)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_paths, self.length, self.dim)
    }

    /// Whether the bank holds no paths.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_paths == 0
    }

    /// Flat observations of path `i` (`length * dim` values).
    ///
    /// # Panics
    /// Panics if `i >= n_paths`.
    #[inline]
    pub fn path(&self, i: usize) -> &[f64] {
        let stride = self.length * self.dim;
        &self.data[i * stride..(i + 1) * stride]
    }

    /// Iterate over paths as flat slices.
    pub fn paths(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_paths).map(move |i| self.path(i))
    }

    /// Gather the paths at `indices` into a new bank.
    ///
    /// Indices may repeat (sampling with replacement). Returns `None` if any
    /// index is out of range.
    pub fn select(&self, indices: &[usize]) -> Option<Self> {
        let stride = self.length * self.dim;
        let mut data = Vec::with_capacity(indices.len() * stride);
        for &i in indices {
            if i >= self.n_paths {
                return None;
            }
            data.extend_from_slice(self.path(i));
        }
        Some(Self {
            data,
            n_paths: indices.len(),
            length: self.length,
            dim: self.dim,
        })
    }
}

impl std::fmt::Display for PathBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PathBank({}x{}x{})",
            self.n_paths, self.length, self.dim
        )
    }
}
