//! Truncated path signatures and level-k extraction.
//!
//! A signature bank is a [`SigMatrix`] with one row per path. Columns hold the
//! flat signature, levels 1 through `depth` concatenated; the level-0 term is
//! always 1 and is left out. Level `m` holds `d^m` coefficients, with words in
//! lexicographic order: word `(i_1, ..., i_m)` sits at
//! `Σ_j i_j d^(m-j)` inside its level.
//!
//! At depth 0 the bank degenerates to an `N x 1` column of ones.
//!
//! The raw signature routine sits behind [`SignatureBackend`]. The crate ships
//! [`ChenSignature`], which treats every path as piecewise linear.

use crate::error::{Result, SigMmdError};
use crate::iter_maybe_parallel;
use crate::matrix::SigMatrix;
use crate::path::PathBank;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use std::ops::Range;

/// Raw signature primitive.
///
/// Implementations map a path bank of shape `(N, l, d)` to an
/// `N x signature_len(d, depth)` bank, for `depth >= 1`.
pub trait SignatureBackend: Send + Sync {
    /// Compute signatures truncated at `depth`.
    fn compute(&self, paths: &PathBank, depth: usize) -> Result<SigMatrix>;
}

/// Piecewise-linear signatures via Chen's identity.
///
/// Each linear segment contributes the tensor exponential of its increment
/// (level `m` is `Δ^{⊗m} / m!`); segments are multiplied in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChenSignature;

impl SignatureBackend for ChenSignature {
    fn compute(&self, paths: &PathBank, depth: usize) -> Result<SigMatrix> {
        let (n, length, dim) = paths.shape();
        let layout = LevelLayout::new(dim, depth)?;

        let rows: Vec<Vec<f64>> = iter_maybe_parallel!(0..n)
            .map(|i| path_signature(paths.path(i), length, &layout))
            .collect();

        let total = layout.total;
        let mut data = vec![0.0; n * total];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                data[i + j * n] = v;
            }
        }
        SigMatrix::from_column_major(data, n, total)
            .ok_or_else(|| SigMmdError::SignatureComputation("bank shape".into()))
    }
}

/// Level sizes and flat offsets for one `(dim, depth)` pair.
#[derive(Debug, Clone)]
struct LevelLayout {
    dim: usize,
    depth: usize,
    /// `sizes[m] = dim^m`
    sizes: Vec<usize>,
    /// `offsets[m]` = flat start of level `m` (`offsets[0]` unused)
    offsets: Vec<usize>,
    total: usize,
}

impl LevelLayout {
    fn new(dim: usize, depth: usize) -> Result<Self> {
        let mut sizes: Vec<usize> = Vec::with_capacity(depth + 1);
        let mut offsets: Vec<usize> = Vec::with_capacity(depth + 1);
        sizes.push(1);
        offsets.push(0);
        let mut total = 0usize;
        for m in 1..=depth {
            let size = sizes[m - 1].checked_mul(dim).ok_or_else(|| overflow(dim, depth))?;
            offsets.push(total);
            sizes.push(size);
            total = total.checked_add(size).ok_or_else(|| overflow(dim, depth))?;
        }
        Ok(Self {
            dim,
            depth,
            sizes,
            offsets,
            total,
        })
    }
}

fn overflow(dim: usize, depth: usize) -> SigMmdError {
    SigMmdError::SignatureComputation(format!(
        "signature of dimension {} at depth {} does not fit in memory",
        dim, depth
    ))
}

/// Signature of one flat path (`length * dim` values).
fn path_signature(path: &[f64], length: usize, layout: &LevelLayout) -> Vec<f64> {
    let dim = layout.dim;
    let mut sig = vec![0.0; layout.total];
    if layout.depth == 0 || length < 2 {
        return sig;
    }

    let mut segment = vec![0.0; layout.total];
    let mut delta = vec![0.0; dim];
    for t in 1..length {
        for c in 0..dim {
            delta[c] = path[t * dim + c] - path[(t - 1) * dim + c];
        }
        segment_exponential(&delta, layout, &mut segment);
        chen_multiply(&mut sig, &segment, layout);
    }
    sig
}

/// Tensor exponential of a single increment, levels 1..=depth.
fn segment_exponential(delta: &[f64], layout: &LevelLayout, out: &mut [f64]) {
    let dim = layout.dim;
    out[..dim].copy_from_slice(delta);
    for m in 2..=layout.depth {
        let prev = layout.offsets[m - 1];
        let cur = layout.offsets[m];
        let scale = 1.0 / m as f64;
        for a in 0..layout.sizes[m - 1] {
            let base = out[prev + a] * scale;
            for (b, &db) in delta.iter().enumerate() {
                out[cur + a * dim + b] = base * db;
            }
        }
    }
}

/// `sig <- sig ⊗ segment` in the truncated tensor algebra.
///
/// Levels are updated from the top down so every level read is still the old value.
fn chen_multiply(sig: &mut [f64], segment: &[f64], layout: &LevelLayout) {
    for m in (1..=layout.depth).rev() {
        let out = layout.offsets[m];
        for i in 1..m {
            let j = m - i;
            let left = layout.offsets[i];
            let right = layout.offsets[j];
            let right_size = layout.sizes[j];
            for a in 0..layout.sizes[i] {
                let s = sig[left + a];
                if s == 0.0 {
                    continue;
                }
                let row = out + a * right_size;
                for b in 0..right_size {
                    sig[row + b] += s * segment[right + b];
                }
            }
        }
        for w in 0..layout.sizes[m] {
            sig[out + w] += segment[out + w];
        }
    }
}

/// Flat signature length `Σ_{i=1}^{depth} dim^i`.
pub fn signature_len(dim: usize, depth: usize) -> Result<usize> {
    Ok(LevelLayout::new(dim, depth)?.total)
}

/// Column range of level `level` inside a flat signature truncated at `depth`.
///
/// The range starts at `Σ_{i=0}^{level-1} dim^i - 1` and spans `dim^level`
/// coefficients. Every level lookup in the crate goes through here.
///
/// Requires `dim > 0` and `1 <= level <= depth`.
pub fn level_range(dim: usize, level: usize, depth: usize) -> Result<Range<usize>> {
    if dim == 0 {
        return Err(SigMmdError::config("path dimension must be > 0"));
    }
    if level == 0 || level > depth {
        return Err(SigMmdError::config(format!(
            "level {} is not stored in a depth-{} signature",
            level, depth
        )));
    }
    let layout = LevelLayout::new(dim, level)?;
    let start = layout.offsets[level];
    Ok(start..start + layout.sizes[level])
}

/// Depth whose flat signature length is `len`, if any.
fn depth_for_len(dim: usize, len: usize) -> Option<usize> {
    if dim == 0 {
        return (len == 0).then_some(0);
    }
    let mut total = 0usize;
    let mut size = 1usize;
    let mut depth = 0;
    while total < len {
        size = size.checked_mul(dim)?;
        total = total.checked_add(size)?;
        depth += 1;
    }
    (total == len).then_some(depth)
}

/// Signatures of every path truncated at `depth`, using [`ChenSignature`].
pub fn signatures(paths: &PathBank, depth: usize) -> Result<SigMatrix> {
    signatures_with(&ChenSignature, paths, depth)
}

/// Signatures of every path truncated at `depth`, using `backend`.
///
/// Depth 0 returns [`SigMatrix::level_zero`], an `N x 1` column of ones,
/// without calling the backend.
pub fn signatures_with<B: SignatureBackend + ?Sized>(
    backend: &B,
    paths: &PathBank,
    depth: usize,
) -> Result<SigMatrix> {
    if paths.dim() == 0 {
        return Err(SigMmdError::config("path dimension must be > 0"));
    }
    if depth == 0 {
        return Ok(SigMatrix::level_zero(paths.n_paths()));
    }

    let expected = (paths.n_paths(), signature_len(paths.dim(), depth)?);
    let sigs = backend.compute(paths, depth)?;
    if sigs.shape() != expected {
        return Err(SigMmdError::SignatureComputation(format!(
            "backend returned {}x{}, expected {}x{}",
            sigs.nrows(),
            sigs.ncols(),
            expected.0,
            expected.1
        )));
    }
    Ok(sigs)
}

/// Level-`k` block of signatures computed directly at depth `k`.
pub fn level_k_signatures_from_paths(paths: &PathBank, k: usize) -> Result<SigMatrix> {
    level_k_signatures_from_paths_with(&ChenSignature, paths, k)
}

/// [`level_k_signatures_from_paths`] with an explicit backend.
pub fn level_k_signatures_from_paths_with<B: SignatureBackend + ?Sized>(
    backend: &B,
    paths: &PathBank,
    k: usize,
) -> Result<SigMatrix> {
    let sigs = signatures_with(backend, paths, k)?;
    if k == 0 {
        return Ok(sigs);
    }
    level_k_signatures_from_signatures(&sigs, k, paths.dim())
}

/// Level-`k` block of an existing signature bank of any depth `>= k`.
///
/// The bank's depth is recovered from its width and `dim`, which lets one bank
/// serve every level up to its depth. Level 0 is a column of ones. A depth-0
/// bank holds no higher level, so asking it for `k >= 1` is an error.
pub fn level_k_signatures_from_signatures(
    signatures: &SigMatrix,
    k: usize,
    dim: usize,
) -> Result<SigMatrix> {
    if dim == 0 {
        return Err(SigMmdError::config("path dimension must be > 0"));
    }
    if k == 0 {
        return Ok(SigMatrix::level_zero(signatures.nrows()));
    }
    if signatures.is_level_zero() {
        return Err(SigMmdError::config(format!(
            "level {} requested from a depth-0 signature bank",
            k
        )));
    }
    let depth = depth_for_len(dim, signatures.ncols()).ok_or_else(|| {
        SigMmdError::config(format!(
            "{} coefficients is not a truncated signature of dimension {}",
            signatures.ncols(),
            dim
        ))
    })?;
    let range = level_range(dim, k, depth)?;
    signatures
        .column_range(range.start, range.end)
        .ok_or_else(|| SigMmdError::SignatureComputation("level range out of bounds".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    const TOL: f64 = 1e-12;

    fn l_shaped() -> PathBank {
        PathBank::from_paths(&[vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]]]).unwrap()
    }

    fn zigzag() -> PathBank {
        PathBank::from_paths(&[vec![
            vec![0.0, 0.0],
            vec![0.7, -0.2],
            vec![0.3, 1.1],
            vec![1.5, 0.4],
            vec![0.9, -0.6],
        ]])
        .unwrap()
    }

    #[test]
    fn test_signature_len() {
        assert_eq!(signature_len(2, 0).unwrap(), 0);
        assert_eq!(signature_len(2, 3).unwrap(), 2 + 4 + 8);
        assert_eq!(signature_len(1, 4).unwrap(), 4);
        assert!(matches!(
            signature_len(usize::MAX, 3),
            Err(SigMmdError::SignatureComputation(_))
        ));
    }

    #[test]
    fn test_level_range_offsets() {
        assert_eq!(level_range(2, 1, 3).unwrap(), 0..2);
        assert_eq!(level_range(2, 2, 3).unwrap(), 2..6);
        assert_eq!(level_range(2, 3, 3).unwrap(), 6..14);
        assert_eq!(level_range(3, 3, 3).unwrap(), 12..39);
        // Σ_{i=0}^{k-1} d^i - 1
        let d: usize = 4;
        let k = 3;
        let start: usize = (0..k).map(|i| d.pow(i as u32)).sum::<usize>() - 1;
        assert_eq!(level_range(d, k, 5).unwrap().start, start);
    }

    #[test]
    fn test_level_range_rejects_bad_input() {
        assert!(level_range(0, 1, 1).is_err());
        assert!(level_range(2, 0, 2).is_err());
        assert!(level_range(2, 3, 2).is_err());
    }

    #[test]
    fn test_depth_for_len() {
        assert_eq!(depth_for_len(2, 14), Some(3));
        assert_eq!(depth_for_len(3, 3), Some(1));
        assert_eq!(depth_for_len(1, 5), Some(5));
        assert_eq!(depth_for_len(2, 5), None);
        assert_eq!(depth_for_len(2, 0), Some(0));
    }

    #[test]
    fn test_one_dimensional_signature_is_power_series() {
        // In 1D the level-m term is (x_T - x_0)^m / m!
        let bank = PathBank::new(vec![0.0, 1.0, 3.0], 1, 3, 1).unwrap();
        let sigs = signatures(&bank, 3).unwrap();
        assert_eq!(sigs.shape(), (1, 3));
        assert!((sigs[(0, 0)] - 3.0).abs() < TOL);
        assert!((sigs[(0, 1)] - 4.5).abs() < TOL);
        assert!((sigs[(0, 2)] - 4.5).abs() < TOL);
    }

    #[test]
    fn test_l_shaped_path_level_two() {
        let sigs = signatures(&l_shaped(), 2).unwrap();
        let expected = [1.0, 1.0, 0.5, 1.0, 0.0, 0.5];
        for (j, &e) in expected.iter().enumerate() {
            assert!(
                (sigs[(0, j)] - e).abs() < TOL,
                "coefficient {}: {} vs {}",
                j,
                sigs[(0, j)],
                e
            );
        }
    }

    #[test]
    fn test_shuffle_identity_level_two() {
        // S^{ij} + S^{ji} = S^i S^j
        let sigs = signatures(&zigzag(), 2).unwrap();
        let s = sigs.row(0);
        for i in 0..2 {
            for j in 0..2 {
                let lhs = s[2 + i * 2 + j] + s[2 + j * 2 + i];
                assert!((lhs - s[i] * s[j]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_constant_and_single_point_paths_have_zero_signature() {
        let bank = PathBank::new(vec![1.0, 2.0, 1.0, 2.0], 2, 1, 2).unwrap();
        let sigs = signatures(&bank, 2).unwrap();
        assert_eq!(sigs.shape(), (2, 6));
        assert!(sigs.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_depth_zero_is_ones() {
        let sigs = signatures(&zigzag(), 0).unwrap();
        assert_eq!(sigs, SigMatrix::level_zero(1));
    }

    #[test]
    fn test_level_k_extraction_paths_agree() {
        let bank = zigzag();
        let full = signatures(&bank, 4).unwrap();
        for k in 1..=4 {
            let direct = level_k_signatures_from_paths(&bank, k).unwrap();
            let sliced = level_k_signatures_from_signatures(&full, k, 2).unwrap();
            assert_eq!(direct.ncols(), 2usize.pow(k as u32));
            assert_eq!(direct.shape(), sliced.shape());
            for (a, b) in direct.as_slice().iter().zip(sliced.as_slice()) {
                assert!((a - b).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_level_k_from_signatures_validation() {
        let full = signatures(&zigzag(), 2).unwrap();
        assert!(level_k_signatures_from_signatures(&full, 3, 2).is_err());
        assert!(level_k_signatures_from_signatures(&full, 1, 0).is_err());
        assert!(level_k_signatures_from_signatures(&full, 1, 3).is_err());
        let ones = level_k_signatures_from_signatures(&full, 0, 2).unwrap();
        assert_eq!(ones, SigMatrix::level_zero(1));
    }

    #[test]
    fn test_depth_zero_bank_has_no_higher_levels() {
        // 1D: a depth-0 bank has the same N x 1 shape as a depth-1 bank
        let bank = PathBank::new(vec![0.0, 5.0, 1.0, -1.0], 2, 2, 1).unwrap();
        let trivial = signatures(&bank, 0).unwrap();
        let err = level_k_signatures_from_signatures(&trivial, 1, 1).unwrap_err();
        assert!(matches!(err, SigMmdError::InvalidConfiguration(_)));
        assert!(level_k_signatures_from_signatures(&trivial, 2, 1).is_err());
        assert_eq!(
            level_k_signatures_from_signatures(&trivial, 0, 1).unwrap(),
            SigMatrix::level_zero(2)
        );

        let level_one =
            level_k_signatures_from_signatures(&signatures(&bank, 1).unwrap(), 1, 1).unwrap();
        assert!(!level_one.is_level_zero());
        assert_eq!(level_one.column(0), &[5.0, -2.0]);
    }

    struct BrokenBackend {
        called: AtomicBool,
    }

    impl SignatureBackend for BrokenBackend {
        fn compute(&self, paths: &PathBank, _depth: usize) -> Result<SigMatrix> {
            self.called.store(true, Ordering::SeqCst);
            Ok(SigMatrix::zeros(paths.n_paths(), 1))
        }
    }

    #[test]
    fn test_backend_shape_is_checked() {
        let backend = BrokenBackend {
            called: AtomicBool::new(false),
        };
        let err = signatures_with(&backend, &zigzag(), 2).unwrap_err();
        assert!(matches!(err, SigMmdError::SignatureComputation(_)));
        assert!(backend.called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_zero_dimension_fails_before_backend() {
        let backend = BrokenBackend {
            called: AtomicBool::new(false),
        };
        let bank = PathBank::new(Vec::new(), 3, 4, 0).unwrap();
        let err = signatures_with(&backend, &bank, 2).unwrap_err();
        assert!(matches!(err, SigMmdError::InvalidConfiguration(_)));
        assert!(!backend.called.load(Ordering::SeqCst));
    }
}
