//! Level-k Gram matrices and MMD contributions.
//!
//! For a fixed signature level `k ≥ 1` the contribution of that level to the
//! squared MMD between banks `X` (size `N`) and `Y` is
//!
//! ```text
//! M_k = φ(k) * [ (ΣG_XX + ΣG_YY) / D  -  2 ΣG_XY / N² ]
//! ```
//!
//! where `G_AB` is the Gram matrix of level-k signature blocks and `D` is `N²`
//! for the biased (V-statistic) estimate, or `N(N-1)` for the unbiased
//! (U-statistic) estimate with self-pairs removed from `G_XX` and `G_YY`.
//!
//! The cross term is normalised by `N²` with `N` the size of `X`, even when `Y`
//! holds a different number of paths. Distributions calibrated against this
//! estimator depend on that convention.

use crate::error::{Result, SigMmdError};
use crate::matrix::SigMatrix;
use crate::path::PathBank;
use crate::signature::{level_k_signatures_from_paths_with, ChenSignature, SignatureBackend};
use crate::weight::LevelWeight;

/// Check that two banks can be compared: same, non-zero dimension.
pub(crate) fn check_pair(x: &PathBank, y: &PathBank) -> Result<()> {
    if x.dim() != y.dim() {
        return Err(SigMmdError::DimensionMismatch {
            left: x.dim(),
            right: y.dim(),
        });
    }
    if x.dim() == 0 {
        return Err(SigMmdError::config("path dimension must be > 0"));
    }
    Ok(())
}

/// Check bank sizes for a contribution estimate.
pub(crate) fn check_sizes(n_x: usize, n_y: usize, unbiased: bool) -> Result<()> {
    if n_x == 0 || n_y == 0 {
        return Err(SigMmdError::config("path banks must be non-empty"));
    }
    if unbiased && n_x < 2 {
        return Err(SigMmdError::config(format!(
            "unbiased estimate needs at least 2 paths, got {}",
            n_x
        )));
    }
    Ok(())
}

/// Level-`k` Gram matrix between `x` and `y`.
///
/// Entry `(i, j)` is the inner product of the level-`k` signature blocks of
/// path `i` of `x` and path `j` of `y`.
pub fn gram(x: &PathBank, y: &PathBank, k: usize) -> Result<SigMatrix> {
    gram_with(&ChenSignature, x, y, k)
}

/// [`gram`] with an explicit signature backend.
pub fn gram_with<B: SignatureBackend + ?Sized>(
    backend: &B,
    x: &PathBank,
    y: &PathBank,
    k: usize,
) -> Result<SigMatrix> {
    check_pair(x, y)?;
    let sx = level_k_signatures_from_paths_with(backend, x, k)?;
    let sy = level_k_signatures_from_paths_with(backend, y, k)?;
    block_gram(&sx, &sy)
}

fn block_gram(sx: &SigMatrix, sy: &SigMatrix) -> Result<SigMatrix> {
    sx.gram(sy).ok_or(SigMmdError::DimensionMismatch {
        left: sx.ncols(),
        right: sy.ncols(),
    })
}

/// `Λ_k(X, Y)`: inner product of the mean level-`k` signatures. `Λ_0 = 1`.
pub fn lambda_k(x: &PathBank, y: &PathBank, k: usize) -> Result<f64> {
    lambda_k_with(&ChenSignature, x, y, k)
}

/// [`lambda_k`] with an explicit signature backend.
pub fn lambda_k_with<B: SignatureBackend + ?Sized>(
    backend: &B,
    x: &PathBank,
    y: &PathBank,
    k: usize,
) -> Result<f64> {
    check_pair(x, y)?;
    if k == 0 {
        return Ok(1.0);
    }
    let sx = level_k_signatures_from_paths_with(backend, x, k)?;
    let sy = level_k_signatures_from_paths_with(backend, y, k)?;
    Ok(lambda_from_blocks(&sx, &sy))
}

pub(crate) fn lambda_from_blocks(sx: &SigMatrix, sy: &SigMatrix) -> f64 {
    sx.column_means()
        .iter()
        .zip(sy.column_means())
        .map(|(a, b)| a * b)
        .sum()
}

/// Level-`k` contribution `M_k` to the truncated MMD.
///
/// Level 0 contributes exactly 0.
pub fn level_k_contribution<W: LevelWeight + ?Sized>(
    x: &PathBank,
    y: &PathBank,
    k: usize,
    weight: &W,
    unbiased: bool,
) -> Result<f64> {
    level_k_contribution_with(&ChenSignature, x, y, k, weight, unbiased)
}

/// [`level_k_contribution`] with an explicit signature backend.
pub fn level_k_contribution_with<B, W>(
    backend: &B,
    x: &PathBank,
    y: &PathBank,
    k: usize,
    weight: &W,
    unbiased: bool,
) -> Result<f64>
where
    B: SignatureBackend + ?Sized,
    W: LevelWeight + ?Sized,
{
    check_pair(x, y)?;
    if k == 0 {
        return Ok(0.0);
    }
    check_sizes(x.n_paths(), y.n_paths(), unbiased)?;
    let sx = level_k_signatures_from_paths_with(backend, x, k)?;
    let sy = level_k_signatures_from_paths_with(backend, y, k)?;
    contribution_from_blocks(&sx, &sy, k, weight, unbiased)
}

/// `M_k` from precomputed level-`k` signature blocks.
pub(crate) fn contribution_from_blocks<W: LevelWeight + ?Sized>(
    sx: &SigMatrix,
    sy: &SigMatrix,
    k: usize,
    weight: &W,
    unbiased: bool,
) -> Result<f64> {
    let n = sx.nrows();
    if n != sy.nrows() {
        log::debug!(
            "level {} contribution: cross term normalised by N² = {}² with M = {}",
            k,
            n,
            sy.nrows()
        );
    }

    let mut gxx = block_gram(sx, sx)?;
    let mut gyy = block_gram(sy, sy)?;
    let gxy = block_gram(sx, sy)?;

    let n = n as f64;
    let denom = if unbiased {
        gxx.zero_diagonal();
        gyy.zero_diagonal();
        n * (n - 1.0)
    } else {
        n * n
    };

    let within = (gxx.sum() + gyy.sum()) / denom;
    let cross = 2.0 * gxy.sum() / (n * n);
    Ok(weight.weight(k) * (within - cross))
}
