//! Truncated signature kernel and MMD.
//!
//! Both estimators compute each bank's signatures once at the truncation order
//! and slice every level out of that single bank.

use crate::error::Result;
use crate::level::{check_pair, check_sizes, contribution_from_blocks, lambda_from_blocks};
use crate::path::PathBank;
use crate::signature::{
    level_k_signatures_from_signatures, signatures_with, ChenSignature, SignatureBackend,
};
use crate::weight::LevelWeight;

/// Truncated signature kernel `Σ_{k=0}^{order} φ(k) Λ_k(X, Y)`.
///
/// # Arguments
/// * `x`, `y` - Path banks of equal dimension
/// * `order` - Truncation order
/// * `weight` - Per-level weight `φ`
pub fn kernel_est<W: LevelWeight + ?Sized>(
    x: &PathBank,
    y: &PathBank,
    order: usize,
    weight: &W,
) -> Result<f64> {
    kernel_est_with(&ChenSignature, x, y, order, weight)
}

/// [`kernel_est`] with an explicit signature backend.
pub fn kernel_est_with<B, W>(
    backend: &B,
    x: &PathBank,
    y: &PathBank,
    order: usize,
    weight: &W,
) -> Result<f64>
where
    B: SignatureBackend + ?Sized,
    W: LevelWeight + ?Sized,
{
    check_pair(x, y)?;
    let mut total = weight.weight(0);
    if order == 0 {
        return Ok(total);
    }

    let dim = x.dim();
    let sx = signatures_with(backend, x, order)?;
    let sy = signatures_with(backend, y, order)?;
    for k in 1..=order {
        let bx = level_k_signatures_from_signatures(&sx, k, dim)?;
        let by = level_k_signatures_from_signatures(&sy, k, dim)?;
        total += weight.weight(k) * lambda_from_blocks(&bx, &by);
    }
    Ok(total)
}

/// Truncated signature MMD `Σ_{k=0}^{order} M_k(X, Y)`.
///
/// The statistic is not clamped; finite-sample estimates may be negative.
///
/// # Arguments
/// * `x`, `y` - Path banks of equal dimension
/// * `order` - Truncation order
/// * `weight` - Per-level weight `φ`
/// * `unbiased` - Drop self-pairs from the within-bank sums
pub fn mmd_est<W: LevelWeight + ?Sized>(
    x: &PathBank,
    y: &PathBank,
    order: usize,
    weight: &W,
    unbiased: bool,
) -> Result<f64> {
    mmd_est_with(&ChenSignature, x, y, order, weight, unbiased)
}

/// [`mmd_est`] with an explicit signature backend.
pub fn mmd_est_with<B, W>(
    backend: &B,
    x: &PathBank,
    y: &PathBank,
    order: usize,
    weight: &W,
    unbiased: bool,
) -> Result<f64>
where
    B: SignatureBackend + ?Sized,
    W: LevelWeight + ?Sized,
{
    check_pair(x, y)?;
    if order == 0 {
        return Ok(0.0);
    }
    check_sizes(x.n_paths(), y.n_paths(), unbiased)?;

    let dim = x.dim();
    let sx = signatures_with(backend, x, order)?;
    let sy = signatures_with(backend, y, order)?;

    let mut total = 0.0_f64;
    for k in 1..=order {
        let bx = level_k_signatures_from_signatures(&sx, k, dim)?;
        let by = level_k_signatures_from_signatures(&sy, k, dim)?;
        total += contribution_from_blocks(&bx, &by, k, weight, unbiased)?;
    }
    Ok(total)
}
