//! # sigmmd
//!
//! Two-sample hypothesis testing for stochastic processes with truncated
//! signature kernels.
//!
//! Given a bank of paths sampled under a null law and a bank sampled under an
//! alternate law, this crate provides:
//! - Truncated path signatures and level-k extraction
//! - Level-k Gram matrices and biased/unbiased MMD contributions
//! - Truncated signature kernel and MMD estimators with pluggable level weights
//! - Monte Carlo null/alternate distributions of any two-sample statistic
//! - Critical values and expected Type-II error
//!
//! ## Data Layout
//!
//! - Path banks are rank-3 arrays `(N, l, d)` with each path stored contiguously.
//! - Signature banks are column-major `N x Σ_{i=1}^{k} d^i` matrices; each level
//!   is a contiguous block of columns.
//!
//! ## Example
//!
//! ```
//! use sigmmd::{mmd_est, return_mmd_distributions, PathBank, SamplerConfig, Uniform};
//!
//! // 1D straight paths from 0 to i/20 (null) and to 0.5 + i/20 (alternate)
//! let bank = |shift: f64| {
//!     let data: Vec<f64> = (0..20).flat_map(|i| [0.0, shift + i as f64 / 20.0]).collect();
//!     PathBank::new(data, 20, 2, 1).unwrap()
//! };
//! let (h0, h1) = (bank(0.0), bank(0.5));
//!
//! let config = SamplerConfig::default().with_n_atoms(16).with_batch_size(8).with_seed(1);
//! let stat = |x: &PathBank, y: &PathBank| mmd_est(x, y, 2, &Uniform, true);
//! let dists = return_mmd_distributions(&h0, &h1, stat, &config).unwrap();
//!
//! assert_eq!(dists.len(), 16);
//! let type2 = dists.type2_error(0.05).unwrap();
//! assert!((0.0..=1.0).contains(&type2));
//! ```

#![allow(clippy::needless_range_loop)]

pub mod parallel;

pub mod distribution;
pub mod error;
pub mod helpers;
pub mod kernel;
pub mod level;
pub mod matrix;
pub mod path;
pub mod process;
pub mod signature;
pub mod weight;

pub use distribution::{
    critical_value, expected_type2_error, return_mmd_distributions,
    return_mmd_distributions_observed, ConsoleProgress, MmdDistributions, ProgressObserver,
    SamplerConfig, SilentProgress,
};
pub use error::{Result, SigMmdError};
pub use kernel::{kernel_est, kernel_est_with, mmd_est, mmd_est_with};
pub use level::{gram, lambda_k, level_k_contribution};
pub use matrix::SigMatrix;
pub use path::PathBank;
pub use process::{
    GeometricBrownianMotion, NoiseType, ScaledBrownianMotion, SdeType, StochasticProcess,
};
pub use signature::{
    level_k_signatures_from_paths, level_k_signatures_from_signatures, level_range,
    signature_len, signatures, ChenSignature, SignatureBackend,
};
pub use weight::{FactorialDecay, GeometricDecay, LevelWeight, Uniform};
