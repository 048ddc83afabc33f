//! Error types shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised while computing signatures, MMD statistics or distributions.
///
/// All variants indicate caller misuse; nothing here is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SigMmdError {
    /// A truncation order, dimension, atom count, batch size or bank size is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two path banks do not share the same per-step dimension.
    #[error("path dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Two path banks handed to the sampler do not hold the same number of paths.
    #[error("path bank size mismatch: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    /// The signature backend rejected its input.
    #[error("signature computation failed: {0}")]
    SignatureComputation(String),
}

impl SigMmdError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SigMmdError::InvalidConfiguration(msg.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SigMmdError>;
