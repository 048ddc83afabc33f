//! Per-level weighting strategies for truncated signature kernels.
//!
//! The truncated kernel and MMD take a [`LevelWeight`] value rather than a
//! baked-in constant. Any `Fn(usize) -> f64` closure also qualifies.

/// Scalar multiplier applied to the level-`k` term.
pub trait LevelWeight: Sync {
    /// Weight of signature level `level`.
    fn weight(&self, level: usize) -> f64;
}

impl<F> LevelWeight for F
where
    F: Fn(usize) -> f64 + Sync,
{
    fn weight(&self, level: usize) -> f64 {
        self(level)
    }
}

/// Weight 1 at every level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Uniform;

impl LevelWeight for Uniform {
    fn weight(&self, _level: usize) -> f64 {
        1.0
    }
}

/// `1 / k!`, damping higher levels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorialDecay;

impl LevelWeight for FactorialDecay {
    fn weight(&self, level: usize) -> f64 {
        (1..=level).fold(1.0, |acc, i| acc / i as f64)
    }
}

/// `ratio^k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricDecay(pub f64);

impl LevelWeight for GeometricDecay {
    fn weight(&self, level: usize) -> f64 {
        self.0.powi(level as i32)
    }
}
