//! Stochastic process models that generate path banks.
//!
//! A model is a plain value exposing a drift `f(t, y)` and a diffusion
//! `g(t, y)` for the SDE `dY = f(t, Y) dt + g(t, Y) dW`, together with the
//! noise and calculus tags a solver needs. Integrating these models into path
//! banks happens outside this crate.

/// Structure of the driving noise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoiseType {
    /// Each state coordinate has its own independent Brownian motion
    Diagonal,
    /// All coordinates share one scalar Brownian motion
    Scalar,
    /// Full diffusion matrix
    General,
}

/// Stochastic calculus convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SdeType {
    Ito,
    Stratonovich,
}

/// Drift and diffusion fields of a diagonal-noise SDE.
pub trait StochasticProcess: Send + Sync {
    /// Drift `f(t, y)`, written into `out` (same length as `y`).
    fn drift(&self, t: f64, y: &[f64], out: &mut [f64]);

    /// Diffusion `g(t, y)`, written into `out` (same length as `y`).
    fn diffusion(&self, t: f64, y: &[f64], out: &mut [f64]);

    fn noise_type(&self) -> NoiseType;

    fn sde_type(&self) -> SdeType;
}

/// Brownian motion with constant drift `mu` and volatility `sigma`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaledBrownianMotion {
    pub mu: f64,
    pub sigma: f64,
    pub noise_type: NoiseType,
    pub sde_type: SdeType,
}

impl ScaledBrownianMotion {
    /// Diagonal-noise Itô model.
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self {
            mu,
            sigma,
            noise_type: NoiseType::Diagonal,
            sde_type: SdeType::Ito,
        }
    }
}

impl StochasticProcess for ScaledBrownianMotion {
    fn drift(&self, _t: f64, _y: &[f64], out: &mut [f64]) {
        out.fill(self.mu);
    }

    fn diffusion(&self, _t: f64, _y: &[f64], out: &mut [f64]) {
        out.fill(self.sigma);
    }

    fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    fn sde_type(&self) -> SdeType {
        self.sde_type
    }
}

/// Geometric Brownian motion: drift `mu * y`, diffusion `sigma * y`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometricBrownianMotion {
    pub mu: f64,
    pub sigma: f64,
    pub noise_type: NoiseType,
    pub sde_type: SdeType,
}

impl GeometricBrownianMotion {
    /// Diagonal-noise Itô model.
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self {
            mu,
            sigma,
            noise_type: NoiseType::Diagonal,
            sde_type: SdeType::Ito,
        }
    }
}

impl StochasticProcess for GeometricBrownianMotion {
    fn drift(&self, _t: f64, y: &[f64], out: &mut [f64]) {
        for (o, &v) in out.iter_mut().zip(y) {
            *o = self.mu * v;
        }
    }

    fn diffusion(&self, _t: f64, y: &[f64], out: &mut [f64]) {
        for (o, &v) in out.iter_mut().zip(y) {
            *o = self.sigma * v;
        }
    }

    fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    fn sde_type(&self) -> SdeType {
        self.sde_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_brownian_fields_ignore_state() {
        let model = ScaledBrownianMotion::new(0.3, 1.5);
        let mut out = [0.0; 3];
        model.drift(0.7, &[5.0, -2.0, 1.0], &mut out);
        assert_eq!(out, [0.3; 3]);
        model.diffusion(0.0, &[5.0, -2.0, 1.0], &mut out);
        assert_eq!(out, [1.5; 3]);
        assert_eq!(model.noise_type(), NoiseType::Diagonal);
        assert_eq!(model.sde_type(), SdeType::Ito);
    }

    #[test]
    fn test_geometric_brownian_fields_scale_with_state() {
        let model = GeometricBrownianMotion {
            sde_type: SdeType::Stratonovich,
            ..GeometricBrownianMotion::new(0.5, 0.2)
        };
        let mut out = [0.0; 2];
        model.drift(1.0, &[2.0, -4.0], &mut out);
        assert_eq!(out, [1.0, -2.0]);
        model.diffusion(1.0, &[2.0, -4.0], &mut out);
        assert!((out[0] - 0.4).abs() < 1e-15);
        assert!((out[1] + 0.8).abs() < 1e-15);
        assert_eq!(model.sde_type(), SdeType::Stratonovich);
    }
}
