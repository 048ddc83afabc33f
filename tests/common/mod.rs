//! Shared helpers for integration tests: Euler-Maruyama path banks.

#![allow(dead_code)]

use rand::prelude::*;
use rand_distr::StandardNormal;
use sigmmd::{PathBank, StochasticProcess};

/// Sample `n_paths` diagonal-noise paths on `[0, horizon]` with `length` observations.
pub fn euler_bank<P: StochasticProcess>(
    process: &P,
    y0: &[f64],
    n_paths: usize,
    length: usize,
    horizon: f64,
    seed: u64,
) -> PathBank {
    let dim = y0.len();
    let dt = horizon / (length - 1) as f64;
    let sqrt_dt = dt.sqrt();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut data = Vec::with_capacity(n_paths * length * dim);
    let mut state = vec![0.0; dim];
    let mut drift = vec![0.0; dim];
    let mut diffusion = vec![0.0; dim];
    for _ in 0..n_paths {
        state.copy_from_slice(y0);
        data.extend_from_slice(&state);
        for step in 1..length {
            let t = (step - 1) as f64 * dt;
            process.drift(t, &state, &mut drift);
            process.diffusion(t, &state, &mut diffusion);
            for c in 0..dim {
                let z: f64 = rng.sample(StandardNormal);
                state[c] += drift[c] * dt + diffusion[c] * sqrt_dt * z;
            }
            data.extend_from_slice(&state);
        }
    }
    PathBank::new(data, n_paths, length, dim).unwrap()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
