//! Monte Carlo null/alternate distributions of a two-sample statistic.
//!
//! Each trial draws three index multisets of size `batch_size` with
//! replacement: `X1` and `X2` from the null bank `H0`, `Y` from the alternate
//! bank `H1`. The null atom is `stat(H0[X1], H0[X2])` and the alternate atom is
//! `stat(H0[X1], H1[Y])`. Both atoms of a trial share the `X1` sub-sample.
//!
//! Trial `i` draws from its own `StdRng` seeded with `seed + i`, so results do
//! not depend on whether trials run in parallel.

use crate::error::{Result, SigMmdError};
use crate::helpers::empirical_quantile;
use crate::iter_maybe_parallel;
use crate::path::PathBank;
use indicatif::{ProgressBar, ProgressStyle};
use rand::prelude::*;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Sampler configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SamplerConfig {
    /// Number of atoms in each distribution
    pub n_atoms: usize,
    /// Paths drawn per sub-sample
    pub batch_size: usize,
    /// Report progress on the console
    pub verbose: bool,
    /// Base seed; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_atoms: 128,
            batch_size: 32,
            verbose: false,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn with_n_atoms(mut self, n_atoms: usize) -> Self {
        self.n_atoms = n_atoms;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject zero atom counts and batch sizes.
    pub fn validate(&self) -> Result<()> {
        if self.n_atoms == 0 {
            return Err(SigMmdError::config("n_atoms must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(SigMmdError::config("batch_size must be > 0"));
        }
        Ok(())
    }
}

/// Observer for sampler progress. Has no effect on the returned values.
///
/// With the `parallel` feature `on_atom` may be called from several threads
/// and out of order. Every run that calls `on_start` ends with exactly one of
/// `on_finish` or `on_abort`.
pub trait ProgressObserver: Sync {
    fn on_start(&self, _n_atoms: usize) {}
    fn on_atom(&self, _index: usize) {}
    fn on_finish(&self) {}
    /// The statistic failed and no distributions will be returned.
    fn on_abort(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {}

/// Console progress bar.
#[derive(Debug)]
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} atoms ({percent}%)",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_start(&self, n_atoms: usize) {
        self.bar.set_length(n_atoms as u64);
        self.bar.set_position(0);
    }

    fn on_atom(&self, _index: usize) {
        self.bar.inc(1);
    }

    fn on_finish(&self) {
        self.bar.finish_with_message("done");
    }

    fn on_abort(&self) {
        self.bar.abandon_with_message("aborted");
    }
}

/// Empirical null and alternate distributions of equal length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MmdDistributions {
    /// Atoms under the null hypothesis
    pub null: Vec<f64>,
    /// Atoms under the alternate hypothesis
    pub alternate: Vec<f64>,
}

impl MmdDistributions {
    /// Number of atoms per distribution.
    pub fn len(&self) -> usize {
        self.null.len()
    }

    pub fn is_empty(&self) -> bool {
        self.null.is_empty()
    }

    /// Rejection threshold at significance `alpha`, see [`critical_value`].
    pub fn critical_value(&self, alpha: f64) -> Result<f64> {
        critical_value(&self.null, alpha)
    }

    /// Type-II error of the level-`alpha` test built from these distributions.
    pub fn type2_error(&self, alpha: f64) -> Result<f64> {
        let crit = self.critical_value(alpha)?;
        expected_type2_error(&self.alternate, crit)
    }
}

/// Build null and alternate distributions of `stat`.
///
/// Progress goes to a [`ConsoleProgress`] bar when `config.verbose` is set.
///
/// # Arguments
/// * `h0_paths` - Bank of paths under the null hypothesis
/// * `h1_paths` - Bank of paths under the alternate hypothesis, same size as `h0_paths`
/// * `stat` - Two-sample statistic, typically a truncated signature MMD
/// * `config` - Atom count, batch size, seed
///
/// # Errors
/// `InvalidConfiguration` for a zero atom count, batch size or bank size,
/// `SizeMismatch` when the banks differ in size, and any error `stat` raises.
pub fn return_mmd_distributions<F>(
    h0_paths: &PathBank,
    h1_paths: &PathBank,
    stat: F,
    config: &SamplerConfig,
) -> Result<MmdDistributions>
where
    F: Fn(&PathBank, &PathBank) -> Result<f64> + Sync,
{
    if config.verbose {
        let progress = ConsoleProgress::new();
        return_mmd_distributions_observed(h0_paths, h1_paths, stat, config, &progress)
    } else {
        return_mmd_distributions_observed(h0_paths, h1_paths, stat, config, &SilentProgress)
    }
}

/// [`return_mmd_distributions`] reporting to an explicit observer.
///
/// `config.verbose` is ignored here.
pub fn return_mmd_distributions_observed<F, O>(
    h0_paths: &PathBank,
    h1_paths: &PathBank,
    stat: F,
    config: &SamplerConfig,
    observer: &O,
) -> Result<MmdDistributions>
where
    F: Fn(&PathBank, &PathBank) -> Result<f64> + Sync,
    O: ProgressObserver + ?Sized,
{
    config.validate()?;
    let bank_size = h0_paths.n_paths();
    if bank_size != h1_paths.n_paths() {
        return Err(SigMmdError::SizeMismatch {
            left: bank_size,
            right: h1_paths.n_paths(),
        });
    }
    if bank_size == 0 {
        return Err(SigMmdError::config("path banks must be non-empty"));
    }

    let base_seed = match config.seed {
        Some(s) => s,
        None => StdRng::from_entropy().gen(),
    };
    let n_atoms = config.n_atoms;
    let batch_size = config.batch_size;
    log::debug!(
        "sampling {} atoms, batch {} from banks of {} paths (seed {})",
        n_atoms,
        batch_size,
        bank_size,
        base_seed
    );

    observer.on_start(n_atoms);
    let atoms: Result<Vec<(f64, f64)>> = iter_maybe_parallel!(0..n_atoms)
        .map(|i| -> Result<(f64, f64)> {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
            let mut draw = || -> Vec<usize> {
                (0..batch_size).map(|_| rng.gen_range(0..bank_size)).collect()
            };
            let (x1, x2, y) = (draw(), draw(), draw());

            let x1 = subsample(h0_paths, &x1)?;
            let x2 = subsample(h0_paths, &x2)?;
            let y = subsample(h1_paths, &y)?;

            let null = stat(&x1, &x2)?;
            let alternate = stat(&x1, &y)?;
            log::trace!("atom {}: null {:.6e}, alternate {:.6e}", i, null, alternate);
            observer.on_atom(i);
            Ok((null, alternate))
        })
        .collect();
    let atoms = match atoms {
        Ok(atoms) => atoms,
        Err(e) => {
            log::debug!("sampler aborted: {}", e);
            observer.on_abort();
            return Err(e);
        }
    };
    observer.on_finish();

    let (null, alternate) = atoms.into_iter().unzip();
    Ok(MmdDistributions { null, alternate })
}

fn subsample(bank: &PathBank, indices: &[usize]) -> Result<PathBank> {
    bank.select(indices)
        .ok_or_else(|| SigMmdError::config("sub-sample index outside path bank"))
}

/// `(1 - alpha)` empirical quantile of the null distribution.
///
/// Requires `0 < alpha < 1` and a non-empty distribution.
pub fn critical_value(null_dist: &[f64], alpha: f64) -> Result<f64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(SigMmdError::config(format!(
            "significance level must lie in (0, 1), got {}",
            alpha
        )));
    }
    empirical_quantile(null_dist, 1.0 - alpha)
        .ok_or_else(|| SigMmdError::config("null distribution is empty"))
}

/// Fraction of alternate atoms that do not exceed `crit_value`.
///
/// This is the empirical probability of failing to reject the null when the
/// alternate holds.
pub fn expected_type2_error(h1_dist: &[f64], crit_value: f64) -> Result<f64> {
    if h1_dist.is_empty() {
        return Err(SigMmdError::config("alternate distribution is empty"));
    }
    let fails = h1_dist.iter().filter(|&&v| v <= crit_value).count();
    Ok(fails as f64 / h1_dist.len() as f64)
}
