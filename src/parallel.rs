//! Parallel iteration switch.
//!
//! With the `parallel` feature, per-path signatures and sampler trials run on
//! rayon; without it (e.g. on WASM) they run sequentially. Results are the same
//! either way.

/// Macro for conditionally parallel iteration over ranges and owned collections.
///
/// When the `parallel` feature is enabled, uses `into_par_iter()`.
/// Otherwise, uses `into_iter()` for sequential execution.
///
/// ```ignore
/// use crate::iter_maybe_parallel;
///
/// let squares: Vec<_> = iter_maybe_parallel!(0..100)
///     .map(|i| i * i)
///     .collect();
/// ```
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}

pub use iter_maybe_parallel;
