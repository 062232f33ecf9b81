//! Execution abstraction layer over the rayon thread pool.
//!
//! Per-path analysis is embarrassingly parallel: each path owns its sums,
//! lon table, polygon and curves, so the only shared state is an atomic
//! progress counter. This module keeps call sites decoupled from rayon so
//! the scheduling policy lives in one place.

use rayon::prelude::*;

/// Number of worker threads in the current pool.
pub fn current_num_threads() -> usize {
    rayon::current_num_threads()
}

/// Map `func` over `items` on the thread pool, preserving order.
pub fn execute_parallel<I, F, R>(items: I, func: F) -> Vec<R>
where
    I: IntoParallelIterator,
    F: Fn(I::Item) -> R + Send + Sync,
    R: Send,
{
    items.into_par_iter().map(func).collect()
}

/// Map and filter in one parallel pass, preserving order of the survivors.
pub fn execute_parallel_filter_map<I, F, R>(items: I, func: F) -> Vec<R>
where
    I: IntoParallelIterator,
    F: Fn(I::Item) -> Option<R> + Send + Sync,
    R: Send,
{
    items.into_par_iter().filter_map(func).collect()
}
