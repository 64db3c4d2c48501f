//! Fail-fast aggregate join
//!
//! Every future runs to completion. The batch succeeds only when all of them
//! succeed; otherwise the successes are dropped and every error is returned.

use std::future::Future;

use futures::future::join_all;
use tracing::debug;

/// Drive all keyed futures concurrently and settle them as one outcome
///
/// This is a join, not a race: an early failure does not cancel the others,
/// but it does prevent any success from being returned.
pub async fn join_all_or_fail<K, T, E, F>(tasks: impl IntoIterator<Item = (K, F)>) -> Result<Vec<(K, T)>, Vec<(K, E)>>
where
    F: Future<Output = Result<T, E>>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = tasks.into_iter().unzip();
    debug!(count = futures.len(), "join_all_or_fail: called");

    let outcomes = join_all(futures).await;

    let mut successes = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (key, outcome) in keys.into_iter().zip(outcomes) {
        match outcome {
            Ok(value) => successes.push((key, value)),
            Err(err) => failures.push((key, err)),
        }
    }

    if failures.is_empty() {
        debug!(succeeded = successes.len(), "join_all_or_fail: all succeeded");
        Ok(successes)
    } else {
        debug!(failed = failures.len(), discarded = successes.len(), "join_all_or_fail: batch failed");
        Err(failures)
    }
}
