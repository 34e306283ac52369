// src/engine/scheduler.rs

//! Bounded parallel scheduler.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, trace};

use crate::errors::{Result, RfileError};

/// `max(1, cpus - 1)`, leaving a core for the terminal and the watcher.
pub fn default_parallelism() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Run `operations` with at most `max_parallel` in flight and return their
/// outputs in submission order.
///
/// Permits are acquired in submission order, so operations start in the
/// order given. An operation returning `Ok` never affects its siblings,
/// whatever it holds. The first `Err` aborts every operation still running
/// or waiting and is returned at once, even while siblings would run
/// forever (a watch loop, for instance).
/// Every call owns its semaphore, so an operation may itself call `run_all`
/// without starving its parent.
pub async fn run_all<F, T>(operations: Vec<F>, max_parallel: usize) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut results: Vec<Option<T>> = operations.iter().map(|_| None).collect();
    // Dropping the set aborts whatever is still in it.
    let mut running: JoinSet<(usize, Result<T>)> = JoinSet::new();

    for (index, operation) in operations.into_iter().enumerate() {
        let permit = loop {
            tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    break permit.map_err(|e| {
                        RfileError::internal(format!("scheduler semaphore closed: {e}"))
                    })?;
                }
                Some(joined) = running.join_next() => collect(&mut results, joined)?,
            }
        };
        trace!(index, "starting parallel operation");
        running.spawn(async move {
            let output = operation.await;
            drop(permit);
            (index, output)
        });
    }

    while let Some(joined) = running.join_next().await {
        collect(&mut results, joined)?;
    }

    results
        .into_iter()
        .map(|r| r.ok_or_else(|| RfileError::internal("parallel operation produced no result")))
        .collect()
}

fn collect<T>(
    results: &mut [Option<T>],
    joined: std::result::Result<(usize, Result<T>), JoinError>,
) -> Result<()> {
    let (index, output) = joined
        .map_err(|e| RfileError::internal(format!("parallel operation did not complete: {e}")))?;
    if let Err(err) = &output {
        debug!(index, error = %err, "parallel operation failed, aborting siblings");
    }
    results[index] = Some(output?);
    Ok(())
}
