//! Bounded-concurrency execution.
//!
//! Keeps up to `max_concurrent` batches running at once; when one finishes,
//! the next batch in partition order is started until the queue is empty or
//! the run is cancelled. Results are recorded in completion order.

use tokio::task::JoinSet;

use super::error::DispatchError;
use super::invoke::{run_batch, InvokeContext};
use super::result::{BatchRunSummary, InvocationResult};
use super::run::record;
use crate::batch::UrlBatch;

pub(super) async fn run_parallel(
    ctx: &InvokeContext,
    batches: &[UrlBatch],
    max_concurrent: usize,
    summary: &mut BatchRunSummary,
) -> Result<(), DispatchError> {
    let max_concurrent = max_concurrent.max(1);
    let total = batches.len();
    let mut queue = batches.iter();
    let mut join_set: JoinSet<Result<InvocationResult, DispatchError>> = JoinSet::new();

    loop {
        while join_set.len() < max_concurrent && !ctx.control.is_cancelled() {
            let Some(batch) = queue.next() else {
                break;
            };
            ctx.sink.batch_started(batch, total);
            let ctx = ctx.clone();
            let batch = batch.clone();
            join_set.spawn(async move { run_batch(&ctx, &batch).await });
        }

        if join_set.is_empty() {
            break;
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        let outcome = joined
            .map_err(|e| DispatchError::io("batch task", std::io::Error::other(e)))?;
        match outcome {
            Ok(result) => record(ctx, summary, result),
            Err(e) => {
                // Dropping the remaining tasks kills their processes (kill_on_drop).
                join_set.shutdown().await;
                return Err(e);
            }
        }
    }

    Ok(())
}
