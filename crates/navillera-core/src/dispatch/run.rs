//! Sequential execution: one batch at a time, in partition order.

use super::error::DispatchError;
use super::invoke::{run_batch, InvokeContext};
use super::result::{BatchRunSummary, InvocationResult};
use crate::batch::UrlBatch;

pub(super) async fn run_sequential(
    ctx: &InvokeContext,
    batches: &[UrlBatch],
    summary: &mut BatchRunSummary,
) -> Result<(), DispatchError> {
    let total = batches.len();
    for batch in batches {
        if ctx.control.is_cancelled() {
            tracing::info!(remaining = total - batch.index, "cancelled; not starting remaining batches");
            break;
        }
        ctx.sink.batch_started(batch, total);
        let result = run_batch(ctx, batch).await?;
        record(ctx, summary, result);
    }
    Ok(())
}

/// Folds a finished invocation into the summary and reports it.
pub(super) fn record(ctx: &InvokeContext, summary: &mut BatchRunSummary, result: InvocationResult) {
    summary
        .progress
        .record_batch(result.urls.len(), &result.counts, result.succeeded);
    ctx.sink.batch_finished(&result, &summary.progress);
    summary.results.push(result);
}
