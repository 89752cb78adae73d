// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group progress as the mean of its children's live progress.

use crate::context::SuiteContext;
use jt_core::{JobId, StatusHandle};
use jt_storage::StoreError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Arithmetic mean of the children's progress. No children means no progress.
pub fn mean_progress(children: &[StatusHandle]) -> f64 {
    if children.is_empty() {
        return 0.0;
    }
    children.iter().map(StatusHandle::progress).sum::<f64>() / children.len() as f64
}

/// Set the group's progress to the mean of its children and persist it.
pub(crate) fn refresh(ctx: &SuiteContext, group: &StatusHandle, children: &[StatusHandle]) -> Result<(), StoreError> {
    let progress = mean_progress(children);
    group.update(|s| {
        s.set_progress(progress);
        ctx.store().write(s)
    })
}

/// Background task refreshing a concurrent group's progress while its
/// children run. Dropping it without [`ProgressAggregator::finish`]
/// leaves the task to notice cancellation on its next tick.
pub struct ProgressAggregator {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressAggregator {
    pub fn spawn(ctx: Arc<SuiteContext>, group_id: JobId) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let interval = ctx.config().progress_poll();
        let handle = tokio::spawn(async move {
            let Some(group) = ctx.status(&group_id).cloned() else {
                return;
            };
            let children: Vec<StatusHandle> =
                ctx.tree().child_ids(&group_id).iter().filter_map(|id| ctx.status(id).cloned()).collect();
            tracing::trace!(job_id = %group_id, children = children.len(), "progress aggregation started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        // The group's own final write reports a broken store
                        if let Err(e) = refresh(&ctx, &group, &children) {
                            tracing::warn!(job_id = %group_id, error = %e, "failed to persist group progress");
                        }
                    }
                }
            }
            tracing::trace!(job_id = %group_id, "progress aggregation stopped");
        });
        Self { cancel, handle: Some(handle) }
    }

    /// Stop the task and wait for it, so no aggregate write can land
    /// after the group's final status.
    pub async fn finish(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "progress aggregation task ended abnormally");
            }
        }
    }
}

impl Drop for ProgressAggregator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
