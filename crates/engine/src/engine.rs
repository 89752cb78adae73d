// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs leaves and groups to a terminal state.
//!
//! Job failures are recorded in the job's status and returned as
//! [`Outcome::Failed`]; they never unwind past the engine. Only framework
//! faults ([`EngineError`]) abort a run.

use crate::context::SuiteContext;
use crate::error::{EngineError, ExecutionFailure, FailureCause, GroupFailure, JobError};
use crate::job::{FailurePolicy, GroupMode, Job, JobContext, JobGroup, JobNode};
use crate::progress::{self, ProgressAggregator};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use jt_core::{EventKind, JobId, JobState, JobStatus, StatusHandle};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Terminal result of running one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Stopped,
    Failed(ExecutionFailure),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn state(&self) -> JobState {
        match self {
            Outcome::Completed => JobState::Completed,
            Outcome::Stopped => JobState::Stopped,
            Outcome::Failed(_) => JobState::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    ctx: Arc<SuiteContext>,
}

impl Engine {
    pub fn new(ctx: Arc<SuiteContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<SuiteContext> {
        &self.ctx
    }

    /// Run `node` and its subtree to a terminal state.
    pub async fn run(&self, node: &JobNode) -> Result<Outcome, EngineError> {
        run_node(Arc::clone(&self.ctx), node.clone()).await
    }
}

fn run_node(ctx: Arc<SuiteContext>, node: JobNode) -> BoxFuture<'static, Result<Outcome, EngineError>> {
    async move {
        let id = node.id().clone();
        let handle = ctx.status(&id).cloned().ok_or_else(|| EngineError::UnknownJob(id.clone()))?;

        if ctx.config().resume && handle.state() == JobState::Completed {
            tracing::info!(job_id = %id, "already completed, skipping");
            return Ok(Outcome::Completed);
        }
        if handle.is_stop_requested() {
            skip_stopped(&ctx, &node)?;
            return Ok(Outcome::Stopped);
        }

        ctx.store().archive(&id)?;
        let now = ctx.now();
        let started = handle.update(|s| !s.stop_requested && s.start(now));
        if !started {
            skip_stopped(&ctx, &node)?;
            return Ok(Outcome::Stopped);
        }
        ctx.persist(&handle)?;
        tracing::info!(job_id = %id, "job started");
        ctx.emit_job(EventKind::JobStarted, handle.snapshot());

        let failure = match &node {
            JobNode::Leaf(job) => execute_leaf(&ctx, job, &handle).await,
            JobNode::Group(group) => match group.mode {
                GroupMode::Sequential { on_failure } => {
                    run_sequential(&ctx, group, &handle, on_failure).await?
                }
                GroupMode::Concurrent => run_concurrent(&ctx, group, &handle).await?,
            },
        };
        finish(&ctx, &handle, failure)
    }
    .boxed()
}

async fn execute_leaf(ctx: &Arc<SuiteContext>, job: &Arc<dyn Job>, handle: &StatusHandle) -> Option<FailureCause> {
    let job_ctx = JobContext::new(handle.clone(), Arc::clone(ctx));
    match AssertUnwindSafe(job.execute(job_ctx)).catch_unwind().await {
        Ok(Ok(())) => None,
        Ok(Err(JobError::Failed(reason))) => Some(FailureCause::Job(reason)),
        Ok(Err(e)) => Some(FailureCause::Job(e.to_string())),
        Err(panic) => Some(FailureCause::Panicked(panic_message(panic.as_ref()))),
    }
}

async fn run_sequential(
    ctx: &Arc<SuiteContext>,
    group: &JobGroup,
    handle: &StatusHandle,
    on_failure: FailurePolicy,
) -> Result<Option<FailureCause>, EngineError> {
    let children = child_handles(ctx, group)?;
    let mut failed = Vec::new();
    for (i, child) in group.children.iter().enumerate() {
        if handle.is_stop_requested() {
            tracing::info!(job_id = %group.id, "group stopping, not starting remaining children");
            for rest in &group.children[i..] {
                skip_stopped(ctx, rest)?;
            }
            break;
        }
        if !failed.is_empty() && on_failure == FailurePolicy::Abort {
            tracing::info!(job_id = %group.id, skipped = group.children.len() - i, "aborting after child failure");
            break;
        }
        let outcome = run_node(Arc::clone(ctx), child.clone()).await?;
        if outcome.is_failed() {
            failed.push(child.id().clone());
        }
        progress::refresh(ctx, handle, &children)?;
    }
    Ok(group_failure(group, failed))
}

async fn run_concurrent(
    ctx: &Arc<SuiteContext>,
    group: &JobGroup,
    handle: &StatusHandle,
) -> Result<Option<FailureCause>, EngineError> {
    let children = child_handles(ctx, group)?;
    let aggregator = ProgressAggregator::spawn(Arc::clone(ctx), group.id.clone());

    let mut set = JoinSet::new();
    for (i, child) in group.children.iter().enumerate() {
        let fut = run_node(Arc::clone(ctx), child.clone());
        set.spawn(async move { (i, fut.await) });
    }

    let mut outcomes: Vec<Option<Outcome>> = vec![None; group.children.len()];
    let mut fault = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((i, Ok(outcome))) => outcomes[i] = Some(outcome),
            Ok((_, Err(e))) => {
                tracing::error!(job_id = %group.id, error = %e, "framework fault in group child");
                fault.get_or_insert(e);
            }
            Err(e) => {
                tracing::error!(job_id = %group.id, error = %e, "group join interrupted");
                fault.get_or_insert(EngineError::JoinInterrupted {
                    group_id: group.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    aggregator.finish().await;
    if let Some(fault) = fault {
        return Err(fault);
    }

    progress::refresh(ctx, handle, &children)?;
    let failed = group
        .children
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| outcome.as_ref().is_some_and(Outcome::is_failed))
        .map(|(child, _)| child.id().clone())
        .collect();
    Ok(group_failure(group, failed))
}

fn child_handles(ctx: &SuiteContext, group: &JobGroup) -> Result<Vec<StatusHandle>, EngineError> {
    group
        .children
        .iter()
        .map(|c| ctx.status(c.id()).cloned().ok_or_else(|| EngineError::UnknownJob(c.id().clone())))
        .collect()
}

fn group_failure(group: &JobGroup, failed: Vec<JobId>) -> Option<FailureCause> {
    if failed.is_empty() {
        return None;
    }
    Some(FailureCause::Group(GroupFailure { group_id: group.id.clone(), failed, total: group.children.len() }))
}

/// Record the terminal state. A stop request turns a clean exit into
/// `Stopped`; a failure stays a failure.
fn finish(
    ctx: &SuiteContext,
    handle: &StatusHandle,
    failure: Option<FailureCause>,
) -> Result<Outcome, EngineError> {
    let now = ctx.now();
    let status = handle.update(|s| {
        let state = match (&failure, s.stop_requested) {
            (Some(cause), _) => {
                s.set_note(cause.to_string());
                JobState::Failed
            }
            (None, true) => JobState::Stopped,
            (None, false) => JobState::Completed,
        };
        s.finish(state, now);
        s.clone()
    });
    ctx.persist(handle)?;

    let outcome = match failure {
        Some(cause) => {
            tracing::warn!(job_id = %status.job_id, error = %cause, "job failed");
            ctx.emit_job(EventKind::JobFailed, status.clone());
            Outcome::Failed(ExecutionFailure { job_id: status.job_id, cause })
        }
        None if status.state == JobState::Stopped => {
            // JOB_STOPPED comes from the stop handler waiting on this job
            tracing::debug!(job_id = %status.job_id, "job exited after stop request");
            Outcome::Stopped
        }
        None => {
            tracing::info!(job_id = %status.job_id, "job completed");
            ctx.emit_job(EventKind::JobCompleted, status);
            Outcome::Completed
        }
    };
    Ok(outcome)
}

/// Mark `node` and its unfinished descendants stopped without running them.
fn skip_stopped(ctx: &SuiteContext, node: &JobNode) -> Result<(), EngineError> {
    if let Some(handle) = ctx.status(node.id()) {
        let now = ctx.now();
        let stopped = handle.update(|s| {
            if s.is_terminal() || s.is_running() {
                return None;
            }
            s.request_stop();
            s.finish(JobState::Stopped, now).then(|| s.clone())
        });
        if let Some(status) = stopped {
            ctx.store().archive(&status.job_id)?;
            ctx.persist(handle)?;
            ctx.emit_stopped(status);
        }
    }
    for child in node.children() {
        skip_stopped(ctx, child)?;
    }
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
