// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External stop requests.
//!
//! A stop is requested by creating a sentinel file ([`StopSignal::fire`]),
//! typically from another process. [`StopMonitor`] polls for it and, once
//! seen, cascades a cooperative stop over every job of the suite:
//!
//! ```text
//! Idle ──start_monitoring──▶ Monitoring ──sentinel seen──▶ Stopping ──cascade done──▶ Stopped
//!   ▲                            │
//!   └──────stop_monitoring───────┘
//! ```

use crate::context::SuiteContext;
use crate::error::StopSignalError;
use crate::job::{Job, JobContext};
use indexmap::IndexMap;
use jt_core::{EventKind, JobId, JobState};
use jt_storage::paths;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Sentinel file whose existence requests a stop of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSignal {
    path: PathBuf,
}

impl StopSignal {
    pub fn new(state_dir: &Path, namespace: &str) -> Self {
        Self { path: paths::stop_file(state_dir, namespace) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Request a stop. Firing twice is not an error.
    pub fn fire(&self) -> Result<(), StopSignalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io(source))?;
        }
        fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
            .map_err(|source| self.io(source))?;
        info!(path = %self.path.display(), "stop requested");
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the sentinel. Returns whether one was present.
    pub fn clear(&self) -> Result<bool, StopSignalError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io(source)),
        }
    }

    fn io(&self, source: io::Error) -> StopSignalError {
        StopSignalError::Io { path: self.path.clone(), source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Monitoring,
    Stopping,
    Stopped,
}

jt_core::str_enum! {
    MonitorState {
        Idle => "idle",
        Monitoring => "monitoring",
        Stopping => "stopping",
        Stopped => "stopped",
    }
}

struct Inner {
    ctx: Arc<SuiteContext>,
    jobs: IndexMap<JobId, Arc<dyn Job>>,
    signal: StopSignal,
    state: Mutex<MonitorState>,
    /// Cancels the current poller.
    poll_cancel: Mutex<CancellationToken>,
    /// Cancels everything, including stop handlers still waiting on jobs.
    shutdown: CancellationToken,
}

/// Watches a suite's stop sentinel and cascades stop requests.
///
/// Must be used from within a tokio runtime.
pub struct StopMonitor {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<Result<(), StopSignalError>>>>,
}

impl StopMonitor {
    pub fn new(ctx: Arc<SuiteContext>, jobs: IndexMap<JobId, Arc<dyn Job>>, signal: StopSignal) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                jobs,
                signal,
                state: Mutex::new(MonitorState::Idle),
                poll_cancel: Mutex::new(CancellationToken::new()),
                shutdown: CancellationToken::new(),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> MonitorState {
        *self.inner.state.lock()
    }

    pub fn signal(&self) -> &StopSignal {
        &self.inner.signal
    }

    /// Start the sentinel poller. Returns false unless the monitor was idle.
    pub fn start_monitoring(&self) -> bool {
        {
            let mut state = self.inner.state.lock();
            let current = *state;
            if current != MonitorState::Idle {
                warn!(state = %current, "stop monitor already started");
                return false;
            }
            *state = MonitorState::Monitoring;
        }
        let token = CancellationToken::new();
        *self.inner.poll_cancel.lock() = token.clone();
        let inner = Arc::clone(&self.inner);
        debug!(suite_id = %inner.ctx.suite_id(), sentinel = %inner.signal.path().display(), "stop monitoring started");
        *self.task.lock() = Some(tokio::spawn(poll(inner, token)));
        true
    }

    /// Halt the poller and remove any sentinel. A cascade already under
    /// way keeps running. Safe to call at any time, any number of times.
    pub fn stop_monitoring(&self) -> Result<(), StopSignalError> {
        self.inner.poll_cancel.lock().cancel();
        {
            let mut state = self.inner.state.lock();
            if *state == MonitorState::Monitoring {
                *state = MonitorState::Idle;
            }
        }
        self.inner.signal.clear()?;
        debug!(suite_id = %self.inner.ctx.suite_id(), "stop monitoring halted");
        Ok(())
    }

    /// Like [`StopMonitor::stop_monitoring`], and also abandon stop
    /// handlers still waiting for their jobs to exit.
    pub fn shutdown(&self) -> Result<(), StopSignalError> {
        self.inner.shutdown.cancel();
        self.stop_monitoring()
    }

    /// Wait for the poller and any cascade it started.
    pub async fn join(&self) -> Result<(), StopSignalError> {
        let task = self.task.lock().take();
        match task {
            Some(task) => task.await.map_err(|e| StopSignalError::Interrupted(e.to_string()))?,
            None => Ok(()),
        }
    }

    /// Run the stop handler of one job, as the cascade does.
    pub async fn stop_job(&self, job_id: &str) {
        stop_job(Arc::clone(&self.inner), JobId::new(job_id)).await;
    }
}

impl Drop for StopMonitor {
    fn drop(&mut self) {
        self.inner.poll_cancel.lock().cancel();
    }
}

async fn poll(inner: Arc<Inner>, token: CancellationToken) -> Result<(), StopSignalError> {
    let interval = inner.ctx.config().stop_poll();
    loop {
        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }
        if inner.signal.exists() {
            break;
        }
        trace!(sentinel = %inner.signal.path().display(), "no stop request");
    }

    {
        let mut state = inner.state.lock();
        if token.is_cancelled() || *state != MonitorState::Monitoring {
            return Ok(());
        }
        *state = MonitorState::Stopping;
    }
    info!(suite_id = %inner.ctx.suite_id(), "stop request received");

    let cleared = inner.signal.clear();
    if let Err(e) = &cleared {
        error!(error = %e, "failed to remove stop sentinel");
    }
    cascade(&inner).await;
    *inner.state.lock() = MonitorState::Stopped;
    cleared.map(|_| ())
}

/// `SUITE_STOPPING`, then `JOB_STOPPING` for every node in pre-order with
/// one stop handler per node running concurrently.
async fn cascade(inner: &Arc<Inner>) {
    let ctx = &inner.ctx;
    ctx.emit_suite(EventKind::SuiteStopping);

    let mut handlers = JoinSet::new();
    for id in ctx.tree().pre_order() {
        if let Some(handle) = ctx.status(id) {
            ctx.emit_job(EventKind::JobStopping, handle.snapshot());
        }
        handlers.spawn(stop_job(Arc::clone(inner), id.clone()));
    }
    while let Some(joined) = handlers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "stop handler ended abnormally");
        }
    }
    info!(suite_id = %ctx.suite_id(), "stop cascade finished");
}

async fn stop_job(inner: Arc<Inner>, job_id: JobId) {
    let ctx = &inner.ctx;
    let Some(handle) = ctx.status(&job_id).cloned() else {
        warn!(job_id = %job_id, "stop requested for unknown job");
        return;
    };
    let (flagged, running) = handle.update(|s| (s.request_stop(), s.is_running()));
    if !flagged {
        debug!(job_id = %job_id, "job already finished, nothing to stop");
        return;
    }
    // Pending jobs are persisted when the engine reaches and skips them.
    if running {
        if let Err(e) = ctx.persist(&handle) {
            warn!(job_id = %job_id, error = %e, "failed to persist stop request");
        }
    }
    if let Some(job) = inner.jobs.get(&job_id) {
        job.stop(&JobContext::new(handle.clone(), Arc::clone(&inner.ctx)));
    }

    let wait = ctx.config().stop_wait();
    while handle.is_running() {
        tokio::select! {
            _ = inner.shutdown.cancelled() => {
                debug!(job_id = %job_id, "stop handler abandoned");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }
    let status = handle.snapshot();
    if running && status.state == JobState::Stopped {
        ctx.emit_stopped(status);
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
