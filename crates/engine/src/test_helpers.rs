// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted jobs and context builders shared by the engine tests.

use crate::context::SuiteContext;
use crate::error::JobError;
use crate::job::{Job, JobContext, JobNode};
use async_trait::async_trait;
use jt_core::test_support::RecordingListener;
use jt_core::{EventKind, EventListener, JobId, JobTree, Listeners, SuiteConfig, SuiteEvent, SystemClock};
use jt_storage::{FileStatusStore, StatusStore};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    Succeed,
    Fail(&'static str),
    Panic(&'static str),
    /// Report half progress, then run until asked to stop.
    UntilStopped,
    /// Report half progress, sleep, then succeed.
    Sleep(Duration),
}

pub(crate) struct TestJob {
    id: JobId,
    behavior: Behavior,
    runs: AtomicUsize,
    stops: AtomicUsize,
    /// Stop calls that already saw the job's stop flag raised.
    flagged_stops: AtomicUsize,
}

impl TestJob {
    pub(crate) fn new(id: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: JobId::new(id),
            behavior,
            runs: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            flagged_stops: AtomicUsize::new(0),
        })
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn flagged_stops(&self) -> usize {
        self.flagged_stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Job for TestJob {
    fn id(&self) -> &JobId {
        &self.id
    }

    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(reason) => Err(JobError::failed(*reason)),
            Behavior::Panic(msg) => panic!("{msg}"),
            Behavior::UntilStopped => {
                ctx.set_progress(0.5)?;
                while !ctx.is_stop_requested() {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Ok(())
            }
            Behavior::Sleep(d) => {
                ctx.set_progress(0.5)?;
                tokio::time::sleep(*d).await;
                Ok(())
            }
        }
    }

    fn stop(&self, ctx: &JobContext) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if ctx.is_stop_requested() && ctx.suite().status(&self.id).is_some() {
            self.flagged_stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub(crate) fn leaf(job: &Arc<TestJob>) -> JobNode {
    JobNode::Leaf(Arc::clone(job) as Arc<dyn Job>)
}

/// Short intervals so polling tests finish quickly.
pub(crate) fn fast_config(state_dir: &Path) -> SuiteConfig {
    SuiteConfig {
        stop_poll_ms: 10,
        stop_wait_ms: 10,
        progress_poll_ms: 5,
        ..SuiteConfig::with_state_dir(state_dir)
    }
}

pub(crate) fn context_with(
    config: SuiteConfig,
    root: &JobNode,
    listener: &Arc<RecordingListener>,
) -> Arc<SuiteContext> {
    let listeners: Listeners = std::iter::once(Arc::clone(listener) as Arc<dyn EventListener>).collect();
    context_with_listeners(config, root, listeners)
}

pub(crate) fn context_with_listeners(config: SuiteConfig, root: &JobNode, listeners: Listeners) -> Arc<SuiteContext> {
    let tree = Arc::new(JobTree::from_descriptor(&root.descriptor()).unwrap());
    let store: Arc<dyn StatusStore> = Arc::new(FileStatusStore::for_suite(&config.state_dir, "suite"));
    Arc::new(SuiteContext::new(tree, store, listeners, config, Arc::new(SystemClock)).unwrap())
}

/// Listener that panics when the given job starts, killing the task
/// that runs it.
pub(crate) struct PanicOnStart(pub(crate) &'static str);

impl EventListener for PanicOnStart {
    fn on_event(&self, event: &SuiteEvent) {
        if event.kind == EventKind::JobStarted && event.status.as_ref().is_some_and(|s| s.job_id == self.0) {
            panic!("listener failed on {}", self.0);
        }
    }
}

pub(crate) fn context(state_dir: &Path, root: &JobNode, listener: &Arc<RecordingListener>) -> Arc<SuiteContext> {
    context_with(fast_config(state_dir), root, listener)
}

/// Poll `cond` until it holds or two seconds pass.
pub(crate) async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
