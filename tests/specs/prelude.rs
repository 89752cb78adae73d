//! Shared helpers for the suite specs.

pub use jt_core::test_support::RecordingListener;
pub use jt_core::{EventKind, JobId, JobState, SuiteConfig};
pub use jt_engine::{Job, JobContext, JobError, JobNode, Outcome, StopSignal, Suite};
pub use jt_storage::{FileStatusStore, SessionFacade, StatusStore};
pub use std::sync::Arc;
pub use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Upper bound for polling waits in specs.
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Poll `cond` every few milliseconds until it holds or `max_ms` passes.
pub async fn wait_for(max_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(max_ms);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// A temporary state directory with fast polling intervals.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> SuiteConfig {
        SuiteConfig {
            stop_poll_ms: 10,
            stop_wait_ms: 10,
            progress_poll_ms: 5,
            ..SuiteConfig::with_state_dir(self.path())
        }
    }

    pub fn suite(&self, id: &str, root: JobNode, listener: &Arc<RecordingListener>) -> Suite {
        Suite::new(id, root).config(self.config()).listener(listener.clone())
    }

    pub fn store(&self, suite_id: &str) -> FileStatusStore {
        FileStatusStore::for_suite(self.path(), suite_id)
    }
}

/// How a [`StepJob`] ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Ending {
    Succeed,
    Fail(String),
    /// Keep working until a stop is requested.
    RunUntilStopped,
}

/// Job that advances its progress in steps and records every run.
pub struct StepJob {
    id: JobId,
    steps: u32,
    delay: Duration,
    ending: Mutex<Ending>,
    runs: AtomicUsize,
    stops: AtomicUsize,
}

impl StepJob {
    pub fn new(id: &str, ending: Ending) -> Arc<Self> {
        Arc::new(Self {
            id: JobId::new(id),
            steps: 4,
            delay: Duration::from_millis(2),
            ending: Mutex::new(ending),
            runs: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn ok(id: &str) -> Arc<Self> {
        Self::new(id, Ending::Succeed)
    }

    pub fn failing(id: &str, reason: &str) -> Arc<Self> {
        Self::new(id, Ending::Fail(reason.to_string()))
    }

    pub fn endless(id: &str) -> Arc<Self> {
        Self::new(id, Ending::RunUntilStopped)
    }

    /// Change how later runs end.
    pub fn set_ending(&self, ending: Ending) {
        *self.ending.lock() = ending;
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn node(self: &Arc<Self>) -> JobNode {
        JobNode::Leaf(Arc::clone(self) as Arc<dyn Job>)
    }
}

#[async_trait]
impl Job for StepJob {
    fn id(&self) -> &JobId {
        &self.id
    }

    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        ctx.set_note(format!("run {run}"))?;
        let ending = self.ending.lock().clone();

        for step in 1..=self.steps {
            if ctx.is_stop_requested() {
                return Ok(());
            }
            tokio::time::sleep(self.delay).await;
            let progress = f64::from(step) / f64::from(self.steps);
            // Leave the last step to completion for endless jobs
            if ending != Ending::RunUntilStopped || step < self.steps {
                ctx.set_progress(progress)?;
            }
        }

        match ending {
            Ending::Succeed => Ok(()),
            Ending::Fail(reason) => Err(JobError::failed(reason)),
            Ending::RunUntilStopped => {
                while !ctx.is_stop_requested() {
                    ctx.heartbeat()?;
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Ok(())
            }
        }
    }

    fn stop(&self, ctx: &JobContext) {
        if ctx.is_stop_requested() {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}
