// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite lifecycle events and the listeners that receive them.

use crate::id::SuiteId;
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SuiteStarted,
    SuiteCompleted,
    SuiteAborted,
    SuiteStopping,
    SuiteStopped,
    JobStarted,
    JobCompleted,
    JobFailed,
    JobStopping,
    JobStopped,
}

crate::str_enum! {
    EventKind {
        SuiteStarted => "SUITE_STARTED",
        SuiteCompleted => "SUITE_COMPLETED",
        SuiteAborted => "SUITE_ABORTED",
        SuiteStopping => "SUITE_STOPPING",
        SuiteStopped => "SUITE_STOPPED",
        JobStarted => "JOB_STARTED",
        JobCompleted => "JOB_COMPLETED",
        JobFailed => "JOB_FAILED",
        JobStopping => "JOB_STOPPING",
        JobStopped => "JOB_STOPPED",
    }
}

impl EventKind {
    pub fn is_suite_event(self) -> bool {
        matches!(
            self,
            EventKind::SuiteStarted
                | EventKind::SuiteCompleted
                | EventKind::SuiteAborted
                | EventKind::SuiteStopping
                | EventKind::SuiteStopped
        )
    }
}

/// A lifecycle event. Job events carry a snapshot of the job's status at
/// the time of emission; suite events carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteEvent {
    pub kind: EventKind,
    pub suite_id: SuiteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl SuiteEvent {
    pub fn suite(kind: EventKind, suite_id: &SuiteId) -> Self {
        Self { kind, suite_id: suite_id.clone(), status: None }
    }

    pub fn job(kind: EventKind, suite_id: &SuiteId, status: JobStatus) -> Self {
        Self { kind, suite_id: suite_id.clone(), status: Some(status) }
    }
}

impl fmt::Display for SuiteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Some(status) => write!(f, "{} suite={} job={}", self.kind, self.suite_id, status.job_id),
            None => write!(f, "{} suite={}", self.kind, self.suite_id),
        }
    }
}

/// Receives lifecycle events. Called synchronously from whichever task
/// emits the event, so implementations should return quickly.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &SuiteEvent);
}

/// The listeners registered on one suite.
#[derive(Clone, Default)]
pub struct Listeners(Vec<Arc<dyn EventListener>>);

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: Arc<dyn EventListener>) {
        self.0.push(listener);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn emit(&self, event: SuiteEvent) {
        tracing::debug!(event = %event, "emitting lifecycle event");
        for listener in &self.0 {
            listener.on_event(&event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.0.len()).finish()
    }
}

impl FromIterator<Arc<dyn EventListener>> for Listeners {
    fn from_iter<I: IntoIterator<Item = Arc<dyn EventListener>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
