// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job execution status and its shared, lockable handle.

use crate::id::JobId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle state of a job within one run.
///
/// Transitions are monotonic: `Idle → Running → {Completed | Failed}` or
/// `Running → Stopping → Stopped`. A job that was asked to stop before it
/// started goes straight from `Idle` to `Stopped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

crate::str_enum! {
    JobState {
        Idle => "IDLE",
        Running => "RUNNING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Stopping => "STOPPING",
        Stopped => "STOPPED",
    }
}

impl JobState {
    /// Completed, failed or stopped.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Stopped)
    }

    /// Running or on its way to stopping. Either way the job's own
    /// execution is still in flight.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Running | JobState::Stopping)
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Idle, Stopped)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Stopping)
                | (Running, Stopped)
                | (Stopping, Stopped)
                | (Stopping, Failed)
        )
    }
}

/// Frozen copy of a previous run of the same job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub state: JobState,
    pub progress: f64,
    pub note: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub stop_requested: bool,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Status of one job: the current run plus the history of prior attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub state: JobState,
    /// Always within `[0, 1]`; use [`JobStatus::set_progress`].
    pub progress: f64,
    pub note: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub stop_requested: bool,
    /// Job-defined metadata, in insertion order.
    #[serde(default)]
    pub metadata: IndexMap<String, Vec<String>>,
    /// Modification time of the persisted record, when read from a store.
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    /// Prior runs, oldest first. Attempt `n` is `attempts[n - 1]`.
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}

impl JobStatus {
    /// Empty status for a job that has not run yet.
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            state: JobState::Idle,
            progress: 0.0,
            note: None,
            start_time: None,
            end_time: None,
            stop_requested: false,
            metadata: IndexMap::new(),
            last_activity: None,
            attempts: Vec::new(),
        }
    }

    /// Clamp and store progress. NaN is treated as no progress.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = Some(note.into());
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.entry(key.into()).or_default().push(value.into());
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.metadata.insert(key.into(), values);
    }

    pub fn is_running(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// 1-based access to a prior attempt.
    pub fn attempt(&self, number: usize) -> Option<&AttemptRecord> {
        number.checked_sub(1).and_then(|i| self.attempts.get(i))
    }

    /// Whether this record describes a run that already started.
    pub fn has_run(&self) -> bool {
        self.start_time.is_some()
    }

    /// Apply a state transition. Invalid transitions are refused and
    /// leave the status untouched.
    pub fn transition(&mut self, next: JobState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                job_id = %self.job_id,
                from = %self.state,
                to = %next,
                "refusing invalid state transition"
            );
            return false;
        }
        self.state = next;
        true
    }

    /// Enter `Running`, resetting the fields of any previous run.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if !self.transition(JobState::Running) {
            return false;
        }
        self.start_time = Some(now);
        self.end_time = None;
        self.progress = 0.0;
        self.note = None;
        true
    }

    /// Enter a terminal state and record the end time in the same step.
    /// Completion forces progress to 1.
    pub fn finish(&mut self, state: JobState, now: DateTime<Utc>) -> bool {
        debug_assert!(state.is_terminal());
        if !self.transition(state) {
            return false;
        }
        self.end_time = Some(now);
        if state == JobState::Completed {
            self.progress = 1.0;
        }
        true
    }

    /// Flag the job for cooperative stop. A running job moves to
    /// `Stopping`. Returns false when the job is already terminal.
    pub fn request_stop(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.stop_requested = true;
        if self.state == JobState::Running {
            self.state = JobState::Stopping;
        }
        true
    }

    /// Derive a state from the persisted fields, for records that carry
    /// no explicit state.
    pub fn derive_state(&self) -> JobState {
        match (self.start_time, self.end_time) {
            (None, _) => JobState::Idle,
            (Some(_), None) if self.stop_requested => JobState::Stopping,
            (Some(_), None) => JobState::Running,
            (Some(_), Some(_)) if self.stop_requested => JobState::Stopped,
            (Some(_), Some(_)) if self.progress >= 1.0 => JobState::Completed,
            (Some(_), Some(_)) => JobState::Failed,
        }
    }

    /// Freeze the current run as an attempt record.
    pub fn to_attempt(&self) -> AttemptRecord {
        AttemptRecord {
            state: self.state,
            progress: self.progress,
            note: self.note.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            stop_requested: self.stop_requested,
            last_activity: self.last_activity,
        }
    }
}

/// Shared handle to the live status of one job.
///
/// Every reader and writer goes through the same mutex, so fields that
/// change together (state plus end time, stop flag plus `Stopping`) are
/// observed together.
#[derive(Debug, Clone)]
pub struct StatusHandle(Arc<Mutex<JobStatus>>);

impl StatusHandle {
    pub fn new(status: JobStatus) -> Self {
        Self(Arc::new(Mutex::new(status)))
    }

    pub fn job_id(&self) -> JobId {
        self.0.lock().job_id.clone()
    }

    /// Copy of the current status.
    pub fn snapshot(&self) -> JobStatus {
        self.0.lock().clone()
    }

    /// Run `f` inside the status critical section.
    pub fn update<R>(&self, f: impl FnOnce(&mut JobStatus) -> R) -> R {
        f(&mut self.0.lock())
    }

    pub fn state(&self) -> JobState {
        self.0.lock().state
    }

    pub fn progress(&self) -> f64 {
        self.0.lock().progress
    }

    pub fn set_progress(&self, progress: f64) {
        self.0.lock().set_progress(progress);
    }

    pub fn set_note(&self, note: impl Into<String>) {
        self.0.lock().set_note(note);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.lock().stop_requested
    }

    pub fn request_stop(&self) -> bool {
        self.0.lock().request_stop()
    }

    pub fn is_running(&self) -> bool {
        self.0.lock().is_running()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
