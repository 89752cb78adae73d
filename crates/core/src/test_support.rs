// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{EventKind, EventListener, SuiteEvent};
use crate::status::{JobState, JobStatus};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core status types.
pub mod strategies {
    use crate::status::JobState;
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::Idle),
            Just(JobState::Running),
            Just(JobState::Completed),
            Just(JobState::Failed),
            Just(JobState::Stopping),
            Just(JobState::Stopped),
        ]
    }
}

// ── Status factories ────────────────────────────────────────────────────

/// Whole-second UTC timestamp.
pub fn utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// A status that ran from `start` to `end` and finished in `state`.
pub fn finished_status(job_id: &str, state: JobState, start: i64, end: i64) -> JobStatus {
    let mut status = JobStatus::new(job_id);
    status.start(utc(start));
    if state == JobState::Stopped {
        status.request_stop();
    }
    status.finish(state, utc(end));
    status
}

// ── Listeners ───────────────────────────────────────────────────────────

/// Listener that keeps every event it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<SuiteEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SuiteEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    /// Job ids carried by events of `kind`, in emission order.
    pub fn jobs_for(&self, kind: EventKind) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| e.status.as_ref().map(|s| s.job_id.to_string()))
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &SuiteEvent) {
        self.events.lock().push(event.clone());
    }
}
