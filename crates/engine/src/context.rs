// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared by the engine and the stop monitor for one suite run.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use jt_core::{
    EventKind, JobId, JobState, JobStatus, JobTree, Listeners, SharedClock, StatusHandle, SuiteConfig,
    SuiteEvent, SuiteId,
};
use jt_storage::{StatusStore, StoreError};
use std::sync::Arc;

pub struct SuiteContext {
    suite_id: SuiteId,
    tree: Arc<JobTree>,
    store: Arc<dyn StatusStore>,
    listeners: Listeners,
    config: SuiteConfig,
    clock: SharedClock,
    /// Live status of every node in the tree. Fixed at construction.
    statuses: IndexMap<JobId, StatusHandle>,
}

impl SuiteContext {
    /// Build the live status registry. With `config.resume`, nodes whose
    /// stored status is completed keep that status; every other node
    /// starts from an empty status.
    pub fn new(
        tree: Arc<JobTree>,
        store: Arc<dyn StatusStore>,
        listeners: Listeners,
        config: SuiteConfig,
        clock: SharedClock,
    ) -> Result<Self, StoreError> {
        let mut statuses = IndexMap::with_capacity(tree.len());
        for id in tree.ids() {
            let mut status = JobStatus::new(id.clone());
            if config.resume {
                let stored = store.read(id)?;
                if stored.state == JobState::Completed {
                    tracing::debug!(job_id = %id, "resuming: keeping completed status");
                    status = stored;
                }
            }
            statuses.insert(id.clone(), StatusHandle::new(status));
        }
        Ok(Self { suite_id: store.suite_id().clone(), tree, store, listeners, config, clock, statuses })
    }

    pub fn suite_id(&self) -> &SuiteId {
        &self.suite_id
    }

    pub fn tree(&self) -> &JobTree {
        &self.tree
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    pub fn status(&self, job_id: &str) -> Option<&StatusHandle> {
        self.statuses.get(job_id)
    }

    pub fn is_root(&self, job_id: &str) -> bool {
        self.tree.root_id() == job_id
    }

    /// Write the live status of `handle` while holding its lock, so the
    /// record on disk is never older than a concurrent writer's.
    pub fn persist(&self, handle: &StatusHandle) -> Result<(), StoreError> {
        handle.update(|s| self.store.write(s))
    }

    pub fn emit_suite(&self, kind: EventKind) {
        self.listeners.emit(SuiteEvent::suite(kind, &self.suite_id));
    }

    pub fn emit_job(&self, kind: EventKind, status: JobStatus) {
        self.listeners.emit(SuiteEvent::job(kind, &self.suite_id, status));
    }

    /// `JOB_STOPPED`, followed by `SUITE_STOPPED` when the job is the root.
    pub fn emit_stopped(&self, status: JobStatus) {
        let is_root = self.is_root(&status.job_id);
        tracing::info!(job_id = %status.job_id, "job stopped");
        self.emit_job(EventKind::JobStopped, status);
        if is_root {
            tracing::info!(suite_id = %self.suite_id, "suite stopped");
            self.emit_suite(EventKind::SuiteStopped);
        }
    }
}

impl std::fmt::Debug for SuiteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteContext")
            .field("suite_id", &self.suite_id)
            .field("jobs", &self.statuses.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}
