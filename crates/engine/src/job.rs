// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs and the tree of leaves and groups the engine runs.

use crate::context::SuiteContext;
use crate::error::JobError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use jt_core::{JobId, StatusHandle, TreeDescriptor};
use jt_storage::{StatusStore, StoreError};
use std::sync::Arc;

/// A unit of work.
///
/// Both calls receive a [`JobContext`] carrying the job's live status and
/// the suite it runs in. Stopping is cooperative: [`Job::stop`] is only a
/// hint, and a job that wants to honour it must check
/// [`JobContext::is_stop_requested`] and return from `execute` on its own.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn id(&self) -> &JobId;

    async fn execute(&self, ctx: JobContext) -> Result<(), JobError>;

    /// Advisory stop request, called from the stop cascade after the
    /// job's stop flag is set.
    fn stop(&self, _ctx: &JobContext) {}
}

/// What a job sees of its own status and of the suite around it.
#[derive(Clone)]
pub struct JobContext {
    status: StatusHandle,
    suite: Arc<SuiteContext>,
}

impl JobContext {
    pub(crate) fn new(status: StatusHandle, suite: Arc<SuiteContext>) -> Self {
        Self { status, suite }
    }

    pub fn job_id(&self) -> JobId {
        self.status.job_id()
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    /// The running suite: tree, config and the live status of every job.
    pub fn suite(&self) -> &SuiteContext {
        &self.suite
    }

    pub fn is_stop_requested(&self) -> bool {
        self.status.is_stop_requested()
    }

    /// Record progress in `[0, 1]` and persist it.
    pub fn set_progress(&self, progress: f64) -> Result<(), StoreError> {
        self.status.update(|s| {
            s.set_progress(progress);
            self.store().write(s)
        })
    }

    pub fn set_note(&self, note: impl Into<String>) -> Result<(), StoreError> {
        self.status.update(|s| {
            s.set_note(note);
            self.store().write(s)
        })
    }

    pub fn add_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Result<(), StoreError> {
        self.status.update(|s| {
            s.add_metadata(key, value);
            self.store().write(s)
        })
    }

    /// Liveness heartbeat: bumps the record's modification time.
    pub fn heartbeat(&self) -> Result<DateTime<Utc>, StoreError> {
        self.store().touch(self.status.job_id().as_str())
    }

    fn store(&self) -> &Arc<dyn StatusStore> {
        self.suite.store()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Run the remaining children after a failure.
    #[default]
    Continue,
    /// Leave the remaining children unstarted after a failure.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    Sequential { on_failure: FailurePolicy },
    Concurrent,
}

/// A composite of ordered children.
pub struct JobGroup {
    pub id: JobId,
    pub mode: GroupMode,
    pub children: Vec<JobNode>,
}

/// Node of a job tree: a leaf job or a group. Cheap to clone.
#[derive(Clone)]
pub enum JobNode {
    Leaf(Arc<dyn Job>),
    Group(Arc<JobGroup>),
}

impl JobNode {
    pub fn leaf(job: impl Job) -> Self {
        JobNode::Leaf(Arc::new(job))
    }

    pub fn sequential(id: impl Into<JobId>, children: Vec<JobNode>) -> Self {
        Self::group(id, GroupMode::Sequential { on_failure: FailurePolicy::Continue }, children)
    }

    pub fn sequential_with(id: impl Into<JobId>, on_failure: FailurePolicy, children: Vec<JobNode>) -> Self {
        Self::group(id, GroupMode::Sequential { on_failure }, children)
    }

    pub fn concurrent(id: impl Into<JobId>, children: Vec<JobNode>) -> Self {
        Self::group(id, GroupMode::Concurrent, children)
    }

    fn group(id: impl Into<JobId>, mode: GroupMode, children: Vec<JobNode>) -> Self {
        JobNode::Group(Arc::new(JobGroup { id: id.into(), mode, children }))
    }

    pub fn id(&self) -> &JobId {
        match self {
            JobNode::Leaf(job) => job.id(),
            JobNode::Group(group) => &group.id,
        }
    }

    pub fn children(&self) -> &[JobNode] {
        match self {
            JobNode::Leaf(_) => &[],
            JobNode::Group(group) => &group.children,
        }
    }

    /// Shape of this subtree, for indexing and the suite index file.
    pub fn descriptor(&self) -> TreeDescriptor {
        TreeDescriptor::group(self.id().clone(), self.children().iter().map(JobNode::descriptor).collect())
    }

    /// Leaf jobs of this subtree by id, in pre-order.
    pub fn jobs(&self) -> IndexMap<JobId, Arc<dyn Job>> {
        let mut out = IndexMap::new();
        self.collect_jobs(&mut out);
        out
    }

    fn collect_jobs(&self, out: &mut IndexMap<JobId, Arc<dyn Job>>) {
        match self {
            JobNode::Leaf(job) => {
                out.insert(job.id().clone(), Arc::clone(job));
            }
            JobNode::Group(group) => {
                for child in &group.children {
                    child.collect_jobs(out);
                }
            }
        }
    }
}

impl std::fmt::Debug for JobNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobNode::Leaf(job) => f.debug_tuple("Leaf").field(job.id()).finish(),
            JobNode::Group(group) => f
                .debug_struct("Group")
                .field("id", &group.id)
                .field("mode", &group.mode)
                .field("children", &group.children)
                .finish(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
