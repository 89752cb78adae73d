// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only view of a suite: tree topology overlaid with stored status.
//!
//! Every session returned here is read from the store at call time.
//! Nothing is cached, since statuses change underneath a long-running
//! suite and may be written by another process.

use crate::index::SuiteIndex;
use crate::store::{FileStatusStore, StatusStore, StoreError};
use jt_core::{JobId, JobStatus, JobTree, SuiteId};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionFacade {
    suite_id: SuiteId,
    tree: Arc<JobTree>,
    store: Arc<dyn StatusStore>,
}

impl SessionFacade {
    pub fn new(suite_id: impl Into<SuiteId>, tree: Arc<JobTree>, store: Arc<dyn StatusStore>) -> Self {
        Self { suite_id: suite_id.into(), tree, store }
    }

    /// Rebuild a facade from a suite index written by a running or
    /// finished suite. `Ok(None)` when no index exists at `index_path`.
    pub fn open(index_path: &Path) -> Result<Option<Self>, StoreError> {
        let Some(index) = SuiteIndex::read(index_path)? else {
            return Ok(None);
        };
        let tree = JobTree::from_descriptor(&index.tree)?;
        let store = FileStatusStore::new(index.suite_id.clone(), index.status_dir);
        Ok(Some(Self::new(index.suite_id, Arc::new(tree), Arc::new(store))))
    }

    pub fn suite_id(&self) -> &SuiteId {
        &self.suite_id
    }

    pub fn tree(&self) -> &JobTree {
        &self.tree
    }

    pub fn root_id(&self) -> &JobId {
        self.tree.root_id()
    }

    /// Fresh status of `job_id`, or `None` when the id is not in the tree.
    pub fn session(&self, job_id: &str) -> Result<Option<JobStatus>, StoreError> {
        if !self.tree.contains(job_id) {
            return Ok(None);
        }
        self.store.read(job_id).map(Some)
    }

    pub fn root_session(&self) -> Result<JobStatus, StoreError> {
        self.store.read(self.tree.root_id())
    }

    pub fn child_ids(&self, job_id: &str) -> &[JobId] {
        self.tree.child_ids(job_id)
    }

    pub fn children(&self, job_id: &str) -> Result<Vec<JobStatus>, StoreError> {
        self.read_all(self.tree.child_ids(job_id))
    }

    pub fn parent_id(&self, job_id: &str) -> Option<&JobId> {
        self.tree.parent_id(job_id)
    }

    pub fn parent(&self, job_id: &str) -> Result<Option<JobStatus>, StoreError> {
        self.tree.parent_id(job_id).map(|id| self.store.read(id)).transpose()
    }

    /// All ids in discovery order.
    pub fn all_ids(&self) -> Vec<JobId> {
        self.tree.ids().cloned().collect()
    }

    pub fn all_sessions(&self) -> Result<Vec<JobStatus>, StoreError> {
        self.tree.ids().map(|id| self.store.read(id)).collect()
    }

    /// Call `visitor` with every node's fresh status, pre-order from the root.
    pub fn visit(&self, mut visitor: impl FnMut(&JobStatus)) -> Result<(), StoreError> {
        for id in self.tree.pre_order() {
            let status = self.store.read(id)?;
            visitor(&status);
        }
        Ok(())
    }

    fn read_all(&self, ids: &[JobId]) -> Result<Vec<JobStatus>, StoreError> {
        ids.iter().map(|id| self.store.read(id)).collect()
    }
}

impl fmt::Debug for SessionFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFacade")
            .field("suite_id", &self.suite_id)
            .field("jobs", &self.tree.len())
            .finish()
    }
}

impl fmt::Display for SessionFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tree.render())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
