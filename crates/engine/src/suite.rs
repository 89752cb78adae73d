// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite driver: one full run of a job tree under a namespace.

use crate::context::SuiteContext;
use crate::engine::{Engine, Outcome};
use crate::error::EngineError;
use crate::job::JobNode;
use crate::stop::{StopMonitor, StopSignal};
use jt_core::{EventKind, EventListener, JobTree, Listeners, SharedClock, SuiteConfig, SuiteId, SystemClock};
use jt_storage::{paths, FileStatusStore, SessionFacade, StatusStore, StoreError, SuiteIndex};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Suite {
    id: SuiteId,
    root: JobNode,
    config: SuiteConfig,
    namespace: Option<String>,
    listeners: Listeners,
    clock: SharedClock,
}

impl Suite {
    pub fn new(id: impl Into<SuiteId>, root: JobNode) -> Self {
        Self {
            id: id.into(),
            root,
            config: SuiteConfig::default(),
            namespace: None,
            listeners: Listeners::new(),
            clock: Arc::new(SystemClock),
        }
    }

    jt_core::setters! {
        set { config: SuiteConfig, clock: SharedClock }
        option { namespace: String }
    }

    pub fn listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn id(&self) -> &SuiteId {
        &self.id
    }

    pub fn root(&self) -> &JobNode {
        &self.root
    }

    /// Stop namespace; the suite id unless set explicitly.
    pub fn namespace_or_id(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.id)
    }

    pub fn store(&self) -> FileStatusStore {
        FileStatusStore::for_suite(&self.config.state_dir, self.id.clone())
    }

    pub fn index_path(&self) -> PathBuf {
        paths::index_file(&self.config.state_dir, &self.id)
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal::new(&self.config.state_dir, self.namespace_or_id())
    }

    /// Read-only view of this suite's tree and stored statuses.
    pub fn facade(&self) -> Result<SessionFacade, EngineError> {
        let tree = JobTree::from_descriptor(&self.root.descriptor())?;
        Ok(SessionFacade::new(self.id.clone(), Arc::new(tree), Arc::new(self.store())))
    }

    /// Run the whole tree with stop monitoring active.
    ///
    /// Job failures are reported through the returned [`Outcome`] and the
    /// stored statuses. An `Err` is a framework fault; the run was
    /// aborted and `SUITE_ABORTED` was emitted.
    pub async fn run(&self) -> Result<Outcome, EngineError> {
        let descriptor = self.root.descriptor();
        let tree = Arc::new(JobTree::from_descriptor(&descriptor)?);
        let store = self.store();
        SuiteIndex::new(self.id.clone(), store.status_dir(), descriptor).write(&self.index_path())?;

        let store: Arc<dyn StatusStore> = Arc::new(store);
        let ctx = Arc::new(SuiteContext::new(
            Arc::clone(&tree),
            store,
            self.listeners.clone(),
            self.config.clone(),
            Arc::clone(&self.clock),
        )?);

        let monitor = StopMonitor::new(Arc::clone(&ctx), self.root.jobs(), self.stop_signal());
        match monitor.signal().clear() {
            Ok(true) => tracing::warn!(suite_id = %self.id, "removed stale stop request"),
            Ok(false) => {}
            Err(e) => tracing::warn!(suite_id = %self.id, error = %e, "failed to remove stale stop request"),
        }

        tracing::info!(suite_id = %self.id, jobs = tree.len(), "suite started");
        ctx.emit_suite(EventKind::SuiteStarted);
        monitor.start_monitoring();

        let result = Engine::new(Arc::clone(&ctx)).run(&self.root).await;

        let halted = if result.is_ok() { monitor.stop_monitoring() } else { monitor.shutdown() };
        if let Err(e) = halted {
            tracing::warn!(suite_id = %self.id, error = %e, "failed to halt stop monitoring");
        }
        if let Err(e) = monitor.join().await {
            tracing::warn!(suite_id = %self.id, error = %e, "stop monitor failed");
        }

        match result {
            Ok(outcome) => {
                tracing::info!(suite_id = %self.id, state = %outcome.state(), "suite finished");
                if outcome != Outcome::Stopped {
                    ctx.emit_suite(EventKind::SuiteCompleted);
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(suite_id = %self.id, error = %e, "suite aborted");
                ctx.emit_suite(EventKind::SuiteAborted);
                Err(e)
            }
        }
    }

    /// Move this suite's status records to `target`, which must not exist.
    pub fn backup_status(&self, target: &Path) -> Result<(), StoreError> {
        self.store().backup(target)
    }

    pub fn delete_status(&self) -> Result<(), StoreError> {
        self.store().delete()
    }
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("config", &self.config)
            .field("namespace", &self.namespace_or_id())
            .finish()
    }
}

#[cfg(test)]
#[path = "suite_tests.rs"]
mod tests;
