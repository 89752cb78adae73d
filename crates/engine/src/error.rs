// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! [`ExecutionFailure`] is an ordinary, recorded outcome of one job or
//! group. [`EngineError`] is a framework fault that aborts the suite run.

use jt_core::{JobId, TreeError};
use jt_storage::StoreError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Returned by [`crate::Job::execute`] to signal failure.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Failed(String),
    #[error("status store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl JobError {
    pub fn failed(reason: impl Into<String>) -> Self {
        JobError::Failed(reason.into())
    }
}

/// Failed children of a group, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    pub group_id: JobId,
    pub failed: Vec<JobId>,
    pub total: usize,
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} jobs failed in group {}: ", self.failed.len(), self.total, self.group_id)?;
        for (i, id) in self.failed.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The job returned an error.
    Job(String),
    /// The job panicked.
    Panicked(String),
    /// One or more children of a group failed.
    Group(GroupFailure),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Job(reason) => f.write_str(reason),
            FailureCause::Panicked(msg) => write!(f, "panicked: {msg}"),
            FailureCause::Group(g) => g.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {job_id} failed: {cause}")]
pub struct ExecutionFailure {
    pub job_id: JobId,
    pub cause: FailureCause,
}

/// Fault in the engine itself. Aborts the suite run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("join interrupted in group {group_id}: {reason}")]
    JoinInterrupted { group_id: JobId, reason: String },
    #[error("job {0} is not part of the suite tree")]
    UnknownJob(JobId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Failure of the stop-signal bookkeeping. Never affects job state.
#[derive(Debug, Error)]
pub enum StopSignalError {
    #[error("stop sentinel I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stop monitor task ended abnormally: {0}")]
    Interrupted(String),
}
