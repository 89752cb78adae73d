// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite index file.
//!
//! Written when a suite starts so that another process can rebuild the
//! tree and locate the status records without the job definitions.

use crate::paths;
use crate::store::StoreError;
use jt_core::{SuiteId, TreeDescriptor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteIndex {
    pub suite_id: SuiteId,
    pub status_dir: PathBuf,
    pub tree: TreeDescriptor,
}

impl SuiteIndex {
    pub fn new(suite_id: impl Into<SuiteId>, status_dir: impl Into<PathBuf>, tree: TreeDescriptor) -> Self {
        Self { suite_id: suite_id.into(), status_dir: status_dir.into(), tree }
    }

    /// Replace the index at `path` atomically.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
        let tmp = paths::tmp_file(path);
        fs::write(&tmp, json).map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        tracing::debug!(suite_id = %self.suite_id, path = %path.display(), "wrote suite index");
        Ok(())
    }

    /// Read the index at `path`. `Ok(None)` when there is none.
    pub fn read(path: &Path) -> Result<Option<Self>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
