// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-job status records.
//!
//! [`FileStatusStore`] keeps one record file per job plus numbered
//! attempt files for previous runs (see [`crate::paths`]). Writes go to a
//! scratch file first and are moved into place, so readers never observe
//! a half-written record.

use crate::paths;
use crate::record::{self, Record, RecordError};
use chrono::{DateTime, SecondsFormat, Utc};
use jt_core::{AttemptRecord, JobState, JobStatus, SuiteId, TreeError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

const KEY_JOB_ID: &str = "jobId";
const KEY_STATE: &str = "state";
const KEY_PROGRESS: &str = "progress";
const KEY_NOTE: &str = "note";
const KEY_START: &str = "startTime";
const KEY_END: &str = "endTime";
const KEY_STOP: &str = "stopRequested";
const METADATA_PREFIX: char = '.';

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("status I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed status record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
    #[error("backup target already exists: {0}")]
    BackupExists(PathBuf),
    #[error("suite index error: {0}")]
    Index(#[from] serde_json::Error),
    #[error("suite index describes an invalid tree: {0}")]
    Tree(#[from] TreeError),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// Persistence of job statuses for one suite.
pub trait StatusStore: Send + Sync {
    fn suite_id(&self) -> &SuiteId;

    /// Current status plus attempt history. A job that never wrote a
    /// record reads back as an idle status with no progress.
    fn read(&self, job_id: &str) -> Result<JobStatus, StoreError>;

    /// Replace the current record of `status.job_id`.
    fn write(&self, status: &JobStatus) -> Result<(), StoreError>;

    /// Bump the record's modification time without changing its content.
    fn touch(&self, job_id: &str) -> Result<DateTime<Utc>, StoreError>;

    /// Move the current record to the next free attempt number if it
    /// describes a previous run. Returns the attempt number used.
    fn archive(&self, job_id: &str) -> Result<Option<usize>, StoreError>;

    /// Move all of the suite's records to `target`, which must not exist.
    fn backup(&self, target: &Path) -> Result<(), StoreError>;

    /// Remove all of the suite's records.
    fn delete(&self) -> Result<(), StoreError>;
}

/// File-per-job status store.
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    suite_id: SuiteId,
    status_dir: PathBuf,
}

impl FileStatusStore {
    pub fn new(suite_id: impl Into<SuiteId>, status_dir: impl Into<PathBuf>) -> Self {
        Self { suite_id: suite_id.into(), status_dir: status_dir.into() }
    }

    /// Store at the standard location under `state_dir`.
    pub fn for_suite(state_dir: &Path, suite_id: impl Into<SuiteId>) -> Self {
        let suite_id = suite_id.into();
        let status_dir = paths::status_dir(state_dir, &suite_id);
        Self { suite_id, status_dir }
    }

    pub fn status_dir(&self) -> &Path {
        &self.status_dir
    }

    fn job_file(&self, job_id: &str) -> PathBuf {
        paths::job_file(&self.status_dir, job_id)
    }

    fn attempt_file(&self, job_id: &str, attempt: usize) -> PathBuf {
        paths::attempt_file(&self.status_dir, job_id, attempt)
    }

    fn read_attempts(&self, job_id: &str) -> Result<Vec<AttemptRecord>, StoreError> {
        let mut attempts = Vec::new();
        let mut n = 1;
        loop {
            let path = self.attempt_file(job_id, n);
            if !path.exists() {
                break;
            }
            let mut status = JobStatus::new(job_id);
            read_into(&mut status, &path)?;
            attempts.push(status.to_attempt());
            n += 1;
        }
        Ok(attempts)
    }

    fn next_attempt_number(&self, job_id: &str) -> usize {
        let mut n = 1;
        while self.attempt_file(job_id, n).exists() {
            n += 1;
        }
        n
    }
}

impl StatusStore for FileStatusStore {
    fn suite_id(&self) -> &SuiteId {
        &self.suite_id
    }

    fn read(&self, job_id: &str) -> Result<JobStatus, StoreError> {
        let mut status = JobStatus::new(job_id);
        status.attempts = self.read_attempts(job_id)?;
        read_into(&mut status, &self.job_file(job_id))?;
        Ok(status)
    }

    fn write(&self, status: &JobStatus) -> Result<(), StoreError> {
        let path = self.job_file(&status.job_id);
        let tmp = paths::tmp_file(&path);
        tracing::trace!(job_id = %status.job_id, path = %path.display(), "writing status record");

        let text = record::encode(&to_record(status));
        fs::create_dir_all(&self.status_dir).map_err(|e| StoreError::io(&self.status_dir, e))?;
        fs::write(&tmp, text.as_bytes()).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))
    }

    fn touch(&self, job_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let path = self.job_file(job_id);
        fs::create_dir_all(&self.status_dir).map_err(|e| StoreError::io(&self.status_dir, e))?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        let now = SystemTime::now();
        file.set_modified(now).map_err(|e| StoreError::io(&path, e))?;
        Ok(DateTime::<Utc>::from(now))
    }

    fn archive(&self, job_id: &str) -> Result<Option<usize>, StoreError> {
        let path = self.job_file(job_id);
        let mut current = JobStatus::new(job_id);
        read_into(&mut current, &path)?;
        if !current.has_run() {
            return Ok(None);
        }
        let n = self.next_attempt_number(job_id);
        let target = self.attempt_file(job_id, n);
        fs::rename(&path, &target).map_err(|e| StoreError::io(&target, e))?;
        tracing::debug!(job_id, attempt = n, "archived previous run");
        Ok(Some(n))
    }

    fn backup(&self, target: &Path) -> Result<(), StoreError> {
        if target.exists() {
            tracing::error!(target = %target.display(), "backup directory already exists");
            return Err(StoreError::BackupExists(target.to_path_buf()));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        tracing::debug!(from = %self.status_dir.display(), to = %target.display(), "moving status directory");
        fs::rename(&self.status_dir, target).map_err(|e| StoreError::io(&self.status_dir, e))
    }

    fn delete(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.status_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.status_dir, e)),
        }
    }
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn to_record(status: &JobStatus) -> Record {
    let mut r = Record::new();
    r.insert(KEY_JOB_ID.into(), status.job_id.to_string());
    r.insert(KEY_STATE.into(), status.state.to_string());
    r.insert(KEY_PROGRESS.into(), status.progress.to_string());
    if let Some(note) = &status.note {
        r.insert(KEY_NOTE.into(), note.clone());
    }
    if let Some(t) = &status.start_time {
        r.insert(KEY_START.into(), format_time(t));
    }
    if let Some(t) = &status.end_time {
        r.insert(KEY_END.into(), format_time(t));
    }
    if status.stop_requested {
        r.insert(KEY_STOP.into(), "true".into());
    }
    for (key, values) in &status.metadata {
        // Vec<String> always serializes
        let json = serde_json::to_string(values).unwrap_or_default();
        r.insert(format!("{METADATA_PREFIX}{key}"), json);
    }
    r
}

/// Fill `status` from the record at `path`. A missing or empty file
/// leaves the defaults in place.
fn read_into(status: &mut JobStatus, path: &Path) -> Result<(), StoreError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let last_activity = meta.modified().ok().map(DateTime::<Utc>::from);
    status.last_activity = last_activity;
    if meta.len() == 0 {
        return Ok(());
    }
    tracing::debug!(path = %path.display(), "reading status record");

    let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let r = record::decode(&text)
        .map_err(|source| StoreError::Malformed { path: path.to_path_buf(), source })?;
    apply_record(status, &r).map_err(|source| StoreError::Malformed { path: path.to_path_buf(), source })
}

fn apply_record(status: &mut JobStatus, r: &Record) -> Result<(), RecordError> {
    if let Some(v) = r.get(KEY_PROGRESS) {
        status.set_progress(v.parse::<f64>().map_err(|_| invalid(KEY_PROGRESS, v))?);
    }
    status.note = r.get(KEY_NOTE).cloned();
    status.start_time = r.get(KEY_START).map(|v| parse_time(KEY_START, v)).transpose()?;
    status.end_time = r.get(KEY_END).map(|v| parse_time(KEY_END, v)).transpose()?;
    status.stop_requested = match r.get(KEY_STOP).map(String::as_str) {
        None | Some("false") => false,
        Some("true") => true,
        Some(v) => return Err(invalid(KEY_STOP, v)),
    };
    for (key, value) in r {
        if let Some(name) = key.strip_prefix(METADATA_PREFIX) {
            let values: Vec<String> =
                serde_json::from_str(value).map_err(|_| invalid(key, value))?;
            status.metadata.insert(name.to_string(), values);
        }
    }
    status.state = match r.get(KEY_STATE) {
        Some(v) => v.parse::<JobState>().map_err(|_| invalid(KEY_STATE, v))?,
        None => status.derive_state(),
    };
    if let Some(id) = r.get(KEY_JOB_ID) {
        if id != status.job_id.as_str() {
            tracing::warn!(expected = %status.job_id, found = %id, "status record names another job");
        }
    }
    Ok(())
}

fn parse_time(key: &str, v: &str) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(v).map(|t| t.with_timezone(&Utc)).map_err(|_| invalid(key, v))
}

fn invalid(key: &str, value: &str) -> RecordError {
    RecordError::InvalidValue { key: key.to_string(), value: value.to_string() }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
