// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of suite state.
//!
//! Every path the store, the facade and the stop monitor touch is built
//! here, so the layout can change without touching those components.
//!
//! ```text
//! <state_dir>/<suite>/status/<job>.job        current record
//! <state_dir>/<suite>/status/<job>.job.<n>    attempt n (1-based)
//! <state_dir>/<suite>/suite.index             suite index (JSON)
//! <state_dir>/latest/<namespace>.stop         stop sentinel
//! ```
//!
//! Ids are passed through [`safe_name`] before they become path segments.

use std::path::{Path, PathBuf};

const STATUS_SUBDIR: &str = "status";
const STOP_SUBDIR: &str = "latest";
const JOB_EXT: &str = "job";

/// Encode an id as a single, portable path segment.
///
/// ASCII alphanumerics and `-` pass through. Every other byte of the
/// UTF-8 encoding becomes `_` followed by two lowercase hex digits, so
/// the result never contains separators, dots or `..`, and
/// [`from_safe_name`] can reverse it.
pub fn safe_name(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push('_');
            out.push_str(&format!("{byte:02x}"));
        }
    }
    out
}

/// Reverse of [`safe_name`]. Returns `None` for names it could not have produced.
pub fn from_safe_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// `<state_dir>/<suite>`
pub fn suite_dir(state_dir: &Path, suite_id: &str) -> PathBuf {
    state_dir.join(safe_name(suite_id))
}

/// `<state_dir>/<suite>/status`
pub fn status_dir(state_dir: &Path, suite_id: &str) -> PathBuf {
    suite_dir(state_dir, suite_id).join(STATUS_SUBDIR)
}

/// `<status_dir>/<job>.job`
pub fn job_file(status_dir: &Path, job_id: &str) -> PathBuf {
    status_dir.join(format!("{}.{JOB_EXT}", safe_name(job_id)))
}

/// `<status_dir>/<job>.job.<attempt>`
pub fn attempt_file(status_dir: &Path, job_id: &str, attempt: usize) -> PathBuf {
    status_dir.join(format!("{}.{JOB_EXT}.{attempt}", safe_name(job_id)))
}

/// Scratch file for atomic replacement of `target`.
pub fn tmp_file(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// `<state_dir>/<suite>/suite.index`
pub fn index_file(state_dir: &Path, suite_id: &str) -> PathBuf {
    suite_dir(state_dir, suite_id).join("suite.index")
}

/// `<state_dir>/latest/<namespace>.stop`
pub fn stop_file(state_dir: &Path, namespace: &str) -> PathBuf {
    state_dir.join(STOP_SUBDIR).join(format!("{}.stop", safe_name(namespace)))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
