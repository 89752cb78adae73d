// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: JT_STATE_DIR > XDG_STATE_HOME/jt > ~/.local/state/jt
///
/// Falls back to a relative `.jt` directory when no home is known.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("JT_STATE_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("jt");
        }
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/state/jt"),
        Err(_) => PathBuf::from(".jt"),
    }
}

/// Explicit state directory override, if set.
pub fn state_dir_override() -> Option<PathBuf> {
    std::env::var("JT_STATE_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Sentinel check interval override
pub fn stop_poll() -> Option<Duration> {
    millis("JT_STOP_POLL_MS")
}

/// Per-job stop liveness check interval override
pub fn stop_wait() -> Option<Duration> {
    millis("JT_STOP_WAIT_MS")
}

/// Concurrent group progress aggregation interval override
pub fn progress_poll() -> Option<Duration> {
    millis("JT_PROGRESS_POLL_MS")
}

fn millis(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
