// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite configuration.
//!
//! Loaded from TOML with per-field defaults, then overridden by the
//! `JT_*` environment variables in [`crate::env`].

use crate::env;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_STOP_POLL_MS: u64 = 1_000;
const DEFAULT_STOP_WAIT_MS: u64 = 3_000;
const DEFAULT_PROGRESS_POLL_MS: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Root of all on-disk suite state (status records, index, sentinels).
    #[serde(default = "env::state_dir")]
    pub state_dir: PathBuf,
    /// How often the stop monitor checks for the sentinel.
    #[serde(default = "default_stop_poll_ms")]
    pub stop_poll_ms: u64,
    /// How often a stop handler re-checks whether its job has exited.
    #[serde(default = "default_stop_wait_ms")]
    pub stop_wait_ms: u64,
    /// How often a concurrent group recomputes its aggregate progress.
    #[serde(default = "default_progress_poll_ms")]
    pub progress_poll_ms: u64,
    /// Skip leaves whose persisted status is already completed.
    #[serde(default)]
    pub resume: bool,
}

fn default_stop_poll_ms() -> u64 {
    DEFAULT_STOP_POLL_MS
}

fn default_stop_wait_ms() -> u64 {
    DEFAULT_STOP_WAIT_MS
}

fn default_progress_poll_ms() -> u64 {
    DEFAULT_PROGRESS_POLL_MS
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            state_dir: env::state_dir(),
            stop_poll_ms: DEFAULT_STOP_POLL_MS,
            stop_wait_ms: DEFAULT_STOP_WAIT_MS,
            progress_poll_ms: DEFAULT_PROGRESS_POLL_MS,
            resume: false,
        }
    }
}

impl SuiteConfig {
    /// Defaults rooted at an explicit state directory.
    pub fn with_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        Self { state_dir: state_dir.into(), ..Self::default() }
    }

    /// Load from a TOML file, then apply environment overrides. A missing
    /// file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
            Self::parse(&contents, path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents)
            .map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }

    /// Environment variables take precedence over file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = env::state_dir_override() {
            self.state_dir = dir;
        }
        if let Some(d) = env::stop_poll() {
            self.stop_poll_ms = d.as_millis() as u64;
        }
        if let Some(d) = env::stop_wait() {
            self.stop_wait_ms = d.as_millis() as u64;
        }
        if let Some(d) = env::progress_poll() {
            self.progress_poll_ms = d.as_millis() as u64;
        }
        self
    }

    pub fn stop_poll(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms.max(1))
    }

    pub fn stop_wait(&self) -> Duration {
        Duration::from_millis(self.stop_wait_ms.max(1))
    }

    pub fn progress_poll(&self) -> Duration {
        Duration::from_millis(self.progress_poll_ms.max(1))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
