// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jt-engine: runs job trees and handles external stop requests

mod context;
mod engine;
mod error;
mod job;
mod progress;
mod stop;
mod suite;

#[cfg(test)]
mod test_helpers;

pub use context::SuiteContext;
pub use engine::{Engine, Outcome};
pub use error::{EngineError, ExecutionFailure, FailureCause, GroupFailure, JobError, StopSignalError};
pub use job::{FailurePolicy, GroupMode, Job, JobContext, JobGroup, JobNode};
pub use progress::{mean_progress, ProgressAggregator};
pub use stop::{MonitorState, StopMonitor, StopSignal};
pub use suite::Suite;
