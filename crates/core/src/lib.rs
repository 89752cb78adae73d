// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jt-core: data types shared by the jobtree store and engine

pub mod macros;

pub mod clock;
pub mod config;
pub mod env;
pub mod event;
pub mod id;
pub mod status;
pub mod tree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SharedClock, SystemClock};
pub use config::{ConfigError, SuiteConfig};
pub use event::{EventKind, EventListener, Listeners, SuiteEvent};
pub use id::{JobId, SuiteId};
pub use macros::UnknownVariant;
pub use status::{AttemptRecord, JobState, JobStatus, StatusHandle};
pub use tree::{JobTree, JobTreeNode, TreeDescriptor, TreeError};
