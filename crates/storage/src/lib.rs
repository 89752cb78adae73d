// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jt-storage: durable job status records and the read-only suite view

pub mod index;
pub mod paths;
pub mod record;
pub mod session;
pub mod store;

pub use index::SuiteIndex;
pub use session::SessionFacade;
pub use store::{FileStatusStore, StatusStore, StoreError};
