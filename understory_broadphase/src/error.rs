// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use crate::types::Handle;

/// Errors reported by broad phase operations.
///
/// Every failing operation leaves the broad phase unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BroadPhaseError {
    /// The handle was never issued by this broad phase, or was removed.
    #[error("unknown broad phase handle {0}")]
    UnknownHandle(Handle),
    /// A configuration value is out of range.
    #[error("invalid broad phase configuration: {0}")]
    InvalidConfig(&'static str),
}
