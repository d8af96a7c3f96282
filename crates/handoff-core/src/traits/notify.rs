// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatch capability.

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::types::EscalationNotification;

/// Asynchronous, fire-and-forget notification dispatch.
///
/// The contract is enqueue-and-return: callers must never depend on
/// delivery timing or success. Implementations may be a durable queue, an
/// in-memory channel, or a direct synchronous call in tests.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Submits one job for later delivery.
    async fn enqueue(&self, job: EscalationNotification) -> Result<(), HandoffError>;
}
