// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread capabilities: append, bounded reverse reads, lifecycle.

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::types::{MessageContent, MessageRole, ThreadMessage};

/// Append one message to a thread.
///
/// This is the only thread capability the escalation path needs, kept
/// separate so callers holding an appender cannot read or delete.
#[async_trait]
pub trait ThreadAppender: Send + Sync {
    /// Appends a message and returns its id.
    async fn append(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: MessageContent,
    ) -> Result<String, HandoffError>;
}

/// Read a bounded recent window of a thread.
#[async_trait]
pub trait ThreadReader: Send + Sync {
    /// Returns up to `limit` messages, most recent first.
    async fn recent_messages(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, HandoffError>;

    /// Returns the full thread in chronological order.
    async fn messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, HandoffError>;
}

/// Full thread store: read, append, and lifecycle.
#[async_trait]
pub trait ThreadStore: ThreadAppender + ThreadReader {
    /// Creates a new thread seeded with one assistant greeting message.
    ///
    /// Returns the new thread id.
    async fn create_thread(
        &self,
        organization_id: &str,
        greeting: MessageContent,
    ) -> Result<String, HandoffError>;

    /// Deletes a thread and its messages.
    ///
    /// Used only as compensation when conversation creation fails after the
    /// thread was already created.
    async fn delete_thread(&self, thread_id: &str) -> Result<(), HandoffError>;
}
