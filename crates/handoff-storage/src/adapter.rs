// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the thread capability traits.

use async_trait::async_trait;
use tracing::debug;

use handoff_core::types::{new_id, now_iso};
use handoff_core::{
    HandoffError, MessageContent, MessageRole, ThreadAppender, ThreadMessage, ThreadReader,
    ThreadStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed thread store.
///
/// Wraps a [`Database`] handle and delegates to the typed query module.
/// Cloning is cheap; all clones share the single-writer connection.
#[derive(Clone)]
pub struct SqliteThreads {
    db: Database,
}

impl SqliteThreads {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ThreadAppender for SqliteThreads {
    async fn append(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: MessageContent,
    ) -> Result<String, HandoffError> {
        let message = ThreadMessage {
            id: new_id(),
            thread_id: thread_id.to_string(),
            role,
            content,
            created_at: now_iso(),
        };
        queries::threads::insert_thread_message(&self.db, &message).await?;
        Ok(message.id)
    }
}

#[async_trait]
impl ThreadReader for SqliteThreads {
    async fn recent_messages(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, HandoffError> {
        queries::threads::recent_messages(&self.db, thread_id, limit as i64).await
    }

    async fn messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, HandoffError> {
        queries::threads::messages_chronological(&self.db, thread_id).await
    }
}

#[async_trait]
impl ThreadStore for SqliteThreads {
    async fn create_thread(
        &self,
        organization_id: &str,
        greeting: MessageContent,
    ) -> Result<String, HandoffError> {
        let thread_id = new_id();
        queries::threads::insert_thread(&self.db, &thread_id, organization_id, &now_iso()).await?;
        self.append(&thread_id, MessageRole::Assistant, greeting)
            .await?;
        debug!(thread_id, organization_id, "thread created");
        Ok(thread_id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), HandoffError> {
        queries::threads::delete_thread(&self.db, thread_id).await
    }
}
