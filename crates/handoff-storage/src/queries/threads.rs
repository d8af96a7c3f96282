// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread and thread-message operations.
//!
//! Message content is stored as the JSON encoding of
//! [`handoff_core::MessageContent`], so plain-text turns are bare JSON
//! strings and multi-part turns are arrays of typed parts.

use handoff_core::{HandoffError, MessageContent, ThreadMessage};
use rusqlite::params;

use crate::database::Database;

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<ThreadMessage, rusqlite::Error> {
    let role: String = row.get(2)?;
    let content: String = row.get(3)?;
    Ok(ThreadMessage {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        role: role.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        content: serde_json::from_str(&content).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        created_at: row.get(4)?,
    })
}

/// Insert a new thread row.
pub async fn insert_thread(
    db: &Database,
    id: &str,
    organization_id: &str,
    created_at: &str,
) -> Result<(), HandoffError> {
    let id = id.to_string();
    let organization_id = organization_id.to_string();
    let created_at = created_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, organization_id, created_at) VALUES (?1, ?2, ?3)",
                params![id, organization_id, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a thread; its messages go with it (ON DELETE CASCADE).
pub async fn delete_thread(db: &Database, id: &str) -> Result<(), HandoffError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM threads WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a message to a thread.
pub async fn insert_thread_message(
    db: &Database,
    message: &ThreadMessage,
) -> Result<(), HandoffError> {
    let content = serde_json::to_string(&message.content)
        .map_err(|e| HandoffError::Internal(format!("message content serialization: {e}")))?;
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO thread_messages (id, thread_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id,
                    message.thread_id,
                    message.role.to_string(),
                    content,
                    message.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// A bounded window of messages, most recent first.
pub async fn recent_messages(
    db: &Database,
    thread_id: &str,
    limit: i64,
) -> Result<Vec<ThreadMessage>, HandoffError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thread_id, role, content, created_at
                 FROM thread_messages WHERE thread_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![thread_id, limit], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages of a thread in chronological order.
pub async fn messages_chronological(
    db: &Database,
    thread_id: &str,
) -> Result<Vec<ThreadMessage>, HandoffError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thread_id, role, content, created_at
                 FROM thread_messages WHERE thread_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![thread_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
