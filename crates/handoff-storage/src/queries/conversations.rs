// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation row operations, including the escalation compare-and-set.

use handoff_core::{EscalationReason, HandoffError};
use rusqlite::params;

use crate::database::Database;
use crate::models::Conversation;

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, rusqlite::Error> {
    let status: String = row.get(4)?;
    let reason: Option<String> = row.get(6)?;
    Ok(Conversation {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        thread_id: row.get(2)?,
        contact_session_id: row.get(3)?,
        status: status.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        escalated_at: row.get(5)?,
        escalation_reason: reason
            .map(|r| {
                r.parse::<EscalationReason>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()?,
        created_at: row.get(7)?,
    })
}

const SELECT_COLUMNS: &str = "id, organization_id, thread_id, contact_session_id, status, \
                              escalated_at, escalation_reason, created_at";

/// Insert a new conversation row.
pub async fn insert_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), HandoffError> {
    let c = conversation.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, organization_id, thread_id, contact_session_id,
                                            status, escalated_at, escalation_reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    c.id,
                    c.organization_id,
                    c.thread_id,
                    c.contact_session_id,
                    c.status.to_string(),
                    c.escalated_at,
                    c.escalation_reason.map(|r| r.to_string()),
                    c.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a conversation by ID.
pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, HandoffError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM conversations WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_conversation) {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Reverse lookup by thread ID.
///
/// The `thread_id` column carries a UNIQUE index, so at most one row matches.
pub async fn get_by_thread_id(
    db: &Database,
    thread_id: &str,
) -> Result<Option<Conversation>, HandoffError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM conversations WHERE thread_id = ?1"
            ))?;
            match stmt.query_row(params![thread_id], row_to_conversation) {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List conversations owned by a contact session, newest first.
pub async fn list_by_contact_session(
    db: &Database,
    contact_session_id: &str,
    limit: i64,
) -> Result<Vec<Conversation>, HandoffError> {
    let contact_session_id = contact_session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM conversations
                 WHERE contact_session_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![contact_session_id, limit], row_to_conversation)?;
            let mut conversations = Vec::new();
            for row in rows {
                conversations.push(row?);
            }
            Ok(conversations)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim the escalation transition for a conversation.
///
/// Single compare-and-set: the row moves to `escalated` only if it is still
/// `unresolved`, and `escalated_at` keeps its first value if one was ever
/// set. Returns `true` if this call performed the transition. All writers
/// are serialized on the connection's single background thread, so exactly
/// one of any number of racing callers observes `true`.
pub async fn mark_escalated(
    db: &Database,
    id: &str,
    reason: EscalationReason,
    escalated_at: &str,
) -> Result<bool, HandoffError> {
    let id = id.to_string();
    let escalated_at = escalated_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE conversations
                 SET status = 'escalated',
                     escalated_at = COALESCE(escalated_at, ?1),
                     escalation_reason = ?2
                 WHERE id = ?3 AND status = 'unresolved'",
                params![escalated_at, reason.to_string(), id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a conversation resolved.
///
/// Escalation metadata is deliberately left untouched. Returns `true` if a
/// row was updated.
pub async fn mark_resolved(db: &Database, id: &str) -> Result<bool, HandoffError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE conversations SET status = 'resolved' WHERE id = ?1",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactSession;
    use crate::queries::contact_sessions::create_contact_session;
    use crate::queries::threads::insert_thread;
    use handoff_core::ConversationStatus;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let session = ContactSession {
            id: "cs-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            organization_id: "org-1".to_string(),
            expires_at: "2099-01-01T00:00:00.000Z".to_string(),
            metadata: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        create_contact_session(&db, &session).await.unwrap();
        (db, dir)
    }

    async fn seed_conversation(db: &Database, id: &str, thread_id: &str) -> Conversation {
        insert_thread(db, thread_id, "org-1", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        let conversation = Conversation {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            thread_id: thread_id.to_string(),
            contact_session_id: "cs-1".to_string(),
            status: ConversationStatus::Unresolved,
            escalated_at: None,
            escalation_reason: None,
            created_at: "2026-01-01T00:00:01.000Z".to_string(),
        };
        insert_conversation(db, &conversation).await.unwrap();
        conversation
    }

    #[tokio::test]
    async fn insert_and_get_roundtrips() {
        let (db, _dir) = setup_db().await;
        let conversation = seed_conversation(&db, "c-1", "t-1").await;

        let retrieved = get_conversation(&db, "c-1").await.unwrap().unwrap();
        assert_eq!(retrieved, conversation);

        let by_thread = get_by_thread_id(&db, "t-1").await.unwrap().unwrap();
        assert_eq!(by_thread.id, "c-1");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_thread_id_is_rejected() {
        let (db, _dir) = setup_db().await;
        seed_conversation(&db, "c-1", "t-1").await;

        let duplicate = Conversation {
            id: "c-2".to_string(),
            organization_id: "org-1".to_string(),
            thread_id: "t-1".to_string(),
            contact_session_id: "cs-1".to_string(),
            status: ConversationStatus::Unresolved,
            escalated_at: None,
            escalation_reason: None,
            created_at: "2026-01-01T00:00:02.000Z".to_string(),
        };
        let result = insert_conversation(&db, &duplicate).await;
        assert!(result.is_err(), "UNIQUE(thread_id) must hold");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_escalated_claims_exactly_once() {
        let (db, _dir) = setup_db().await;
        seed_conversation(&db, "c-1", "t-1").await;

        let first = mark_escalated(
            &db,
            "c-1",
            EscalationReason::CustomerRequested,
            "2026-01-02T00:00:00.000Z",
        )
        .await
        .unwrap();
        assert!(first);

        // Second claim loses, regardless of cause; metadata stays put.
        let second = mark_escalated(
            &db,
            "c-1",
            EscalationReason::AiDetected,
            "2026-01-03T00:00:00.000Z",
        )
        .await
        .unwrap();
        assert!(!second);

        let row = get_conversation(&db, "c-1").await.unwrap().unwrap();
        assert_eq!(row.status, ConversationStatus::Escalated);
        assert_eq!(row.escalated_at.as_deref(), Some("2026-01-02T00:00:00.000Z"));
        assert_eq!(
            row.escalation_reason,
            Some(EscalationReason::CustomerRequested)
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_escalated_does_not_reopen_resolved() {
        let (db, _dir) = setup_db().await;
        seed_conversation(&db, "c-1", "t-1").await;
        assert!(mark_resolved(&db, "c-1").await.unwrap());

        let claimed = mark_escalated(
            &db,
            "c-1",
            EscalationReason::AiDetected,
            "2026-01-02T00:00:00.000Z",
        )
        .await
        .unwrap();
        assert!(!claimed);

        let row = get_conversation(&db, "c-1").await.unwrap().unwrap();
        assert_eq!(row.status, ConversationStatus::Resolved);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn resolve_preserves_escalation_metadata() {
        let (db, _dir) = setup_db().await;
        seed_conversation(&db, "c-1", "t-1").await;

        mark_escalated(
            &db,
            "c-1",
            EscalationReason::AiDetected,
            "2026-01-02T00:00:00.000Z",
        )
        .await
        .unwrap();
        assert!(mark_resolved(&db, "c-1").await.unwrap());

        let row = get_conversation(&db, "c-1").await.unwrap().unwrap();
        assert_eq!(row.status, ConversationStatus::Resolved);
        assert_eq!(row.escalated_at.as_deref(), Some("2026-01-02T00:00:00.000Z"));
        assert_eq!(row.escalation_reason, Some(EscalationReason::AiDetected));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_by_contact_session_is_newest_first() {
        let (db, _dir) = setup_db().await;
        for i in 0..3 {
            insert_thread(&db, &format!("t-{i}"), "org-1", "2026-01-01T00:00:00.000Z")
                .await
                .unwrap();
            let conversation = Conversation {
                id: format!("c-{i}"),
                organization_id: "org-1".to_string(),
                thread_id: format!("t-{i}"),
                contact_session_id: "cs-1".to_string(),
                status: ConversationStatus::Unresolved,
                escalated_at: None,
                escalation_reason: None,
                created_at: format!("2026-01-01T00:00:0{i}.000Z"),
            };
            insert_conversation(&db, &conversation).await.unwrap();
        }

        let listed = list_by_contact_session(&db, "cs-1", 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "c-2");
        assert_eq!(listed[1].id, "c-1");

        db.close().await.unwrap();
    }
}
