// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact session CRUD operations.

use handoff_core::HandoffError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ContactSession;

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<ContactSession, rusqlite::Error> {
    Ok(ContactSession {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        organization_id: row.get(3)?,
        expires_at: row.get(4)?,
        metadata: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Create a new contact session.
pub async fn create_contact_session(
    db: &Database,
    session: &ContactSession,
) -> Result<(), HandoffError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contact_sessions (id, name, email, organization_id, expires_at, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.id,
                    session.name,
                    session.email,
                    session.organization_id,
                    session.expires_at,
                    session.metadata,
                    session.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a contact session by ID.
pub async fn get_contact_session(
    db: &Database,
    id: &str,
) -> Result<Option<ContactSession>, HandoffError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, organization_id, expires_at, metadata, created_at
                 FROM contact_sessions WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Extend a session's expiry (refresh-on-use).
pub async fn touch_contact_session(
    db: &Database,
    id: &str,
    expires_at: &str,
) -> Result<(), HandoffError> {
    let id = id.to_string();
    let expires_at = expires_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE contact_sessions SET expires_at = ?1 WHERE id = ?2",
                params![expires_at, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
