// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable notification job queue.
//!
//! Jobs survive crashes: a claimed job holds a 5-minute lock, and failed
//! jobs are retried until `max_attempts` before being parked as `failed`.

use handoff_core::HandoffError;
use rusqlite::params;

use crate::database::Database;
use crate::models::JobEntry;

/// Enqueue a new job payload. Returns the auto-generated job ID.
pub async fn enqueue_job(db: &Database, payload: &str) -> Result<i64, HandoffError> {
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notification_jobs (payload) VALUES (?1)",
                params![payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim the next available job.
///
/// Atomically selects the oldest claimable entry and marks it `processing`
/// with a 5-minute lock timeout. A `processing` row whose lock has expired
/// is claimable again: a worker that crashed between claim and ack only
/// delays its job, never strands it. Returns `None` if the queue is empty.
pub async fn claim_next_job(db: &Database) -> Result<Option<JobEntry>, HandoffError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(
                    "SELECT id, payload, status, attempts, max_attempts,
                            created_at, updated_at, locked_until
                     FROM notification_jobs
                     WHERE status = 'pending'
                        OR (status = 'processing'
                            AND locked_until IS NOT NULL
                            AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ORDER BY id ASC
                     LIMIT 1",
                )?;
                stmt.query_row([], |row| {
                    Ok(JobEntry {
                        id: row.get(0)?,
                        payload: row.get(1)?,
                        status: row.get(2)?,
                        attempts: row.get(3)?,
                        max_attempts: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                        locked_until: row.get(7)?,
                    })
                })
            };

            match result {
                Ok(entry) => {
                    tx.execute(
                        "UPDATE notification_jobs SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![entry.id],
                    )?;
                    tx.commit()?;

                    Ok(Some(JobEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge successful processing: marks the job `completed`.
pub async fn complete_job(db: &Database, id: i64) -> Result<(), HandoffError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notification_jobs SET status = 'completed',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a processing failure.
///
/// Increments attempts. At `max_attempts` the job is parked as `failed`;
/// otherwise it returns to `pending` for retry and the lock is cleared.
pub async fn retry_or_fail_job(db: &Database, id: i64) -> Result<(), HandoffError> {
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM notification_jobs WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            let next_status = if new_attempts >= max_attempts {
                "failed"
            } else {
                "pending"
            };
            conn.execute(
                "UPDATE notification_jobs SET status = ?1, attempts = ?2,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![next_status, new_attempts, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
