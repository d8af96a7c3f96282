// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue-backed notification dispatcher.
//!
//! `enqueue` only records the job; delivery happens later in the worker.
//! This keeps the escalation request path fast and makes notification
//! delivery survive process restarts.

use async_trait::async_trait;

use handoff_core::{EscalationNotification, HandoffError, NotificationDispatcher};
use handoff_storage::{Database, queries};

/// Dispatcher that persists escalation notifications to the durable job
/// queue in the database.
#[derive(Clone)]
pub struct QueueDispatcher {
    db: Database,
}

impl QueueDispatcher {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationDispatcher for QueueDispatcher {
    async fn enqueue(&self, job: EscalationNotification) -> Result<(), HandoffError> {
        let payload = serde_json::to_string(&job).map_err(|e| HandoffError::Notify {
            message: "failed to serialize notification payload".to_string(),
            source: Some(Box::new(e)),
        })?;
        let job_id = queries::jobs::enqueue_job(&self.db, &payload).await?;
        tracing::debug!(job_id, conversation_id = %job.conversation_id, "notification enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn enqueue_persists_a_claimable_job() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        let dispatcher = QueueDispatcher::new(db.clone());

        let job = EscalationNotification {
            conversation_id: "c-1".to_string(),
            organization_id: "org-1".to_string(),
            thread_id: "t-1".to_string(),
            context: None,
        };
        dispatcher.enqueue(job).await.unwrap();

        let entry = queries::jobs::claim_next_job(&db).await.unwrap().unwrap();
        let decoded: EscalationNotification = serde_json::from_str(&entry.payload).unwrap();
        assert_eq!(decoded.conversation_id, "c-1");
        assert_eq!(decoded.thread_id, "t-1");
        assert!(decoded.context.is_none());

        db.close().await.unwrap();
    }
}
