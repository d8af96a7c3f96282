// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background worker that drains the notification job queue.
//!
//! One job per iteration: claim, resolve the customer context, render, send,
//! acknowledge. A send failure returns the job to the queue until its
//! attempt budget runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use handoff_config::NotifyConfig;
use handoff_core::{CustomerContext, EscalationNotification, HandoffError, ThreadReader};
use handoff_engine::{RECENT_WINDOW, latest_customer_message};
use handoff_storage::{Database, queries};

use crate::email::render_escalation;
use crate::mailer::{Mailer, OutgoingEmail};

pub struct NotificationWorker {
    db: Database,
    reader: Arc<dyn ThreadReader>,
    mailer: Arc<dyn Mailer>,
    notify: NotifyConfig,
}

impl NotificationWorker {
    pub fn new(
        db: Database,
        reader: Arc<dyn ThreadReader>,
        mailer: Arc<dyn Mailer>,
        notify: NotifyConfig,
    ) -> Self {
        Self {
            db,
            reader,
            mailer,
            notify,
        }
    }

    /// Poll loop; runs until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let idle = Duration::from_secs(self.notify.poll_interval_secs.max(1));
        info!(poll_interval_secs = idle.as_secs(), "notification worker started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            match self.process_next().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(idle) => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "queue poll failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(idle) => {}
                    }
                }
            }
        }

        info!("notification worker stopped");
    }

    /// Claim and process one job. Returns `false` when the queue was empty.
    pub async fn process_next(&self) -> Result<bool, HandoffError> {
        let Some(entry) = queries::jobs::claim_next_job(&self.db).await? else {
            return Ok(false);
        };

        match self.process(&entry.payload).await {
            Ok(()) => {
                queries::jobs::complete_job(&self.db, entry.id).await?;
                debug!(job_id = entry.id, "notification delivered");
            }
            Err(e) => {
                warn!(job_id = entry.id, attempts = entry.attempts + 1, error = %e,
                    "notification delivery failed");
                queries::jobs::retry_or_fail_job(&self.db, entry.id).await?;
            }
        }
        Ok(true)
    }

    async fn process(&self, payload: &str) -> Result<(), HandoffError> {
        let mut job: EscalationNotification =
            serde_json::from_str(payload).map_err(|e| HandoffError::Notify {
                message: "malformed notification payload".to_string(),
                source: Some(Box::new(e)),
            })?;

        // AI-triggered jobs carry no inline context; recover customer
        // identity from the conversation's session when it still exists.
        if job.context.is_none() {
            job.context = self.lookup_customer(&job.conversation_id).await?;
        }

        // Prefer the excerpt the trigger captured; fall back to scanning the
        // thread's recent window.
        let excerpt = match job.context.as_ref().and_then(|c| c.last_message.clone()) {
            Some(text) => Some(text),
            None => {
                let window = self
                    .reader
                    .recent_messages(&job.thread_id, RECENT_WINDOW)
                    .await?;
                latest_customer_message(&window).into_excerpt()
            }
        };

        if self.notify.notify_emails.is_empty() {
            debug!(conversation_id = %job.conversation_id,
                "no notify addresses configured; dropping notification");
            return Ok(());
        }

        let rendered = render_escalation(&job, excerpt.as_deref(), &self.notify.dashboard_url);
        self.mailer
            .send(OutgoingEmail {
                to: self.notify.notify_emails.clone(),
                rendered,
            })
            .await
    }

    /// Best-effort lookup of the customer behind a conversation.
    async fn lookup_customer(
        &self,
        conversation_id: &str,
    ) -> Result<Option<CustomerContext>, HandoffError> {
        let Some(conversation) =
            queries::conversations::get_conversation(&self.db, conversation_id).await?
        else {
            return Ok(None);
        };
        let Some(session) =
            queries::contact_sessions::get_contact_session(&self.db, &conversation.contact_session_id)
                .await?
        else {
            return Ok(None);
        };
        Ok(Some(CustomerContext {
            customer_name: session.name,
            customer_email: session.email,
            last_message: None,
        }))
    }
}
