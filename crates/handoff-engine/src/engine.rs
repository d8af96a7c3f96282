// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle engine: the three-state machine and its two
//! escalation triggers.
//!
//! Every trigger runs as one short-lived request: validate the caller,
//! apply the state-machine rule through a single row-level compare-and-set,
//! then fire the side effects. Everything after the committed status change
//! (acknowledgment append, notification enqueue) is best-effort and never
//! unwinds the transition.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use handoff_config::HandoffConfig;
use handoff_core::types::{new_id, now_iso};
use handoff_core::{
    ConversationStatus, CustomerContext, EscalationNotification, EscalationReason, HandoffError,
    MessageContent, MessageRole, NotificationDispatcher, ThreadMessage, ThreadStore,
};
use handoff_storage::models::{ContactSession, Conversation};
use handoff_storage::{Database, queries};

/// Acknowledgment appended to the thread when an escalation succeeds.
pub const ESCALATION_ACK: &str =
    "I've connected you with our support team. A team member will respond shortly.";

/// Outcome of an escalation trigger.
///
/// `AlreadyEscalated` is a successful no-op, not an error: two triggers can
/// race on the same conversation and the loser must degrade silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalateOutcome {
    /// This call performed the transition.
    Escalated,
    /// The conversation was escalated before this call; nothing was written.
    AlreadyEscalated,
}

/// A conversation together with its latest thread message, for list views.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub last_message: Option<ThreadMessage>,
}

/// The conversation lifecycle engine.
///
/// Collaborators are injected explicitly; the composition root owns their
/// lifecycle. Cloning shares the underlying connection and collaborators.
#[derive(Clone)]
pub struct ConversationEngine {
    db: Database,
    threads: Arc<dyn ThreadStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    greet_message: String,
    session_ttl: Duration,
    refresh_threshold: Duration,
}

impl ConversationEngine {
    pub fn new(
        db: Database,
        threads: Arc<dyn ThreadStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: &HandoffConfig,
    ) -> Self {
        Self {
            db,
            threads,
            notifier,
            greet_message: config.widget.greet_message.clone(),
            session_ttl: Duration::minutes(config.session.ttl_minutes as i64),
            refresh_threshold: Duration::minutes(config.session.refresh_threshold_minutes as i64),
        }
    }

    /// Create a new contact session for an anonymous visitor.
    pub async fn create_contact_session(
        &self,
        name: &str,
        email: &str,
        organization_id: &str,
        metadata: Option<String>,
    ) -> Result<ContactSession, HandoffError> {
        let now = Utc::now();
        let session = ContactSession {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            organization_id: organization_id.to_string(),
            expires_at: format_iso(now + self.session_ttl),
            metadata,
            created_at: format_iso(now),
        };
        queries::contact_sessions::create_contact_session(&self.db, &session).await?;
        debug!(session_id = %session.id, organization_id, "contact session created");
        Ok(session)
    }

    /// Load a session and require it to be unexpired, refreshing it when it
    /// is close to expiry.
    ///
    /// Every conversation write goes through here: the session is the
    /// caller's capability token.
    async fn validate_session(&self, session_id: &str) -> Result<ContactSession, HandoffError> {
        let session = queries::contact_sessions::get_contact_session(&self.db, session_id)
            .await?
            .ok_or_else(|| HandoffError::Unauthorized("invalid session".to_string()))?;

        let now = Utc::now();
        let expires_at = parse_iso(&session.expires_at)?;
        if expires_at <= now {
            return Err(HandoffError::Unauthorized("invalid session".to_string()));
        }

        if expires_at - now < self.refresh_threshold {
            let refreshed = format_iso(now + self.session_ttl);
            queries::contact_sessions::touch_contact_session(&self.db, &session.id, &refreshed)
                .await?;
            debug!(session_id = %session.id, expires_at = %refreshed, "session refreshed");
        }

        Ok(session)
    }

    /// Start a new conversation: a thread seeded with the assistant greeting,
    /// paired with an `unresolved` conversation row.
    pub async fn create_conversation(
        &self,
        organization_id: &str,
        contact_session_id: &str,
    ) -> Result<Conversation, HandoffError> {
        let session = self.validate_session(contact_session_id).await?;
        if session.organization_id != organization_id {
            return Err(HandoffError::Unauthorized(
                "session belongs to a different organization".to_string(),
            ));
        }

        let thread_id = self
            .threads
            .create_thread(organization_id, MessageContent::text(&self.greet_message))
            .await?;

        let conversation = Conversation {
            id: new_id(),
            organization_id: organization_id.to_string(),
            thread_id: thread_id.clone(),
            contact_session_id: session.id.clone(),
            status: ConversationStatus::Unresolved,
            escalated_at: None,
            escalation_reason: None,
            created_at: now_iso(),
        };

        if let Err(e) = queries::conversations::insert_conversation(&self.db, &conversation).await {
            // Compensate for the orphaned thread; its loss is preferable to
            // a thread no conversation will ever reference.
            warn!(thread_id, error = %e, "conversation insert failed; deleting orphaned thread");
            if let Err(cleanup) = self.threads.delete_thread(&thread_id).await {
                warn!(thread_id, error = %cleanup, "orphaned thread cleanup failed");
            }
            return Err(e);
        }

        debug!(conversation_id = %conversation.id, thread_id, "conversation created");
        Ok(conversation)
    }

    /// Customer-initiated escalation trigger.
    ///
    /// Requires a valid session that owns the conversation. `last_message`
    /// is the literal last customer message as seen by the caller; it rides
    /// along in the notification job so the worker need not re-fetch it.
    pub async fn escalate_for_customer(
        &self,
        conversation_id: &str,
        contact_session_id: &str,
        last_message: Option<String>,
    ) -> Result<EscalateOutcome, HandoffError> {
        let session = self.validate_session(contact_session_id).await?;

        let conversation = queries::conversations::get_conversation(&self.db, conversation_id)
            .await?
            .ok_or_else(|| HandoffError::conversation_not_found(conversation_id))?;

        if conversation.contact_session_id != session.id
            || conversation.organization_id != session.organization_id
        {
            return Err(HandoffError::Unauthorized("incorrect session".to_string()));
        }

        let context = CustomerContext {
            customer_name: session.name,
            customer_email: session.email,
            last_message,
        };
        self.escalate(&conversation, EscalationReason::CustomerRequested, Some(context))
            .await
    }

    /// AI-detected escalation trigger.
    ///
    /// Invoked from inside the agent's tool-use loop; the thread context is
    /// the authority, so there is no separate session check. The notification
    /// job carries no inline context and the worker recovers it from the
    /// thread.
    pub async fn escalate_for_agent(
        &self,
        thread_id: &str,
    ) -> Result<EscalateOutcome, HandoffError> {
        let conversation = queries::conversations::get_by_thread_id(&self.db, thread_id)
            .await?
            .ok_or_else(|| HandoffError::conversation_not_found(thread_id))?;

        self.escalate(&conversation, EscalationReason::AiDetected, None)
            .await
    }

    /// Mark the conversation behind a thread resolved.
    ///
    /// Trusted-caller surface only; escalation metadata survives.
    pub async fn resolve_by_thread(&self, thread_id: &str) -> Result<(), HandoffError> {
        let conversation = queries::conversations::get_by_thread_id(&self.db, thread_id)
            .await?
            .ok_or_else(|| HandoffError::conversation_not_found(thread_id))?;

        queries::conversations::mark_resolved(&self.db, &conversation.id).await?;
        debug!(conversation_id = %conversation.id, "conversation resolved");
        Ok(())
    }

    /// Shared escalation core: claim the transition, then fire side effects.
    async fn escalate(
        &self,
        conversation: &Conversation,
        reason: EscalationReason,
        context: Option<CustomerContext>,
    ) -> Result<EscalateOutcome, HandoffError> {
        let claimed = queries::conversations::mark_escalated(
            &self.db,
            &conversation.id,
            reason,
            &now_iso(),
        )
        .await?;

        if !claimed {
            // Distinguish the harmless race loser from an invalid transition.
            let current = queries::conversations::get_conversation(&self.db, &conversation.id)
                .await?
                .ok_or_else(|| HandoffError::conversation_not_found(&conversation.id))?;
            return match current.status {
                ConversationStatus::Escalated => {
                    debug!(conversation_id = %conversation.id, "already escalated");
                    Ok(EscalateOutcome::AlreadyEscalated)
                }
                ConversationStatus::Resolved => Err(HandoffError::InvalidTransition {
                    id: conversation.id.clone(),
                    status: current.status,
                }),
                ConversationStatus::Unresolved => Err(HandoffError::Internal(
                    "escalation claim failed on an unresolved conversation".to_string(),
                )),
            };
        }

        debug!(conversation_id = %conversation.id, %reason, "conversation escalated");

        // The status change is committed; the acknowledgment and the
        // notification are best-effort from here on.
        if let Err(e) = self
            .threads
            .append(
                &conversation.thread_id,
                MessageRole::Assistant,
                MessageContent::text(ESCALATION_ACK),
            )
            .await
        {
            warn!(conversation_id = %conversation.id, error = %e, "acknowledgment append failed");
        }

        let job = EscalationNotification {
            conversation_id: conversation.id.clone(),
            organization_id: conversation.organization_id.clone(),
            thread_id: conversation.thread_id.clone(),
            context,
        };
        if let Err(e) = self.notifier.enqueue(job).await {
            warn!(conversation_id = %conversation.id, error = %e, "notification enqueue failed");
        }

        Ok(EscalateOutcome::Escalated)
    }

    /// Fetch one conversation after session and ownership checks.
    pub async fn get_for_session(
        &self,
        conversation_id: &str,
        contact_session_id: &str,
    ) -> Result<Conversation, HandoffError> {
        let session = self.validate_session(contact_session_id).await?;
        let conversation = queries::conversations::get_conversation(&self.db, conversation_id)
            .await?
            .ok_or_else(|| HandoffError::conversation_not_found(conversation_id))?;
        if conversation.contact_session_id != session.id {
            return Err(HandoffError::Unauthorized("incorrect session".to_string()));
        }
        Ok(conversation)
    }

    /// List a session's conversations, newest first, each with its latest
    /// thread message.
    pub async fn list_for_session(
        &self,
        contact_session_id: &str,
        limit: i64,
    ) -> Result<Vec<ConversationSummary>, HandoffError> {
        let session = self.validate_session(contact_session_id).await?;
        let conversations =
            queries::conversations::list_by_contact_session(&self.db, &session.id, limit).await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let last_message = self
                .threads
                .recent_messages(&conversation.thread_id, 1)
                .await?
                .into_iter()
                .next();
            summaries.push(ConversationSummary {
                conversation,
                last_message,
            });
        }
        Ok(summaries)
    }

    /// Full chronological message history of one conversation, after session
    /// and ownership checks.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        contact_session_id: &str,
    ) -> Result<Vec<ThreadMessage>, HandoffError> {
        let conversation = self
            .get_for_session(conversation_id, contact_session_id)
            .await?;
        self.threads.messages(&conversation.thread_id).await
    }
}

fn format_iso(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn parse_iso(ts: &str) -> Result<DateTime<Utc>, HandoffError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| HandoffError::Internal(format!("malformed timestamp `{ts}`: {e}")))
}
