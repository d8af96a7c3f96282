// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! Thread messages use the canonical [`handoff_core::ThreadMessage`] type so
//! they cross the capability-trait boundary unchanged; the types here are
//! private to the persistence layer and the engine.

use serde::{Deserialize, Serialize};

use handoff_core::{ConversationStatus, EscalationReason};

pub use handoff_core::ThreadMessage;

/// Ephemeral, expiring identity for an anonymous website visitor.
///
/// Treated as a capability token: any conversation write first requires
/// "session exists and `expires_at > now`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSession {
    pub id: String,
    pub name: String,
    pub email: String,
    pub organization_id: String,
    /// ISO 8601 expiry; compared lexicographically against `now_iso()`.
    pub expires_at: String,
    /// Optional JSON blob of client hints (user agent, language, referrer).
    pub metadata: Option<String>,
    pub created_at: String,
}

/// One tenant-scoped support conversation.
///
/// `thread_id` and `contact_session_id` are fixed at creation.
/// `escalated_at` / `escalation_reason` are set on the first transition to
/// `escalated` and never cleared, preserving escalation history across a
/// later `resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub organization_id: String,
    pub thread_id: String,
    pub contact_session_id: String,
    pub status: ConversationStatus,
    pub escalated_at: Option<String>,
    pub escalation_reason: Option<EscalationReason>,
    pub created_at: String,
}

/// One durable notification job row.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEntry {
    pub id: i64,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}
