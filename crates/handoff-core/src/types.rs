// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Handoff workspace.
//!
//! Timestamps are stored as millisecond-precision ISO 8601 text
//! (`2026-01-01T00:00:00.000Z`), which sorts lexicographically and matches
//! the format SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a conversation.
///
/// `Unresolved` is the initial state. `Escalated` is reachable from
/// `Unresolved` only. `Resolved` is terminal; there is no reopen path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Unresolved,
    Escalated,
    Resolved,
}

/// Why a conversation was escalated to a human operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    CustomerRequested,
    AiDetected,
}

/// Role of a thread message author.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Polymorphic message content: a plain string or a list of typed parts.
///
/// Serialized untagged so a plain-text message round-trips as a bare JSON
/// string, matching what upstream agent frameworks emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Plain-text content from a `&str`.
    pub fn text(s: impl Into<String>) -> Self {
        MessageContent::Text(s.into())
    }
}

/// One part of a structured multi-part message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

/// A single message in a conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: MessageContent,
    pub created_at: String,
}

/// Fire-and-forget payload for one escalation notification job.
///
/// The customer-initiated trigger fills `context` from what it already has
/// in hand; the AI-detected trigger leaves it empty and the worker recovers
/// context from the thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationNotification {
    pub conversation_id: String,
    pub organization_id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<CustomerContext>,
}

/// Customer details attached to a customer-initiated escalation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContext {
    pub customer_name: String,
    pub customer_email: String,
    /// The literal last customer message as seen by the caller, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

/// Current time as millisecond-precision ISO 8601 text.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// A fresh v4 UUID string, used for all entity ids.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_reason_round_trip_as_snake_case() {
        use std::str::FromStr;

        assert_eq!(ConversationStatus::Unresolved.to_string(), "unresolved");
        assert_eq!(
            ConversationStatus::from_str("escalated").unwrap(),
            ConversationStatus::Escalated
        );
        assert_eq!(
            EscalationReason::CustomerRequested.to_string(),
            "customer_requested"
        );
        assert_eq!(
            EscalationReason::from_str("ai_detected").unwrap(),
            EscalationReason::AiDetected
        );
        assert_eq!(MessageRole::from_str("user").unwrap(), MessageRole::User);
    }

    #[test]
    fn plain_text_content_serializes_as_bare_string() {
        let content = MessageContent::text("hello");
        let json = serde_json::to_string(&content).unwrap();
        assert_eq!(json, r#""hello""#);

        let parsed: MessageContent = serde_json::from_str(r#""hi there""#).unwrap();
        assert_eq!(parsed, MessageContent::text("hi there"));
    }

    #[test]
    fn structured_parts_round_trip() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: "see attached".to_string(),
            },
            ContentPart::Image {
                url: Some("https://example.com/x.png".to_string()),
            },
        ]);
        let json = serde_json::to_string(&content).unwrap();
        let parsed: MessageContent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, content);
    }

    #[test]
    fn image_only_parts_parse_without_text() {
        let parsed: MessageContent =
            serde_json::from_str(r#"[{"type":"image","url":"https://x/y.png"}]"#).unwrap();
        match parsed {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 1),
            MessageContent::Text(_) => panic!("expected structured parts"),
        }
    }

    #[test]
    fn notification_payload_omits_empty_context() {
        let job = EscalationNotification {
            conversation_id: "c1".to_string(),
            organization_id: "org1".to_string(),
            thread_id: "t1".to_string(),
            context: None,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(!json.contains("context"));

        let parsed: EscalationNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn now_iso_has_millisecond_precision_and_z_suffix() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        // 2026-01-01T00:00:00.000Z is 24 chars.
        assert_eq!(ts.len(), 24);
    }
}
