// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification context extraction.
//!
//! Finds the most recent message meaningfully attributable to the customer,
//! over a bounded newest-first window. Content is polymorphic (plain text or
//! structured parts) and the scan must tolerate mixed content without
//! throwing.

use handoff_core::{ContentPart, MessageContent, MessageRole, ThreadMessage};

/// Page size for the recent-message window. Ten messages is enough to find
/// one user turn without over-fetching.
pub const RECENT_WINDOW: usize = 10;

/// Placeholder rendered when the latest customer message has no text part.
pub const NON_TEXT_PLACEHOLDER: &str = "[attachment]";

/// Result of scanning a thread window for customer context.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextScan {
    /// The latest customer message's text.
    Found(String),
    /// The latest customer message had content, but none of it textual.
    NonText,
    /// No customer message in the window; callers degrade to generic copy.
    NoneFound,
}

impl ContextScan {
    /// The text to place in a notification, substituting the fixed
    /// placeholder for non-text content.
    pub fn into_excerpt(self) -> Option<String> {
        match self {
            ContextScan::Found(text) => Some(text),
            ContextScan::NonText => Some(NON_TEXT_PLACEHOLDER.to_string()),
            ContextScan::NoneFound => None,
        }
    }
}

/// Scan a newest-first message window for the latest customer message.
///
/// Non-user roles are skipped. A user message qualifies once it has any
/// content: plain text qualifies if non-empty after trimming, structured
/// parts qualify through their first non-empty text part, and a non-empty
/// part list without any text part yields [`ContextScan::NonText`]. Empty
/// messages are skipped entirely, so the scan keeps walking past them.
pub fn latest_customer_message(messages: &[ThreadMessage]) -> ContextScan {
    for message in messages {
        if message.role != MessageRole::User {
            continue;
        }
        match &message.content {
            MessageContent::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return ContextScan::Found(trimmed.to_string());
                }
            }
            MessageContent::Parts(parts) => {
                let text_part = parts.iter().find_map(|part| match part {
                    ContentPart::Text { text } => {
                        let trimmed = text.trim();
                        (!trimmed.is_empty()).then(|| trimmed.to_string())
                    }
                    ContentPart::Image { .. } | ContentPart::File { .. } => None,
                });
                match text_part {
                    Some(text) => return ContextScan::Found(text),
                    None if !parts.is_empty() => return ContextScan::NonText,
                    None => {}
                }
            }
        }
    }
    ContextScan::NoneFound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, role: MessageRole, content: MessageContent) -> ThreadMessage {
        ThreadMessage {
            id: id.to_string(),
            thread_id: "t-1".to_string(),
            role,
            content,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn returns_most_recent_user_text() {
        // Window is newest first: [user:"C", assistant:"B", user:"A"].
        let window = [
            msg("m3", MessageRole::User, MessageContent::text("C")),
            msg("m2", MessageRole::Assistant, MessageContent::text("B")),
            msg("m1", MessageRole::User, MessageContent::text("A")),
        ];
        assert_eq!(
            latest_customer_message(&window),
            ContextScan::Found("C".to_string())
        );
    }

    #[test]
    fn skips_assistant_and_system_messages() {
        let window = [
            msg("m3", MessageRole::System, MessageContent::text("note")),
            msg("m2", MessageRole::Assistant, MessageContent::text("B")),
            msg("m1", MessageRole::User, MessageContent::text("A")),
        ];
        assert_eq!(
            latest_customer_message(&window),
            ContextScan::Found("A".to_string())
        );
    }

    #[test]
    fn assistant_only_window_finds_nothing() {
        let window = [msg("m1", MessageRole::Assistant, MessageContent::text("B"))];
        assert_eq!(latest_customer_message(&window), ContextScan::NoneFound);
    }

    #[test]
    fn empty_window_finds_nothing() {
        assert_eq!(latest_customer_message(&[]), ContextScan::NoneFound);
    }

    #[test]
    fn image_only_parts_yield_placeholder_not_error() {
        let window = [msg(
            "m1",
            MessageRole::User,
            MessageContent::Parts(vec![ContentPart::Image {
                url: Some("https://example.com/x.png".to_string()),
            }]),
        )];
        assert_eq!(latest_customer_message(&window), ContextScan::NonText);
        assert_eq!(
            ContextScan::NonText.into_excerpt().as_deref(),
            Some(NON_TEXT_PLACEHOLDER)
        );
    }

    #[test]
    fn first_text_part_wins_in_mixed_content() {
        let window = [msg(
            "m1",
            MessageRole::User,
            MessageContent::Parts(vec![
                ContentPart::Image { url: None },
                ContentPart::Text {
                    text: "  see attached  ".to_string(),
                },
            ]),
        )];
        assert_eq!(
            latest_customer_message(&window),
            ContextScan::Found("see attached".to_string())
        );
    }

    #[test]
    fn blank_user_messages_are_skipped() {
        let window = [
            msg("m3", MessageRole::User, MessageContent::text("   ")),
            msg("m2", MessageRole::User, MessageContent::Parts(vec![])),
            msg("m1", MessageRole::User, MessageContent::text("older words")),
        ];
        assert_eq!(
            latest_customer_message(&window),
            ContextScan::Found("older words".to_string())
        );
    }
}
