// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Handoff escalation engine.

use thiserror::Error;

use crate::types::ConversationStatus;

/// The primary error type used across Handoff crates.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller's contact session is invalid, expired, or does not own the target.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The conversation is in a state from which the requested transition is not allowed.
    #[error("conversation {id} is {status}; cannot escalate")]
    InvalidTransition {
        id: String,
        status: ConversationStatus,
    },

    /// Notification dispatch or delivery errors (queue insert, SMTP).
    #[error("notification error: {message}")]
    Notify {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandoffError {
    /// Shorthand for a [`HandoffError::NotFound`] for a conversation id.
    pub fn conversation_not_found(id: impl Into<String>) -> Self {
        HandoffError::NotFound {
            entity: "conversation",
            id: id.into(),
        }
    }
}
