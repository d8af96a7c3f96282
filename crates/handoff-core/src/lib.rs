// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Handoff conversation lifecycle engine.
//!
//! This crate provides the error type, shared domain types, and the
//! capability traits the engine, storage, and notification crates are
//! wired together through.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HandoffError;
pub use types::{
    ContentPart, ConversationStatus, CustomerContext, EscalationNotification, EscalationReason,
    MessageContent, MessageRole, ThreadMessage,
};

// Re-export capability traits at crate root.
pub use traits::{NotificationDispatcher, ThreadAppender, ThreadReader, ThreadStore};
