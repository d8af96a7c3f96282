// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle and escalation engine.
//!
//! Owns the `unresolved -> escalated -> resolved` state machine, the two
//! escalation triggers (customer-requested and AI-detected), and the
//! session-gated read queries. Thread access and notification dispatch come
//! in through the capability traits in `handoff-core`, so the engine never
//! depends on a concrete agent or mailer.

pub mod context;
pub mod engine;

pub use context::{ContextScan, NON_TEXT_PLACEHOLDER, RECENT_WINDOW, latest_customer_message};
pub use engine::{ConversationEngine, ConversationSummary, ESCALATION_ACK, EscalateOutcome};
