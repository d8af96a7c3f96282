// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits at the seams of the escalation engine.
//!
//! The trigger layer depends on narrow capabilities (append one message,
//! enqueue one job) rather than on whole collaborators, so the engine and
//! the agent runtime never form a module cycle.

pub mod notify;
pub mod thread;

pub use notify::NotificationDispatcher;
pub use thread::{ThreadAppender, ThreadReader, ThreadStore};
