// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per storage entity.

pub mod contact_sessions;
pub mod conversations;
pub mod jobs;
pub mod threads;
