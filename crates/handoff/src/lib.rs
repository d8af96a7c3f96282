// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handoff service wiring: HTTP surface and the serve composition root.
//!
//! Split out of the binary so integration tests can build the router
//! against an in-memory engine.

pub mod http;
pub mod serve;
