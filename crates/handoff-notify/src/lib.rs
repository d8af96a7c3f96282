// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation notification pipeline: durable queue dispatcher, email
//! rendering, SMTP delivery, and the draining worker.

pub mod dispatcher;
pub mod email;
pub mod mailer;
pub mod worker;

pub use dispatcher::QueueDispatcher;
pub use email::{RenderedEmail, render_escalation};
pub use mailer::{Mailer, NullMailer, OutgoingEmail, SmtpMailer};
pub use worker::NotificationWorker;
