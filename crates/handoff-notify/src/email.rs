// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML rendering of escalation notification email.

use handoff_core::EscalationNotification;

/// A rendered notification, ready for the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    /// HTML body.
    pub body: String,
}

/// Render the escalation notification for the support team.
///
/// `excerpt` is the resolved latest customer message, if any; the caller is
/// responsible for recovering it from the thread when the job carried none.
pub fn render_escalation(
    job: &EscalationNotification,
    excerpt: Option<&str>,
    dashboard_url: &str,
) -> RenderedEmail {
    let subject = match job.context.as_ref() {
        Some(ctx) => format!("A customer requested support: {}", ctx.customer_name),
        None => "A conversation needs human attention".to_string(),
    };

    let mut body = String::from(
        "<h2>Conversation escalated</h2>\n\
         <p>A conversation has been escalated to your support team.</p>\n",
    );

    if let Some(ctx) = job.context.as_ref() {
        body.push_str(&format!(
            "<p><strong>Customer:</strong> {} &lt;{}&gt;</p>\n",
            escape_html(&ctx.customer_name),
            escape_html(&ctx.customer_email)
        ));
    }
    match excerpt {
        Some(text) => body.push_str(&format!(
            "<p><strong>Last message:</strong> {}</p>\n",
            escape_html(text)
        )),
        None => body.push_str("<p><strong>Last message:</strong> <em>(no customer message yet)</em></p>\n"),
    }
    body.push_str(&format!(
        "<p><a href=\"{}/conversations/{}\">Open the conversation in your dashboard</a></p>\n",
        dashboard_url.trim_end_matches('/'),
        job.conversation_id
    ));

    RenderedEmail { subject, body }
}

/// Minimal HTML escaping for customer-provided text.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::CustomerContext;

    fn job(context: Option<CustomerContext>) -> EscalationNotification {
        EscalationNotification {
            conversation_id: "c-42".to_string(),
            organization_id: "org-1".to_string(),
            thread_id: "t-42".to_string(),
            context,
        }
    }

    #[test]
    fn customer_context_drives_subject_and_body() {
        let rendered = render_escalation(
            &job(Some(CustomerContext {
                customer_name: "Ada".to_string(),
                customer_email: "ada@example.com".to_string(),
                last_message: None,
            })),
            Some("my invoice is wrong"),
            "https://app.example.com/",
        );

        assert_eq!(rendered.subject, "A customer requested support: Ada");
        assert!(rendered.body.contains("Ada &lt;ada@example.com&gt;"));
        assert!(rendered.body.contains("my invoice is wrong"));
        assert!(
            rendered
                .body
                .contains("https://app.example.com/conversations/c-42")
        );
    }

    #[test]
    fn contextless_job_gets_generic_subject() {
        let rendered = render_escalation(&job(None), None, "https://app.example.com");
        assert_eq!(rendered.subject, "A conversation needs human attention");
        assert!(!rendered.body.contains("Customer:"));
        assert!(rendered.body.contains("(no customer message yet)"));
    }

    #[test]
    fn customer_text_is_html_escaped() {
        let rendered = render_escalation(
            &job(None),
            Some("<script>alert('x')</script>"),
            "https://app.example.com",
        );
        assert!(!rendered.body.contains("<script>"));
        assert!(rendered.body.contains("&lt;script&gt;"));
    }
}
