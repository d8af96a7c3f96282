// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Handoff service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Handoff configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Contact session lifetime settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Widget-facing behavior settings.
    #[serde(default)]
    pub widget: WidgetConfig,

    /// Escalation notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// SMTP transport settings for outgoing notification email.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8230
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("handoff/handoff.db").display().to_string())
        .unwrap_or_else(|| "handoff.db".to_string())
}

/// Contact session lifetime configuration.
///
/// Sessions act as authorization capabilities for anonymous visitors: any
/// write requires an unexpired session, and use of a session nearing expiry
/// extends it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Lifetime of a fresh or refreshed session, in minutes.
    #[serde(default = "default_session_ttl")]
    pub ttl_minutes: u64,

    /// Remaining lifetime below which use of a session refreshes it.
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl(),
            refresh_threshold_minutes: default_refresh_threshold(),
        }
    }
}

fn default_session_ttl() -> u64 {
    24 * 60
}

fn default_refresh_threshold() -> u64 {
    2 * 60
}

/// Widget-facing behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    /// Assistant greeting seeded into every new conversation thread.
    #[serde(default = "default_greet_message")]
    pub greet_message: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            greet_message: default_greet_message(),
        }
    }
}

fn default_greet_message() -> String {
    "Hello, how can I help you today?".to_string()
}

/// Escalation notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// When false, the worker drains jobs without sending email.
    #[serde(default)]
    pub enabled: bool,

    /// Support team addresses to notify on escalation.
    #[serde(default)]
    pub notify_emails: Vec<String>,

    /// From address for notification email.
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From display name for notification email.
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Optional reply-to address.
    #[serde(default)]
    pub reply_to: Option<String>,

    /// Dashboard URL linked from notification email.
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,

    /// Worker poll interval when the queue is empty, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_emails: Vec::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            reply_to: None,
            dashboard_url: default_dashboard_url(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_from_email() -> String {
    "support@localhost".to_string()
}

fn default_from_name() -> String {
    "Handoff".to_string()
}

fn default_dashboard_url() -> String {
    "http://localhost:3000/conversations".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

/// SMTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    #[serde(default)]
    pub host: String,

    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Optional SMTP username.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional SMTP password.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: None,
            password: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = HandoffConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8230);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.session.ttl_minutes, 24 * 60);
        assert_eq!(config.session.refresh_threshold_minutes, 2 * 60);
        assert_eq!(
            config.widget.greet_message,
            "Hello, how can I help you today?"
        );
        assert!(!config.notify.enabled);
        assert!(config.notify.notify_emails.is_empty());
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[widget]
greet_message = "hi"
greeet_color = "blue"
"#;
        let result = toml::from_str::<HandoffConfig>(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let toml_str = r#"
[server]
port = 9000

[notify]
enabled = true
notify_emails = ["ops@example.com"]
"#;
        let config: HandoffConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.notify.enabled);
        assert_eq!(config.notify.notify_emails, vec!["ops@example.com"]);
        assert_eq!(config.notify.from_name, "Handoff");
    }
}
