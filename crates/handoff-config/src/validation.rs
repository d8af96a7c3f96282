// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as host syntax, session lifetimes, and the SMTP
//! settings required when notifications are enabled.

use crate::diagnostic::ConfigError;
use crate::model::HandoffConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HandoffConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate server.host is a plausible IP or hostname.
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate database_path is not empty.
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Session lifetimes: ttl must be positive and longer than the refresh threshold.
    if config.session.ttl_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "session.ttl_minutes must be positive".to_string(),
        });
    }
    if config.session.refresh_threshold_minutes >= config.session.ttl_minutes
        && config.session.ttl_minutes > 0
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.refresh_threshold_minutes ({}) must be less than session.ttl_minutes ({})",
                config.session.refresh_threshold_minutes, config.session.ttl_minutes
            ),
        });
    }

    // Greeting must not be blank; it seeds every new thread.
    if config.widget.greet_message.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "widget.greet_message must not be empty".to_string(),
        });
    }

    // SMTP settings are only required when notifications are enabled.
    if config.notify.enabled {
        if config.smtp.host.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "smtp.host is required when notify.enabled = true".to_string(),
            });
        }
        if config.notify.notify_emails.is_empty() {
            errors.push(ConfigError::Validation {
                message: "notify.notify_emails is required when notify.enabled = true".to_string(),
            });
        }
        for (i, addr) in config.notify.notify_emails.iter().enumerate() {
            if !addr.contains('@') {
                errors.push(ConfigError::Validation {
                    message: format!("notify.notify_emails[{i}] `{addr}` is not an email address"),
                });
            }
        }
        if !config.notify.from_email.contains('@') {
            errors.push(ConfigError::Validation {
                message: format!(
                    "notify.from_email `{}` is not an email address",
                    config.notify.from_email
                ),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
