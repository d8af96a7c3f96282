// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./handoff.toml` > `~/.config/handoff/handoff.toml`
//! > `/etc/handoff/handoff.toml` with environment variable overrides via
//! the `HANDOFF_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HandoffConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/handoff/handoff.toml` (system-wide)
/// 3. `~/.config/handoff/handoff.toml` (user XDG config)
/// 4. `./handoff.toml` (local directory)
/// 5. `HANDOFF_*` environment variables
pub fn load_config() -> Result<HandoffConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(Toml::file("/etc/handoff/handoff.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("handoff/handoff.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("handoff.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<HandoffConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HandoffConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `HANDOFF_NOTIFY_FROM_EMAIL` must map to
/// `notify.from_email`, not `notify.from.email`.
fn env_provider() -> Env {
    Env::prefixed("HANDOFF_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: HANDOFF_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("session_", "session.", 1)
            .replacen("widget_", "widget.", 1)
            .replacen("notify_", "notify.", 1)
            .replacen("smtp_", "smtp.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn str_loader_applies_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8230);
        assert_eq!(config.session.ttl_minutes, 1440);
    }

    #[test]
    fn str_loader_rejects_unknown_section() {
        let result = load_config_from_str("[telepathy]\nenabled = true\n");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn env_overrides_map_to_dotted_keys() {
        // SAFETY: test is serialized; no other thread touches the environment.
        unsafe {
            std::env::set_var("HANDOFF_SERVER_PORT", "9999");
            std::env::set_var("HANDOFF_NOTIFY_FROM_EMAIL", "alerts@example.com");
        }

        let config: HandoffConfig = Figment::new()
            .merge(Serialized::defaults(HandoffConfig::default()))
            .merge(env_provider())
            .extract()
            .unwrap();

        unsafe {
            std::env::remove_var("HANDOFF_SERVER_PORT");
            std::env::remove_var("HANDOFF_NOTIFY_FROM_EMAIL");
        }

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.notify.from_email, "alerts@example.com");
    }
}
