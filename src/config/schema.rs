//! Configuration schema definitions.
//!
//! This module defines the configuration structure of the host server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

use crate::admin::views::ViewConfig;

/// An option that was either left out or explicitly given.
///
/// `Set(None)` or `Set(String::new())` are real values and are applied;
/// only `Unset` falls back to the component's own default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Setting<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Setting<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Setting::Set(_))
    }

    pub fn is_unset(&self) -> bool {
        !self.is_set()
    }

    pub fn as_ref(&self) -> Setting<&T> {
        match self {
            Setting::Set(value) => Setting::Set(value),
            Setting::Unset => Setting::Unset,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Setting<U> {
        match self {
            Setting::Set(value) => Setting::Set(f(value)),
            Setting::Unset => Setting::Unset,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Setting::Set(value) => Some(value),
            Setting::Unset => None,
        }
    }

    /// Overwrite `target` only when a value was given.
    pub fn apply_to(self, target: &mut T) {
        if let Setting::Set(value) = self {
            *target = value;
        }
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Setting::Set(value)
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Setting::Set(value) => value.serialize(serializer),
            Setting::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Setting::Set)
    }
}

/// Root configuration of the host server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin mount options.
    pub admin: AdminSection,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "admin_mount=debug,tower_http=debug".to_string(),
            json_logs: false,
        }
    }
}

/// Admin mount options as written in the config file.
///
/// Every field is optional; omitted fields keep the admin site's defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminSection {
    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub base_url: Setting<String>,

    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub title: Setting<String>,

    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub logo_url: Setting<String>,

    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub templates_dir: Setting<PathBuf>,

    /// Largest accepted admin form submission, in bytes.
    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub max_form_bytes: Setting<usize>,

    /// Bearer token required for every admin request.
    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub api_key: Setting<String>,

    #[serde(skip_serializing_if = "Setting::is_unset")]
    pub views: Setting<Vec<ViewConfig>>,
}
