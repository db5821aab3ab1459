#![forbid(unsafe_code)]

//! Process configuration for bundles.

use crate::type_safety::{self, parse_flag};

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "BUNDLES_LOG";
/// Environment variable selecting the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "BUNDLES_LOG_FORMAT";

/// Output format for installed log subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse `json` / `pretty` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Configuration for the bundles runtime.
#[derive(Debug, Clone)]
pub struct BundlesConfig {
    /// Verify value types on writes to type-safe properties.
    pub runtime_type_safety: bool,
    /// `tracing` filter directive, e.g. `bundles_runtime=debug`.
    pub log_filter: String,
    /// Format for [`logging::init`](crate::logging).
    pub log_format: LogFormat,
}

impl Default for BundlesConfig {
    fn default() -> Self {
        Self {
            runtime_type_safety: true,
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl BundlesConfig {
    /// Defaults overridden by `BUNDLES_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(enabled) = get_env(type_safety::TYPE_SAFETY_ENV).and_then(|v| parse_flag(&v)) {
            config.runtime_type_safety = enabled;
        }
        if let Some(filter) = get_env(LOG_FILTER_ENV).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(format) = get_env(LOG_FORMAT_ENV).and_then(|v| LogFormat::parse(&v)) {
            config.log_format = format;
        }
        config
    }

    /// Set runtime type safety.
    #[must_use]
    pub fn with_runtime_type_safety(mut self, enabled: bool) -> Self {
        self.runtime_type_safety = enabled;
        self
    }

    /// Set the log filter directive.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Set the log format.
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Push the process-wide settings (currently the type safety toggle).
    pub fn apply(&self) {
        type_safety::set_runtime_type_safety(self.runtime_type_safety);
    }
}
