#![forbid(unsafe_code)]

//! Log subscriber installation.
//!
//! Library code only emits `tracing` events; nothing is printed unless the
//! application installs a subscriber. With the `tracing-json` feature this
//! module provides [`init`], which installs a global subscriber configured
//! from [`BundlesConfig`](crate::config::BundlesConfig).
//!
//! Targets used by the workspace:
//!
//! | Target | Events |
//! |--------|--------|
//! | `bundles_core::registry` | registrations, conflicts |
//! | `bundles_runtime::bundle` | effective set/delete, reactive cells |
//! | `bundles_serde::serializer` | encode/decode summaries |

#[cfg(feature = "tracing-json")]
pub use enabled::init;

#[cfg(feature = "tracing-json")]
mod enabled {
    use tracing_subscriber::EnvFilter;

    use crate::config::{BundlesConfig, LogFormat};

    /// Install a global subscriber. Returns `false` if one was already set.
    pub fn init(config: &BundlesConfig) -> bool {
        let filter =
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        match config.log_format {
            LogFormat::Json => builder.json().try_init().is_ok(),
            LogFormat::Pretty => builder.try_init().is_ok(),
        }
    }
}
