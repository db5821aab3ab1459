#![forbid(unsafe_code)]

//! Process-wide runtime type safety toggle.
//!
//! When enabled (the default), writes to type-safe properties verify the
//! value's [`TypeTag`](crate::value::TypeTag) against the declared one and
//! fail with [`BundleError::TypeMismatch`](crate::error::BundleError) on a
//! mismatch. When disabled, values are trusted and the check is skipped.
//!
//! The toggle is **global**: it affects every bundle and every thread in the
//! process, never a single bundle. Its initial value comes from the
//! `BUNDLES_RUNTIME_TYPE_SAFETY` environment variable, read once.
//!
//! Typed reads (`Bundle::get`) still downcast and report a mismatch even
//! while the toggle is off.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Environment variable holding the initial toggle value.
pub const TYPE_SAFETY_ENV: &str = "BUNDLES_RUNTIME_TYPE_SAFETY";

static RUNTIME_TYPE_SAFETY: OnceLock<AtomicBool> = OnceLock::new();

#[inline]
fn flag() -> &'static AtomicBool {
    RUNTIME_TYPE_SAFETY
        .get_or_init(|| AtomicBool::new(type_safety_from_env(|key| std::env::var(key).ok())))
}

/// Parse a boolean-ish environment value. Unrecognized values yield `None`.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Compute the initial toggle value using a custom environment lookup.
///
/// Missing or unparseable values leave type safety on.
#[must_use]
pub fn type_safety_from_env<F>(get_env: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    get_env(TYPE_SAFETY_ENV)
        .and_then(|value| parse_flag(&value))
        .unwrap_or(true)
}

/// Whether write-time value type checks run.
#[inline]
#[must_use]
pub fn runtime_type_safety() -> bool {
    flag().load(Ordering::Relaxed)
}

/// Enable or disable write-time value type checks for the whole process.
///
/// Returns the previous setting.
pub fn set_runtime_type_safety(enabled: bool) -> bool {
    let previous = flag().swap(enabled, Ordering::Relaxed);
    if previous != enabled {
        tracing::info!(enabled, "runtime type safety changed");
    }
    previous
}
