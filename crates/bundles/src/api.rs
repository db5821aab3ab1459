#![forbid(unsafe_code)]

//! Entry points.

use bundles_core::BundlesConfig;
use bundles_runtime::{Bundle, BundleBuilder, BundleEntry};
use tracing::info;

/// An empty bundle.
#[must_use]
pub fn create_bundle() -> Bundle {
    Bundle::new()
}

/// A bundle holding `entries`, later entries replacing earlier ones for the
/// same property. No permission checks, no events.
pub fn create_bundle_from(entries: impl IntoIterator<Item = BundleEntry>) -> Bundle {
    Bundle::from_entries(entries)
}

/// A bundle populated through an unchecked builder.
///
/// ```
/// use bundles::prelude::*;
///
/// let volume: Property<u8> = Property::simple_with_default("volume", 50);
/// let muted: Property<bool> = Property::simple("muted");
/// let bundle = create_bundle_with(|b| {
///     b.set(&volume, 80).set(&muted, false);
/// });
/// assert_eq!(bundle.get(&volume).unwrap(), 80);
/// assert!(bundle.has_property(&muted));
/// ```
pub fn create_bundle_with(configure: impl FnOnce(&mut BundleBuilder<'_>)) -> Bundle {
    Bundle::build(configure)
}

/// Apply `config` to the process: sets the runtime type safety toggle and,
/// with the `tracing-json` feature, installs a log subscriber.
///
/// Returns `true` if a subscriber was installed by this call.
pub fn init(config: &BundlesConfig) -> bool {
    config.apply();
    #[cfg(feature = "tracing-json")]
    let installed = bundles_core::logging::init(config);
    #[cfg(not(feature = "tracing-json"))]
    let installed = false;
    info!(
        runtime_type_safety = config.runtime_type_safety,
        subscriber = installed,
        "bundles initialised"
    );
    installed
}
