#![forbid(unsafe_code)]

//! The runtime type safety toggle is process-wide, so it gets its own test
//! binary and a single test that restores the previous setting.

use bundles::prelude::*;
use bundles::{BundlesConfig, ErasedValue, TypeTag, runtime_type_safety, set_runtime_type_safety};

#[test]
fn toggling_type_safety() {
    let registry = PropertyRegistry::new();
    let count: Property<i32> = registry.register("count").unwrap();
    let initial = runtime_type_safety();

    // Enabled: a wrongly typed write is rejected.
    BundlesConfig::default().with_runtime_type_safety(true).apply();
    let mut bundle = create_bundle();
    assert!(matches!(
        bundle.set_erased(&Public, count.erased(), ErasedValue::new("three")),
        Err(BundleError::TypeMismatch { .. })
    ));
    assert!(bundle.is_empty());

    // Disabled: the write goes through, typed reads report the mismatch.
    let previous = set_runtime_type_safety(false);
    assert!(previous);
    bundle
        .set_erased(&Public, count.erased(), ErasedValue::new("three"))
        .unwrap();
    assert!(bundle.has_property(&count));
    assert_eq!(
        bundle.get(&count),
        Err(BundleError::TypeMismatch {
            property: "count".into(),
            expected: TypeTag::of::<i32>(),
            found: TypeTag::of::<&str>(),
        })
    );

    // Permissions are still enforced with type checks off.
    struct Admin;
    impl Permission for Admin {}
    let guarded: Property<i32, Admin> = registry.register("guarded").unwrap();
    assert!(matches!(
        bundle.set_erased(&Public, guarded.erased(), ErasedValue::new(1_i32)),
        Err(BundleError::PermissionDenied { .. })
    ));

    set_runtime_type_safety(initial);
    assert_eq!(runtime_type_safety(), initial);
}
