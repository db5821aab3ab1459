//! Property-based invariant tests for `PropertyRegistry`.
//!
//! Random sequences of registrations over a few names and signatures are
//! applied to a registry and to a map recording the first signature seen per
//! name. After every step:
//!
//! 1. The first registration of a name always succeeds and fixes its signature.
//! 2. A later registration succeeds iff its signature equals the fixed one.
//! 3. A rejected registration reports both signatures and leaves the table as is.
//! 4. `len` equals the number of distinct names registered.
//! 5. `lookup` returns the fixed signature, and `lookup_typed` agrees with it.
//! 6. Offering an untyped signature never changes the table.

use std::collections::HashMap;

use bundles_core::{
    BundleError, ErasedProperty, Permission, PermissionKind, Property, PropertyRegistry,
    PropertySignature, Public,
};
use proptest::prelude::*;

struct Admin;
impl Permission for Admin {}

const NAMES: [&str; 3] = ["width", "title", "visible"];

#[derive(Debug, Clone, Copy)]
enum Shape {
    I32Public,
    BoolPublic,
    I32Admin,
    Untyped,
}

#[derive(Debug, Clone)]
struct Step {
    name: usize,
    shape: Shape,
}

// ── Strategies ────────────────────────────────────────────────────────────

fn step_strategy() -> impl Strategy<Value = Step> {
    let shape = prop_oneof![
        3 => Just(Shape::I32Public),
        2 => Just(Shape::BoolPublic),
        2 => Just(Shape::I32Admin),
        1 => Just(Shape::Untyped),
    ];
    (0..NAMES.len(), shape).prop_map(|(name, shape)| Step { name, shape })
}

fn register(registry: &PropertyRegistry, step: &Step) -> Result<PropertySignature, BundleError> {
    let name = NAMES[step.name];
    match step.shape {
        Shape::I32Public => registry
            .register::<i32, Public>(name)
            .map(|p| p.erased().signature().clone()),
        Shape::BoolPublic => registry
            .register::<bool, Public>(name)
            .map(|p| p.erased().signature().clone()),
        Shape::I32Admin => registry
            .register::<i32, Admin>(name)
            .map(|p| p.erased().signature().clone()),
        Shape::Untyped => {
            let simple = ErasedProperty::simple(name, PermissionKind::of::<Public>(), None);
            registry
                .register_erased(simple.signature().clone(), None)
                .map(|p| p.signature().clone())
        }
    }
}

// ── Invariants ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn registry_matches_first_signature_model(
        steps in proptest::collection::vec(step_strategy(), 1..40)
    ) {
        let registry = PropertyRegistry::new();
        let mut fixed: HashMap<&str, PropertySignature> = HashMap::new();

        for step in &steps {
            let name = NAMES[step.name];
            let result = register(&registry, step);
            let first = fixed.get(name).cloned();

            match (step.shape, first, result) {
                (Shape::Untyped, _, result) => {
                    prop_assert_eq!(
                        result,
                        Err(BundleError::UntypedRegistration { property: name.to_owned() })
                    );
                }
                (_, None, Ok(signature)) => {
                    fixed.insert(name, signature);
                }
                (_, Some(first), Ok(signature)) => {
                    prop_assert_eq!(first, signature);
                }
                (
                    _,
                    Some(first),
                    Err(BundleError::ConflictingPropertyDefinition { existing, attempted }),
                ) => {
                    prop_assert_eq!(&first, &existing);
                    prop_assert_ne!(&existing, &attempted);
                    prop_assert_eq!(attempted.name(), name);
                }
                (_, _, Err(other)) => {
                    prop_assert!(false, "unexpected error: {other}");
                }
            }

            prop_assert_eq!(registry.len(), fixed.len());
            for (name, signature) in &fixed {
                let looked_up = registry.lookup(name);
                prop_assert_eq!(
                    looked_up.as_ref().map(ErasedProperty::signature),
                    Some(signature)
                );
            }
        }
    }

    #[test]
    fn typed_lookup_agrees_with_registration(
        steps in proptest::collection::vec(step_strategy(), 1..20)
    ) {
        let registry = PropertyRegistry::new();
        for step in &steps {
            let _ = register(&registry, step);
        }
        for name in NAMES {
            let Some(erased) = registry.lookup(name) else {
                prop_assert!(registry.lookup_typed::<i32, Public>(name).unwrap().is_none());
                continue;
            };
            let as_i32: Result<Option<Property<i32>>, _> = registry.lookup_typed(name);
            let expected = erased.value_type().is_some_and(|t| t.is::<i32>())
                && erased.permission() == PermissionKind::of::<Public>();
            prop_assert_eq!(as_i32.is_ok(), expected);
        }
    }
}
