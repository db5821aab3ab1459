#![forbid(unsafe_code)]

//! Initial population of a bundle.

use bundles_core::{ErasedProperty, ErasedValue, Permission, Property, PropertyValue};

use crate::bundle::Bundle;
use crate::entry::BundleEntry;

/// Populates a bundle before anyone can observe it.
///
/// Writes made here bypass permission checks and fire no change events; the
/// typed methods still enforce value types at compile time.
///
/// ```
/// use bundles_core::Property;
/// use bundles_runtime::Bundle;
///
/// let width: Property<u32> = Property::simple("width");
/// let bundle = Bundle::build(|b| {
///     b.set(&width, 80).set(&width, 120);
/// });
/// assert_eq!(bundle.get(&width).unwrap(), 120);
/// assert_eq!(bundle.len(), 1);
/// ```
#[derive(Debug)]
pub struct BundleBuilder<'a> {
    bundle: &'a mut Bundle,
}

impl<'a> BundleBuilder<'a> {
    pub(crate) fn new(bundle: &'a mut Bundle) -> Self {
        Self { bundle }
    }

    /// Store `value`, replacing an earlier value for the same property.
    pub fn set<T: PropertyValue, P: Permission>(
        &mut self,
        property: &Property<T, P>,
        value: T,
    ) -> &mut Self {
        self.bundle
            .insert_unchecked(property.erased().clone(), ErasedValue::new(value));
        self
    }

    pub fn set_erased(&mut self, property: ErasedProperty, value: ErasedValue) -> &mut Self {
        self.bundle.insert_unchecked(property, value);
        self
    }

    pub fn entry(&mut self, entry: BundleEntry) -> &mut Self {
        let (property, value) = entry.into_parts();
        self.bundle.insert_unchecked(property, value);
        self
    }
}
