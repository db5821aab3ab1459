#![forbid(unsafe_code)]

//! A stored `(property, value)` pair.

use std::fmt;

use bundles_core::{ErasedProperty, ErasedValue, Permission, Property, PropertyValue};

/// One explicitly stored value of a bundle.
///
/// Equality compares the property name and the value.
#[derive(Clone, PartialEq)]
pub struct BundleEntry {
    property: ErasedProperty,
    value: ErasedValue,
}

impl BundleEntry {
    /// Typed constructor; the value type is checked at compile time.
    #[must_use]
    pub fn new<T: PropertyValue, P: Permission>(property: &Property<T, P>, value: T) -> Self {
        Self {
            property: property.erased().clone(),
            value: ErasedValue::new(value),
        }
    }

    /// Untyped constructor. Nothing is validated here; bundles validate on
    /// write, the serializer on decode.
    #[must_use]
    pub fn from_parts(property: ErasedProperty, value: ErasedValue) -> Self {
        Self { property, value }
    }

    #[must_use]
    pub fn property(&self) -> &ErasedProperty {
        &self.property
    }

    #[must_use]
    pub fn value(&self) -> &ErasedValue {
        &self.value
    }

    /// The value as `T`, if it has that type.
    #[must_use]
    pub fn value_as<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    #[must_use]
    pub fn into_parts(self) -> (ErasedProperty, ErasedValue) {
        (self.property, self.value)
    }

    pub(crate) fn replace_value(&mut self, value: ErasedValue) -> ErasedValue {
        std::mem::replace(&mut self.value, value)
    }
}

impl fmt::Debug for BundleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {:?}", self.property.name(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundles_core::Public;

    #[test]
    fn typed_entry_exposes_value() {
        let p: Property<i32> = Property::simple("count");
        let entry = BundleEntry::new(&p, 3);
        assert_eq!(entry.property().name(), "count");
        assert_eq!(entry.value_as::<i32>(), Some(&3));
        assert_eq!(entry.value_as::<u32>(), None);
    }

    #[test]
    fn equality_uses_name_and_value() {
        let a: Property<i32> = Property::simple("count");
        let b: Property<i32> = Property::simple_with_default("count", 9);
        assert_eq!(BundleEntry::new(&a, 1), BundleEntry::new(&b, 1));
        assert_ne!(BundleEntry::new(&a, 1), BundleEntry::new(&a, 2));
    }

    #[test]
    fn debug_shows_name_and_value() {
        let p: Property<String, Public> = Property::simple("title");
        let entry = BundleEntry::new(&p, "x".to_string());
        assert_eq!(format!("{entry:?}"), "title => \"x\"");
    }
}
