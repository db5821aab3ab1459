#![forbid(unsafe_code)]

//! The bundle: a permission-checked, observable property map.
//!
//! # Design
//!
//! Explicit values live in an insertion-ordered inline vector; bundles are
//! usually small, so lookups are a linear scan by property name. Properties
//! without an explicit value fall back to the default carried by the handle
//! used for the read.
//!
//! Reactive cells are reached through a table of `Weak` sinks keyed by
//! property. The bundle never keeps a cell alive: once every view handed out
//! by [`Bundle::get_reactive`] is dropped, the next call creates a new cell.
//! Dead entries are pruned whenever the table is touched.
//!
//! # Invariants
//!
//! 1. At most one entry per property name.
//! 2. `entries()` yields entries in first-insertion order; replacing a value
//!    keeps its position, deleting preserves the order of the rest.
//! 3. Exactly one [`BundleChange`] fires per effective mutation, before any
//!    reactive push, and never for a no-op set.
//! 4. While a reactive view for a property is alive, its value equals what
//!    `get` returns through the property handle that last wrote it.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `PermissionDenied` | Token does not grant the property's kind | Nothing changes |
//! | `TypeMismatch` on write | Wrong value type, type safety on | Nothing changes |
//! | `NotPresent` | Delete of an absent property | Nothing changes |
//! | `NoValue` on delete | Live reactive cell, no default to reset to | Entry removed and event fired, then error |
//! | Panicking subscriber | Bug in a `changed` or reactive callback | Unwinds through the mutator |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use bundles_core::{
    BundleError, ErasedProperty, ErasedValue, Permission, Property, PropertyValue, TypeTag,
};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::builder::BundleBuilder;
use crate::change::{BundleChange, BundleId};
use crate::entry::BundleEntry;
use crate::reactive::variable::ReactiveSink;
use crate::reactive::{EventStream, ReactiveValue, ReactiveVariable};

const INLINE_ENTRIES: usize = 8;

/// A map from properties to values with permission-checked writes, default
/// fallback, change events and reactive views.
///
/// `!Send`: the change stream and reactive cells are `Rc`-based.
///
/// ```
/// use bundles_core::{Property, Public};
/// use bundles_runtime::Bundle;
///
/// let score: Property<i32> = Property::simple_with_default("score", 0);
/// let mut bundle = Bundle::new();
/// bundle.set(&Public, &score, 5).unwrap();
/// assert_eq!(bundle.get(&score).unwrap(), 5);
/// bundle.delete(&Public, &score).unwrap();
/// assert_eq!(bundle.get(&score).unwrap(), 0);
/// ```
pub struct Bundle {
    id: BundleId,
    entries: SmallVec<[BundleEntry; INLINE_ENTRIES]>,
    reactive: RefCell<HashMap<ErasedProperty, Weak<dyn ReactiveSink>>>,
    changed: EventStream<BundleChange>,
}

impl Default for Bundle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("id", &self.id)
            .field("entries", &self.entries)
            .field("reactive_cells", &self.reactive.borrow().len())
            .field("subscribers", &self.changed.subscriber_count())
            .finish()
    }
}

impl Bundle {
    /// An empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: BundleId::next(),
            entries: SmallVec::new(),
            reactive: RefCell::new(HashMap::new()),
            changed: EventStream::new(),
        }
    }

    /// A bundle holding `entries`. A later entry for the same property
    /// replaces an earlier one. No checks, no events.
    pub fn from_entries(entries: impl IntoIterator<Item = BundleEntry>) -> Self {
        let mut bundle = Self::new();
        for entry in entries {
            let (property, value) = entry.into_parts();
            bundle.insert_unchecked(property, value);
        }
        bundle
    }

    /// A bundle populated by `configure` through an unchecked builder.
    pub fn build(configure: impl FnOnce(&mut BundleBuilder<'_>)) -> Self {
        let mut bundle = Self::new();
        configure(&mut BundleBuilder::new(&mut bundle));
        bundle
    }

    #[must_use]
    pub fn id(&self) -> BundleId {
        self.id
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Explicit entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &BundleEntry> {
        self.entries.iter()
    }

    /// Owned copy of the explicit entries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BundleEntry> {
        self.entries.to_vec()
    }

    /// Whether an explicit value is stored. Defaults do not count.
    #[must_use]
    pub fn has_property(&self, property: impl AsRef<ErasedProperty>) -> bool {
        self.position(property.as_ref()).is_some()
    }

    /// Stored value, else the property default.
    pub fn get<T: PropertyValue, P: Permission>(
        &self,
        property: &Property<T, P>,
    ) -> Result<T, BundleError> {
        let value = self.get_erased(property.erased())?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| BundleError::TypeMismatch {
                property: property.name().to_owned(),
                expected: TypeTag::of::<T>(),
                found: value.type_tag(),
            })
    }

    /// Untyped [`get`](Self::get).
    pub fn get_erased<'a>(
        &'a self,
        property: &'a ErasedProperty,
    ) -> Result<&'a ErasedValue, BundleError> {
        if let Some(index) = self.position(property) {
            return Ok(self.entries[index].value());
        }
        property.default_value().ok_or_else(|| BundleError::NoValue {
            property: property.name().to_owned(),
        })
    }

    /// A live view of `property` in this bundle.
    ///
    /// Requires a default, which the view falls back to when the property is
    /// deleted. While any view is alive, repeated calls return views of the
    /// same cell.
    pub fn get_reactive<T: PropertyValue, P: Permission>(
        &self,
        property: &Property<T, P>,
    ) -> Result<ReactiveValue<T>, BundleError> {
        let erased = property.erased();
        if erased.default_value().is_none() {
            return Err(BundleError::NoValue {
                property: erased.name().to_owned(),
            });
        }
        if let Some(sink) = self.live_sink(erased) {
            let found = sink.value_type();
            return ReactiveValue::from_sink(sink).ok_or_else(|| BundleError::TypeMismatch {
                property: erased.name().to_owned(),
                expected: TypeTag::of::<T>(),
                found,
            });
        }

        let variable = ReactiveVariable::new(self.get(property)?);
        let mut table = self.reactive.borrow_mut();
        table.retain(|_, sink| sink.strong_count() > 0);
        table.insert(erased.clone(), variable.sink());
        trace!(bundle = %self.id, property = erased.name(), "reactive cell created");
        Ok(variable.view())
    }

    /// Write `value` with `permission`.
    ///
    /// A value equal to the current one (stored, else default) is a no-op.
    pub fn set<T: PropertyValue, P: Permission>(
        &mut self,
        permission: &P,
        property: &Property<T, P>,
        value: T,
    ) -> Result<(), BundleError> {
        self.set_erased(permission, property.erased(), ErasedValue::new(value))
    }

    /// Untyped [`set`](Self::set); the value type is checked at runtime when
    /// the property declares one.
    pub fn set_erased(
        &mut self,
        permission: &dyn Permission,
        property: &ErasedProperty,
        value: ErasedValue,
    ) -> Result<(), BundleError> {
        property.check_write_access(permission, Some(&value))?;

        let index = self.position(property);
        let current = match index {
            Some(index) => Some(self.entries[index].value()),
            None => property.default_value(),
        };
        if current == Some(&value) {
            trace!(bundle = %self.id, property = property.name(), "set skipped, value unchanged");
            return Ok(());
        }

        let old_value = match index {
            Some(index) => Some(self.entries[index].replace_value(value.clone())),
            None => {
                self.entries
                    .push(BundleEntry::from_parts(property.clone(), value.clone()));
                None
            }
        };
        debug!(bundle = %self.id, property = property.name(), "property set");
        self.changed.fire(&BundleChange::new(
            self.id,
            property.clone(),
            old_value,
            Some(value.clone()),
        ));
        self.push_reactive(property, &value)
    }

    /// Remove the explicit value of `property`.
    pub fn delete<T: PropertyValue, P: Permission>(
        &mut self,
        permission: &P,
        property: &Property<T, P>,
    ) -> Result<(), BundleError> {
        self.delete_erased(permission, property.erased())
    }

    /// Untyped [`delete`](Self::delete).
    pub fn delete_erased(
        &mut self,
        permission: &dyn Permission,
        property: &ErasedProperty,
    ) -> Result<(), BundleError> {
        property.check_write_access(permission, None)?;
        let index = self
            .position(property)
            .ok_or_else(|| BundleError::NotPresent {
                property: property.name().to_owned(),
            })?;

        let (_, old_value) = self.entries.remove(index).into_parts();
        let default = property.default_value().cloned();
        debug!(bundle = %self.id, property = property.name(), "property deleted");
        self.changed.fire(&BundleChange::new(
            self.id,
            property.clone(),
            Some(old_value),
            default.clone(),
        ));

        if self.live_sink(property).is_none() {
            return Ok(());
        }
        let default = default.ok_or_else(|| BundleError::NoValue {
            property: property.name().to_owned(),
        })?;
        self.push_reactive(property, &default)
    }

    /// Change events, one per effective mutation.
    #[must_use]
    pub fn changed(&self) -> &EventStream<BundleChange> {
        &self.changed
    }

    /// Number of reactive cells still referenced outside the bundle.
    #[must_use]
    pub fn live_reactive_count(&self) -> usize {
        let mut table = self.reactive.borrow_mut();
        table.retain(|_, sink| sink.strong_count() > 0);
        table.len()
    }

    pub(crate) fn insert_unchecked(&mut self, property: ErasedProperty, value: ErasedValue) {
        match self.position(&property) {
            Some(index) => {
                self.entries[index].replace_value(value);
            }
            None => self.entries.push(BundleEntry::from_parts(property, value)),
        }
    }

    fn position(&self, property: &ErasedProperty) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.property() == property)
    }

    fn live_sink(&self, property: &ErasedProperty) -> Option<Rc<dyn ReactiveSink>> {
        let mut table = self.reactive.borrow_mut();
        let sink = table.get(property)?.upgrade();
        if sink.is_none() {
            table.remove(property);
            trace!(bundle = %self.id, property = property.name(), "reactive cell pruned");
        }
        sink
    }

    fn push_reactive(
        &self,
        property: &ErasedProperty,
        value: &ErasedValue,
    ) -> Result<(), BundleError> {
        let Some(sink) = self.live_sink(property) else {
            return Ok(());
        };
        sink.push(value).map_err(|expected| BundleError::TypeMismatch {
            property: property.name().to_owned(),
            expected,
            found: value.type_tag(),
        })
    }
}
