#![forbid(unsafe_code)]

//! Runtime type tags and type-erased property values.
//!
//! # Design
//!
//! A bundle stores values of many types in one map, so values are boxed
//! behind the object-safe [`DynValue`] trait. Any `T` that is
//! `Clone + PartialEq + Debug + Send + Sync + 'static` qualifies through a
//! blanket impl; there is nothing to derive.
//!
//! [`TypeTag`] is the explicit identity of a value type. It compares by
//! [`TypeId`] and carries the fully qualified type name, which the serializer
//! uses as the wire tag.
//!
//! # Invariants
//!
//! 1. Two `TypeTag`s are equal iff they were created for the same type.
//! 2. `ErasedValue` equality is `T::eq` when both sides hold the same `T`,
//!    and `false` otherwise. It never panics.
//! 3. Cloning an `ErasedValue` deep-clones the inner value.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a value type.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The [`TypeId`] this tag compares by.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, as reported by [`std::any::type_name`].
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this tag identifies `T`.
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Bound for values that can be stored in a bundle.
///
/// Implemented for every type meeting the supertraits.
pub trait PropertyValue: Any + Clone + PartialEq + fmt::Debug + Send + Sync {}

impl<T> PropertyValue for T where T: Any + Clone + PartialEq + fmt::Debug + Send + Sync {}

/// Object-safe view of a [`PropertyValue`].
pub trait DynValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn DynValue>;
    fn dyn_eq(&self, other: &dyn DynValue) -> bool;
    fn type_tag(&self) -> TypeTag;
}

impl<T: PropertyValue> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn DynValue> {
        Box::new(self.clone())
    }

    fn dyn_eq(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }
}

/// A type-erased, owned property value.
///
/// `ErasedValue` itself satisfies [`PropertyValue`], so passing one to
/// [`ErasedValue::new`] nests it. Use the value directly instead.
pub struct ErasedValue(Box<dyn DynValue>);

impl ErasedValue {
    /// Erase `value`.
    #[must_use]
    pub fn new<T: PropertyValue>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Tag of the concrete type held.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        self.0.type_tag()
    }

    /// Borrow the value as `T`, if that is what it holds.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Whether the value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Borrow the inner object.
    #[must_use]
    pub fn as_dyn(&self) -> &dyn DynValue {
        &*self.0
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl PartialEq for ErasedValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
