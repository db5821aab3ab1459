#![forbid(unsafe_code)]

//! Write permissions.
//!
//! A permission is a value of a marker type implementing [`Permission`].
//! Properties name the *kind* they require ([`PermissionKind`], compared by
//! type identity, never by name). Code that cannot construct a value of the
//! required type cannot write the property.
//!
//! ```
//! use bundles_core::permission::{Permission, PermissionKind, Public};
//!
//! struct Internal;
//! impl Permission for Internal {}
//!
//! assert!(Public.grants(PermissionKind::of::<Public>()));
//! assert!(!Public.grants(PermissionKind::of::<Internal>()));
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a permission type.
#[derive(Clone, Copy)]
pub struct PermissionKind {
    id: TypeId,
    name: &'static str,
}

impl PermissionKind {
    /// Kind issued by the permission type `P`.
    #[must_use]
    pub fn of<P: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: std::any::type_name::<P>(),
        }
    }

    /// Fully qualified name of the issuing type. Used as the serialized tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of [`name`](Self::name).
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for PermissionKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PermissionKind {}

impl Hash for PermissionKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionKind({})", self.name)
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<permission: {}>", self.short_name())
    }
}

/// A capability token required to write properties.
///
/// Implement on a unit struct. Override [`grants`](Permission::grants) to let
/// one permission stand in for others (e.g. an admin token that can write
/// everything a `Public` token can).
pub trait Permission: Send + Sync + 'static {
    /// The kind this token was issued as.
    fn kind(&self) -> PermissionKind {
        PermissionKind::of::<Self>()
    }

    /// Whether this token satisfies a property requiring `required`.
    fn grants(&self, required: PermissionKind) -> bool {
        self.kind() == required
    }
}

/// Permission held by everyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Public;

impl Permission for Public {}
