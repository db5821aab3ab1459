#![forbid(unsafe_code)]

//! Error taxonomy for property and bundle operations.
//!
//! Every failure is reported synchronously to the caller of the operation
//! that caused it; nothing is retried or swallowed. Messages always name the
//! offending property so that collisions between independently defined
//! properties can be traced.

use std::fmt;

use crate::permission::PermissionKind;
use crate::property::PropertySignature;
use crate::value::TypeTag;

/// Errors from property registration and bundle access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    /// Neither an explicit entry nor a default value exists.
    NoValue { property: String },
    /// `delete` targeted a property without an explicit entry.
    NotPresent { property: String },
    /// The permission passed to a write does not satisfy the property.
    PermissionDenied {
        property: String,
        required: PermissionKind,
        found: PermissionKind,
    },
    /// A value does not have the property's declared type.
    TypeMismatch {
        property: String,
        expected: TypeTag,
        found: TypeTag,
    },
    /// A name was registered twice with different signatures.
    ConflictingPropertyDefinition {
        existing: PropertySignature,
        attempted: PropertySignature,
    },
    /// A signature without a value type was offered to the registry.
    UntypedRegistration { property: String },
    /// A serialized type or permission tag does not resolve in this process.
    UnknownType { tag: String },
}

impl BundleError {
    /// Name of the property involved, if the error concerns one.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::NoValue { property }
            | Self::NotPresent { property }
            | Self::PermissionDenied { property, .. }
            | Self::TypeMismatch { property, .. }
            | Self::UntypedRegistration { property } => Some(property),
            Self::ConflictingPropertyDefinition { existing, .. } => Some(existing.name()),
            Self::UnknownType { .. } => None,
        }
    }
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoValue { property } => {
                write!(f, "no value for property '{property}' and no default")
            }
            Self::NotPresent { property } => {
                write!(f, "cannot delete property '{property}': not present")
            }
            Self::PermissionDenied {
                property,
                required,
                found,
            } => write!(
                f,
                "{found} cannot write property '{property}' (requires {required})"
            ),
            Self::TypeMismatch {
                property,
                expected,
                found,
            } => write!(
                f,
                "property '{property}' holds {expected}, got a value of type {found}"
            ),
            Self::ConflictingPropertyDefinition {
                existing,
                attempted,
            } => write!(
                f,
                "two properties with same name but conflicting signatures: {attempted} != {existing}"
            ),
            Self::UntypedRegistration { property } => write!(
                f,
                "property '{property}' has no value type; simple properties are not registered"
            ),
            Self::UnknownType { tag } => write!(f, "unknown type tag: {tag}"),
        }
    }
}

impl std::error::Error for BundleError {}
