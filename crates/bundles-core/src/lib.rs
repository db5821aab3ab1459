#![forbid(unsafe_code)]

//! Core: property descriptors, permissions, value tags and the registry.
//!
//! # Role in bundles
//! `bundles-core` is the identity layer. It owns everything a property *is*
//! (name, value type, permission kind, default) and the registry that keeps
//! names unambiguous. It never stores values for a property; that is the job
//! of `bundles-runtime::Bundle`.
//!
//! # Primary responsibilities
//! - **Permission**: capability tokens gating writes, compared by issuing type.
//! - **TypeTag / ErasedValue**: runtime type identity and type-erased values.
//! - **Property**: typed handle over a shared, immutable descriptor.
//! - **PropertyRegistry**: name → signature table rejecting conflicting
//!   redefinitions.
//! - **Runtime type safety**: the process-wide toggle for write-time checks.
//!
//! # How it fits in the system
//! The runtime crate stores `ErasedValue`s keyed by `ErasedProperty` and asks
//! the property to validate every write. The serializer resolves type tags
//! and permission tags back into descriptors through the registry.

pub mod config;
pub mod error;
pub mod logging;
pub mod permission;
pub mod property;
pub mod registry;
pub mod type_safety;
pub mod value;

pub use config::{BundlesConfig, LogFormat};
pub use error::BundleError;
pub use permission::{Permission, PermissionKind, Public};
pub use property::{ErasedProperty, Property, PropertySignature};
pub use registry::PropertyRegistry;
pub use type_safety::{runtime_type_safety, set_runtime_type_safety};
pub use value::{DynValue, ErasedValue, PropertyValue, TypeTag};
