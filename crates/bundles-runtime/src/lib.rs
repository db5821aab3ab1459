#![forbid(unsafe_code)]

//! Runtime: bundles, change events and reactive views.
//!
//! # Role in bundles
//! `bundles-runtime` stores values. A [`Bundle`] maps properties (from
//! `bundles-core`) to values, validates every write against the property's
//! permission kind and value type, falls back to defaults on read, and
//! publishes each effective mutation twice: as a [`BundleChange`] on
//! [`Bundle::changed`], then as a push into the live [`ReactiveValue`] for
//! that property, if any.
//!
//! # Threading
//! Bundles and reactive values are single-threaded (`Rc`/`RefCell`) and
//! `!Send`. Properties and the registry are `Send + Sync` and can be shared
//! freely between threads that each own their bundles.

pub mod builder;
pub mod bundle;
pub mod change;
pub mod entry;
pub mod reactive;

pub use builder::BundleBuilder;
pub use bundle::Bundle;
pub use change::{BundleChange, BundleId};
pub use entry::BundleEntry;
pub use reactive::{EventStream, ReactiveValue, ReactiveVariable, Subscription};
