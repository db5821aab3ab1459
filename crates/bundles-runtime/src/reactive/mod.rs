#![forbid(unsafe_code)]

//! Reactive primitives backing bundle change notification.
//!
//! - [`EventStream`]: an append-only broadcast of events to subscriber
//!   callbacks, with no replay. A bundle's `changed` stream is one.
//! - [`ReactiveVariable`]: a shared, version-tracked value with change
//!   notification.
//! - [`ReactiveValue`]: a read-only view of a `ReactiveVariable`. Bundles
//!   hand these out from `get_reactive`.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). Subscribers are held as
//! `Weak` callbacks; the strong side lives in the [`Subscription`]. Dead
//! callbacks are pruned lazily when the next event is delivered.
//!
//! # Invariants
//!
//! 1. Delivery is synchronous: every live subscriber has run before
//!    `fire`/`set` returns.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a variable to its current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] stops delivery to its callback before the
//!    next event.

pub mod event;
pub mod variable;

pub use event::{EventStream, Subscription};
pub use variable::{ReactiveValue, ReactiveVariable};
