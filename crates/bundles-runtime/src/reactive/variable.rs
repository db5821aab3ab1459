#![forbid(unsafe_code)]

//! Shared reactive values with change notification and version tracking.
//!
//! # Design
//!
//! [`ReactiveVariable<T>`] wraps a value in shared storage
//! (`Rc<RefCell<..>>`). When the value changes (by `PartialEq`), all live
//! subscribers are notified in registration order. [`ReactiveValue<T>`] is a
//! read-only handle to the same storage; bundles keep the writable side and
//! hand out views.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1)                       |
//! | `set()`       | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: setting the same variable from inside one of its
//!   subscriber callbacks panics (RefCell borrow rules).
//! - **Subscriber leak**: undropped [`Subscription`] guards accumulate
//!   callbacks. Dead entries are pruned lazily on the next notification.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bundles_core::{ErasedValue, PropertyValue, TypeTag};

use super::event::{Subscribers, Subscription};

struct CellState<T> {
    value: T,
    version: u64,
    subscribers: Subscribers<T>,
}

type SharedCell<T> = Rc<RefCell<CellState<T>>>;

/// Store `value` and notify. Returns `false` when it equals the current value.
fn assign<T: Clone + PartialEq + 'static>(cell: &RefCell<CellState<T>>, value: T) -> bool {
    let callbacks = {
        let mut state = cell.borrow_mut();
        if state.value == value {
            return false;
        }
        state.value = value;
        state.version += 1;
        state.subscribers.live()
    };
    let value = cell.borrow().value.clone();
    for callback in &callbacks {
        callback(&value);
    }
    true
}

/// A shared, version-tracked value with change notification.
///
/// Cloning creates a new handle to the **same** state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
pub struct ReactiveVariable<T> {
    cell: SharedCell<T>,
}

impl<T> Clone for ReactiveVariable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.borrow();
        f.debug_struct("ReactiveVariable")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("subscriber_count", &state.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveVariable<T> {
    /// A variable at version 0 with no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(CellState {
                value,
                version: 0,
                subscribers: Subscribers::new(),
            })),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().value.clone()
    }

    /// Borrow the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow().value)
    }

    /// Set a new value, notifying subscribers if it differs from the current
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within a subscriber callback.
    pub fn set(&self, value: T) {
        assign(&self.cell, value);
    }

    /// Modify the value in place. Subscribers are notified only if the result
    /// differs from the value before `f` ran.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        assign(&self.cell, next);
    }

    /// Call `callback` with each new value until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.cell.borrow_mut().subscribers.add(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.borrow().version
    }

    /// Registered subscribers, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.cell.borrow().subscribers.len()
    }

    /// A read-only handle to the same state.
    #[must_use]
    pub fn view(&self) -> ReactiveValue<T> {
        ReactiveValue {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: PropertyValue> ReactiveVariable<T> {
    /// Weak, type-erased write handle used by bundles to keep live cells in
    /// sync without keeping them alive.
    pub(crate) fn sink(&self) -> Weak<dyn ReactiveSink> {
        let strong: Rc<dyn ReactiveSink> = self.cell.clone();
        Rc::downgrade(&strong)
    }
}

/// Read-only view of a [`ReactiveVariable`].
///
/// Views handed out by a bundle for the same property share one underlying
/// cell while any of them is alive; see [`ReactiveValue::ptr_eq`].
pub struct ReactiveValue<T> {
    cell: SharedCell<T>,
}

impl<T> Clone for ReactiveValue<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.borrow();
        f.debug_struct("ReactiveValue")
            .field("value", &state.value)
            .field("version", &state.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveValue<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().value.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow().value)
    }

    /// Call `callback` with each new value until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.cell.borrow_mut().subscribers.add(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.borrow().version
    }

    /// Whether both views observe the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: PropertyValue> ReactiveValue<T> {
    /// Recover a typed view from a sink; `None` if the cell holds another type.
    pub(crate) fn from_sink(sink: Rc<dyn ReactiveSink>) -> Option<Self> {
        sink.into_any()
            .downcast::<RefCell<CellState<T>>>()
            .ok()
            .map(|cell| Self { cell })
    }
}

/// Type-erased write side of a reactive cell.
pub(crate) trait ReactiveSink {
    fn value_type(&self) -> TypeTag;

    /// Store `value`, notifying if it changed. Returns the cell's type when
    /// `value` is of another type.
    fn push(&self, value: &ErasedValue) -> Result<(), TypeTag>;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: PropertyValue> ReactiveSink for RefCell<CellState<T>> {
    fn value_type(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn push(&self, value: &ErasedValue) -> Result<(), TypeTag> {
        let value = value.downcast_ref::<T>().ok_or_else(TypeTag::of::<T>)?;
        assign(self, value.clone());
        Ok(())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
