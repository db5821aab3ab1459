#![forbid(unsafe_code)]

//! Synchronous event broadcast with RAII subscriptions.
//!
//! # Failure Modes
//!
//! - **Panicking subscriber**: the panic unwinds through `fire` into the
//!   mutating call that triggered the event. Later subscribers do not run.
//! - **Subscriber leak**: undropped [`Subscription`] guards keep their
//!   callbacks alive indefinitely.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

/// Ordered list of weakly held callbacks.
pub(crate) struct Subscribers<E> {
    callbacks: Vec<CallbackWeak<E>>,
}

impl<E: 'static> Subscribers<E> {
    pub(crate) const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.callbacks.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Prune dead callbacks and return the live ones, in order.
    pub(crate) fn live(&mut self) -> Vec<CallbackRc<E>> {
        self.callbacks.retain(|w| w.strong_count() > 0);
        self.callbacks.iter().filter_map(Weak::upgrade).collect()
    }
}

impl<E> Subscribers<E> {
    /// Registered callbacks, including dead ones not yet pruned.
    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// An append-only broadcast of `E` events.
///
/// Subscribers only see events fired after they subscribed.
pub struct EventStream<E> {
    subscribers: RefCell<Subscribers<E>>,
}

impl<E: 'static> EventStream<E> {
    pub(crate) const fn new() -> Self {
        Self {
            subscribers: RefCell::new(Subscribers::new()),
        }
    }

    /// Call `callback` for every future event until the returned guard is
    /// dropped.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        self.subscribers.borrow_mut().add(callback)
    }

    /// Deliver `event` to every live subscriber before returning.
    ///
    /// The subscriber list is not borrowed while callbacks run, so a callback
    /// may subscribe again; the new subscriber sees the next event.
    pub(crate) fn fire(&self, event: &E) {
        let callbacks = self.subscribers.borrow_mut().live();
        for callback in &callbacks {
            callback(event);
        }
    }

    /// Registered subscribers, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("subscriber_count", &self.subscribers.borrow().len())
            .finish()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping it drops the only strong reference to the callback, so the weak
/// entry held by the stream no longer upgrades.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
