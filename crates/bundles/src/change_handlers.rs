#![forbid(unsafe_code)]

//! Context-dependent property change handlers.
//!
//! A [`PropertyChangeHandler<Ctx>`] maps properties to typed callbacks that
//! also receive a context value (a widget, a session, whatever owns the
//! bundle). [`PropertyChangeHandlers`] keeps one handler per context type so
//! independent components can register reactions to the same properties
//! without knowing about each other.
//!
//! Context types are matched exactly: a handler registered for `Ctx` only
//! sees dispatches made with a `&Ctx`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bundles_core::{ErasedProperty, ErasedValue, Permission, Property, PropertyValue};
use bundles_runtime::{Bundle, BundleChange, Subscription};
use tracing::warn;

type ErasedCallback<Ctx> = Box<dyn Fn(&Ctx, Option<&ErasedValue>)>;

/// Typed change callbacks for one context type.
pub struct PropertyChangeHandler<Ctx> {
    listeners: HashMap<ErasedProperty, Vec<ErasedCallback<Ctx>>>,
}

impl<Ctx> Default for PropertyChangeHandler<Ctx> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl<Ctx> PropertyChangeHandler<Ctx> {
    /// Whether any callback is registered for `property`.
    #[must_use]
    pub fn handles(&self, property: impl AsRef<ErasedProperty>) -> bool {
        self.listeners.contains_key(property.as_ref())
    }

    /// Total number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<Ctx> fmt::Debug for PropertyChangeHandler<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeHandler")
            .field("properties", &self.listeners.len())
            .field("callbacks", &self.len())
            .finish()
    }
}

impl<Ctx: 'static> PropertyChangeHandler<Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` whenever `property` changes.
    ///
    /// The callback receives the new value, or `None` when the property was
    /// deleted and has no default.
    pub fn handle<T: PropertyValue, P: Permission>(
        &mut self,
        property: &Property<T, P>,
        callback: impl Fn(&Ctx, Option<&T>) + 'static,
    ) -> &mut Self {
        let name = property.name().to_owned();
        let erased: ErasedCallback<Ctx> = Box::new(move |ctx, value| match value {
            None => callback(ctx, None),
            Some(value) => match value.downcast_ref::<T>() {
                Some(typed) => callback(ctx, Some(typed)),
                None => warn!(
                    property = %name,
                    found = %value.type_tag(),
                    "change handler skipped: value of unexpected type"
                ),
            },
        });
        self.listeners
            .entry(property.erased().clone())
            .or_default()
            .push(erased);
        self
    }

    /// Run the callbacks registered for `property`. Returns how many ran.
    pub fn value_changed(
        &self,
        ctx: &Ctx,
        property: &ErasedProperty,
        value: Option<&ErasedValue>,
    ) -> usize {
        let Some(callbacks) = self.listeners.get(property) else {
            return 0;
        };
        for callback in callbacks {
            callback(ctx, value);
        }
        callbacks.len()
    }

}

/// One [`PropertyChangeHandler`] per context type.
#[derive(Default)]
pub struct PropertyChangeHandlers {
    handlers: HashMap<TypeId, Box<dyn Any>>,
}

impl fmt::Debug for PropertyChangeHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeHandlers")
            .field("contexts", &self.handlers.len())
            .finish()
    }
}

impl PropertyChangeHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The handler for context type `Ctx`, created on first use.
    ///
    /// # Panics
    ///
    /// Never in practice: slots are keyed by the `TypeId` of the handler's
    /// context, so the downcast always matches.
    pub fn for_context<Ctx: 'static>(&mut self) -> &mut PropertyChangeHandler<Ctx> {
        self.handlers
            .entry(TypeId::of::<Ctx>())
            .or_insert_with(|| Box::new(PropertyChangeHandler::<Ctx>::new()))
            .downcast_mut()
            .expect("handler slot keyed by a different context type")
    }

    /// The handler for context type `Ctx`, if one was created.
    #[must_use]
    pub fn get<Ctx: 'static>(&self) -> Option<&PropertyChangeHandler<Ctx>> {
        self.handlers
            .get(&TypeId::of::<Ctx>())
            .and_then(|handler| handler.downcast_ref())
    }

    /// Let the handler for `Ctx` react to `value` as the new value of
    /// `property`. Returns how many callbacks ran.
    pub fn handle<Ctx: 'static>(
        &self,
        ctx: &Ctx,
        property: &ErasedProperty,
        value: Option<&ErasedValue>,
    ) -> usize {
        self.get::<Ctx>()
            .map_or(0, |handler| handler.value_changed(ctx, property, value))
    }

    /// [`handle`](Self::handle) for a bundle change event.
    pub fn dispatch_change<Ctx: 'static>(&self, ctx: &Ctx, change: &BundleChange) -> usize {
        self.handle(ctx, change.property(), change.new_value())
    }

    /// Forward every change of `bundle` to the handlers for `Ctx` until the
    /// returned guard is dropped.
    pub fn attach<Ctx: 'static>(
        handlers: &Rc<Self>,
        ctx: Rc<Ctx>,
        bundle: &Bundle,
    ) -> Subscription {
        let handlers = Rc::clone(handlers);
        bundle.changed().subscribe(move |change: &BundleChange| {
            handlers.dispatch_change(&*ctx, change);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundles_core::Public;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Widget {
        log: RefCell<Vec<String>>,
    }

    struct Other;

    #[test]
    fn typed_callbacks_receive_new_values() {
        let width: Property<u32> = Property::simple("width");
        let mut handler = PropertyChangeHandler::<Widget>::new();
        handler.handle(&width, |w: &Widget, v: Option<&u32>| {
            w.log.borrow_mut().push(format!("width={v:?}"));
        });

        let widget = Widget::default();
        let ran = handler.value_changed(&widget, width.erased(), Some(&ErasedValue::new(7_u32)));
        assert_eq!(ran, 1);
        handler.value_changed(&widget, width.erased(), None);
        assert_eq!(*widget.log.borrow(), ["width=Some(7)", "width=None"]);
        assert!(handler.handles(&width));
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn mistyped_values_are_skipped() {
        let width: Property<u32> = Property::simple("width");
        let mut handler = PropertyChangeHandler::<Widget>::new();
        handler.handle(&width, |w: &Widget, _: Option<&u32>| {
            w.log.borrow_mut().push("called".into());
        });
        let widget = Widget::default();
        handler.value_changed(&widget, width.erased(), Some(&ErasedValue::new("wide")));
        assert!(widget.log.borrow().is_empty());
    }

    #[test]
    fn handlers_are_per_context_type() {
        let title: Property<String> = Property::simple("title");
        let mut handlers = PropertyChangeHandlers::new();
        handlers
            .for_context::<Widget>()
            .handle(&title, |w: &Widget, v: Option<&String>| {
                w.log.borrow_mut().push(v.cloned().unwrap_or_default());
            });
        handlers.for_context::<Widget>().handle(&title, |w: &Widget, _| {
            w.log.borrow_mut().push("second".into());
        });

        let widget = Widget::default();
        let value = ErasedValue::new("hello".to_string());
        assert_eq!(handlers.handle(&widget, title.erased(), Some(&value)), 2);
        assert_eq!(handlers.handle(&Other, title.erased(), Some(&value)), 0);
        assert_eq!(*widget.log.borrow(), ["hello", "second"]);
    }

    #[test]
    fn debug_and_lookup_by_context() {
        let width: Property<u32> = Property::simple("width");
        let mut handlers = PropertyChangeHandlers::new();
        assert!(handlers.get::<Widget>().is_none());
        handlers.for_context::<Widget>().handle(&width, |_: &Widget, _| {});

        let handler = handlers.get::<Widget>().unwrap();
        assert_eq!(
            format!("{handler:?}"),
            "PropertyChangeHandler { properties: 1, callbacks: 1 }"
        );
        assert!(handlers.get::<Other>().is_none());
        assert_eq!(
            format!("{handlers:?}"),
            "PropertyChangeHandlers { contexts: 1 }"
        );
    }

    #[test]
    fn attach_forwards_bundle_changes() {
        let count: Property<i32> = Property::simple_with_default("count", 0);
        let mut handlers = PropertyChangeHandlers::new();
        handlers
            .for_context::<Widget>()
            .handle(&count, |w: &Widget, v: Option<&i32>| {
                w.log.borrow_mut().push(format!("{v:?}"));
            });
        let handlers = Rc::new(handlers);
        let widget = Rc::new(Widget::default());

        let mut bundle = Bundle::new();
        let guard = PropertyChangeHandlers::attach(&handlers, Rc::clone(&widget), &bundle);
        bundle.set(&Public, &count, 3).unwrap();
        bundle.delete(&Public, &count).unwrap();
        drop(guard);
        bundle.set(&Public, &count, 4).unwrap();

        assert_eq!(*widget.log.borrow(), ["Some(3)", "Some(0)"]);
    }
}
