#![forbid(unsafe_code)]

//! Observation handle: latest value, ordered listeners, upstream connection.
//!
//! # Design
//!
//! [`Observation<T>`] wraps its state in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). Cloning a handle shares the same cell. The upstream
//! subscription (when the observation was built from a source) is owned
//! exclusively by the observation and released when it is disposed or when
//! the last handle is dropped.
//!
//! Conversions build a tree: each stage is a new observation fed by a
//! listener on its parent and registered into the parent's scope. Disposal
//! is scope-driven. Disposing a downstream stage leaves its parent running;
//! disposing the parent drops its listeners, and with them the parent's
//! references to every downstream stage.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order, synchronously.
//! 2. A newly registered listener never sees values pushed before it.
//! 3. After the first `dispose()`, no listener is invoked again, `put` and
//!    `register` are no-ops, and the upstream has been released.
//!
//! # Failure Modes
//!
//! None. Listeners are snapshotted before a push, so a listener may push,
//! register or dispose re-entrantly. Listeners added during a push first
//! see the next push.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::bag::{DisposeBag, WeakDisposeBag};
use crate::converter::{Converter, ConverterOption, ConverterReverse};
use crate::disposable::Disposable;

type Listener<T> = Rc<dyn Fn(&T)>;

struct ObservationInner<T> {
    current: Option<T>,
    listeners: Vec<Listener<T>>,
    upstream: Option<Box<dyn Disposable>>,
    teardown: Vec<Box<dyn Disposable>>,
    scope: WeakDisposeBag,
    disposed: bool,
}

impl<T> Drop for ObservationInner<T> {
    fn drop(&mut self) {
        if let Some(upstream) = self.upstream.take() {
            upstream.dispose();
        }
        for extra in std::mem::take(&mut self.teardown) {
            extra.dispose();
        }
    }
}

/// A typed, disposable handle to a stream of values.
pub struct Observation<T> {
    inner: Rc<RefCell<ObservationInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observation")
            .field("value", &inner.current)
            .field("listeners", &inner.listeners.len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl<T: Clone + 'static> Default for Observation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Observation<T> {
    /// A detached observation: no upstream, no scope, no value.
    ///
    /// Values are pushed by hand with [`put`](Self::put). Observations fed by
    /// a source come from [`ViewObserver`](crate::ViewObserver).
    #[must_use]
    pub fn new() -> Self {
        Self::with_scope(WeakDisposeBag::default())
    }

    pub(crate) fn with_scope(scope: WeakDisposeBag) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservationInner {
                current: None,
                listeners: Vec::new(),
                upstream: None,
                teardown: Vec::new(),
                scope,
                disposed: false,
            })),
        }
    }

    /// Hand the upstream connection to this observation.
    ///
    /// If the observation is already disposed the connection is released
    /// immediately.
    pub(crate) fn attach_upstream(&self, upstream: Box<dyn Disposable>) {
        let rejected = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                Some(upstream)
            } else {
                inner.upstream.replace(upstream)
            }
        };
        if let Some(stale) = rejected {
            stale.dispose();
        }
    }

    /// Release `extra` together with the upstream when this observation is
    /// disposed or dropped. Released immediately if already disposed.
    pub(crate) fn on_dispose(&self, extra: Box<dyn Disposable>) {
        let rejected = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                Some(extra)
            } else {
                inner.teardown.push(extra);
                None
            }
        };
        if let Some(extra) = rejected {
            extra.dispose();
        }
    }

    /// Store `value` and notify every listener with it, in registration order.
    pub fn put(&self, value: T) {
        let listeners: Vec<Listener<T>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.current = Some(value.clone());
            inner.listeners.clone()
        };
        for listener in &listeners {
            // A listener earlier in this push may have disposed us.
            if self.is_disposed() {
                break;
            }
            listener(&value);
        }
    }

    /// Append a listener. It only receives values pushed after this call.
    pub fn register(&self, listener: impl Fn(&T) + 'static) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            trace!("listener registered on a disposed observation, ignoring");
            return;
        }
        inner.listeners.push(Rc::new(listener));
    }

    /// Release the upstream and drop every listener. Idempotent.
    pub fn dispose(&self) {
        let (upstream, teardown, listeners) = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            (
                inner.upstream.take(),
                std::mem::take(&mut inner.teardown),
                std::mem::take(&mut inner.listeners),
            )
        };
        if let Some(upstream) = upstream {
            upstream.dispose();
        }
        for extra in &teardown {
            extra.dispose();
        }
        // Listeners may own downstream observations; drop them outside the borrow.
        drop(listeners);
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// A clone of the latest pushed value, `None` before the first push.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.inner.borrow().current.clone()
    }

    /// Access the latest value by reference without cloning.
    ///
    /// # Panics
    ///
    /// The value stays borrowed while `f` runs: calling [`put`](Self::put),
    /// [`register`](Self::register) or [`dispose`](Self::dispose) on this
    /// observation from inside `f` panics.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.borrow().current.as_ref())
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// The scope this observation was created in, if it is still alive.
    #[must_use]
    pub fn scope(&self) -> Option<DisposeBag> {
        self.inner.borrow().scope.upgrade()
    }

    /// A non-owning handle to this observation.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservation<T> {
        WeakObservation {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// New downstream stage in the same scope, fed through `link`.
    ///
    /// A disposed observation yields an already-disposed stage that is not
    /// added to any scope.
    fn derive<U: Clone + 'static>(&self, link: impl Fn(&Observation<U>, &T) + 'static) -> Observation<U> {
        let (scope, weak_scope, disposed) = {
            let inner = self.inner.borrow();
            (inner.scope.upgrade(), inner.scope.clone(), inner.disposed)
        };
        let next = Observation::with_scope(weak_scope);
        if disposed {
            next.dispose();
            return next;
        }
        if let Some(scope) = scope {
            scope.add(next.clone());
        }
        let sink = next.clone();
        self.register(move |value| link(&sink, value));
        next
    }

    /// Map every value through `transformer` into a new observation.
    pub fn convert<U: Clone + 'static>(
        &self,
        transformer: impl Fn(&T) -> U + 'static,
    ) -> Observation<U> {
        self.derive(move |next, value| next.put(transformer(value)))
    }

    /// Map every value through a default-constructed converter.
    ///
    /// One converter instance is built here and reused for every value.
    pub fn convert_with<C>(&self) -> Observation<C::Converted>
    where
        C: Converter<Value = T> + Default + 'static,
        C::Converted: Clone + 'static,
    {
        self.convert_through(C::default())
    }

    /// Map every value through a converter built from `options`.
    ///
    /// `options` is evaluated once, now; the resulting converter serves every
    /// value that flows through this stage.
    pub fn convert_with_options<C>(
        &self,
        options: impl FnOnce() -> C::Options,
    ) -> Observation<C::Converted>
    where
        C: ConverterOption<Value = T> + 'static,
        C::Converted: Clone + 'static,
    {
        self.convert_through(C::with_options(options()))
    }

    /// Map every value back through a default-constructed reversible converter.
    pub fn convert_back_with<C>(&self) -> Observation<C::Value>
    where
        C: ConverterReverse<Converted = T> + Default + 'static,
        C::Value: Clone + 'static,
    {
        self.convert_back_through(C::default())
    }

    /// Map every value back through a reversible converter built from `options`.
    pub fn convert_back_with_options<C>(
        &self,
        options: impl FnOnce() -> C::Options,
    ) -> Observation<C::Value>
    where
        C: ConverterReverse<Converted = T> + ConverterOption + 'static,
        C::Value: Clone + 'static,
    {
        self.convert_back_through(C::with_options(options()))
    }

    fn convert_through<C>(&self, converter: C) -> Observation<C::Converted>
    where
        C: Converter<Value = T> + 'static,
        C::Converted: Clone + 'static,
    {
        self.derive(move |next, value| next.put(converter.convert(value)))
    }

    fn convert_back_through<C>(&self, converter: C) -> Observation<C::Value>
    where
        C: ConverterReverse<Converted = T> + 'static,
        C::Value: Clone + 'static,
    {
        self.derive(move |next, value| next.put(converter.convert_back(value)))
    }
}

impl<T: Clone + 'static> Disposable for Observation<T> {
    fn dispose(&self) {
        Observation::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Observation::is_disposed(self)
    }
}

/// Non-owning handle to an [`Observation`].
///
/// Source callbacks hold one of these so that an upstream producer never
/// keeps its observation alive.
pub struct WeakObservation<T> {
    inner: Weak<RefCell<ObservationInner<T>>>,
}

impl<T> Clone for WeakObservation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservation")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + 'static> WeakObservation<T> {
    /// The observation, if any strong handle to it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observation<T>> {
        self.inner.upgrade().map(|inner| Observation { inner })
    }

    /// Push into the observation if it is still alive.
    pub fn put(&self, value: T) {
        if let Some(observation) = self.upgrade() {
            observation.put(value);
        }
    }
}
