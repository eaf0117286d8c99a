#![forbid(unsafe_code)]

//! The upstream side: push sources and their events.
//!
//! The binding layer consumes any [`Source`]: subscribing a callback that
//! receives tagged [`Event`]s returns a [`Disposable`] for the subscription.
//! Only [`Event::Next`] must be acted upon.
//!
//! [`Subject`] is a small reference source. It does not replay past values
//! to new subscribers, and it is also a [`Bindable`], so the reverse leg of a
//! two-way binding can be bound straight back into it.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::bindable::Bindable;
use crate::disposable::{ActionDisposable, Disposable};

/// A tagged notification from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T, E> {
    /// A new value.
    Next(T),
    /// The source failed; no further events follow.
    Failed(E),
    /// The source finished; no further events follow.
    Completed,
}

impl<T, E> Event<T, E> {
    /// Whether this event ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Next(_))
    }
}

/// Callback handed to [`Source::subscribe`].
pub type EventCallback<T, E> = Box<dyn Fn(Event<T, E>)>;

/// A push-based producer of values.
pub trait Source {
    type Item;
    type Error;

    /// Start delivering events to `callback` until the returned disposable
    /// is disposed.
    fn subscribe(&self, callback: EventCallback<Self::Item, Self::Error>) -> Box<dyn Disposable>;
}

type SharedCallback<T, E> = Rc<dyn Fn(Event<T, E>)>;

struct SubjectInner<T, E> {
    observers: Vec<(u64, SharedCallback<T, E>)>,
    next_id: u64,
    latest: Option<T>,
    terminated: bool,
}

/// A multicast push source.
///
/// Cloning a `Subject` creates a new handle to the same stream.
pub struct Subject<T, E = Infallible> {
    inner: Rc<RefCell<SubjectInner<T, E>>>,
}

impl<T, E> Clone for Subject<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Subject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Subject")
            .field("latest", &inner.latest)
            .field("observers", &inner.observers.len())
            .field("terminated", &inner.terminated)
            .finish()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for Subject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Subject<T, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                observers: Vec::new(),
                next_id: 0,
                latest: None,
                terminated: false,
            })),
        }
    }

    /// Emit a value to every subscriber.
    pub fn next(&self, value: T) {
        if self.record_latest(&value) {
            self.emit(Event::Next(value));
        }
    }

    /// End the stream with a failure.
    pub fn fail(&self, error: E) {
        self.terminate(Event::Failed(error));
    }

    /// End the stream normally.
    pub fn complete(&self) {
        self.terminate(Event::Completed);
    }

    /// The most recently emitted value.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.inner.borrow().latest.clone()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminated
    }

    fn record_latest(&self, value: &T) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.terminated {
            return false;
        }
        inner.latest = Some(value.clone());
        true
    }

    fn terminate(&self, event: Event<T, E>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.terminated {
                return;
            }
            inner.terminated = true;
        }
        self.emit(event);
        self.inner.borrow_mut().observers.clear();
    }

    fn emit(&self, event: Event<T, E>) {
        // Snapshot so callbacks may subscribe, unsubscribe or send re-entrantly.
        let observers: Vec<SharedCallback<T, E>> = self
            .inner
            .borrow()
            .observers
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in &observers {
            callback(event.clone());
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Source for Subject<T, E> {
    type Item = T;
    type Error = E;

    fn subscribe(&self, callback: EventCallback<T, E>) -> Box<dyn Disposable> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.terminated {
                return Box::new(ActionDisposable::empty());
            }
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.push((id, Rc::from(callback)));
            id
        };
        let weak: Weak<RefCell<SubjectInner<T, E>>> = Rc::downgrade(&self.inner);
        Box::new(ActionDisposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().observers.retain(|(other, _)| *other != id);
            }
        }))
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Bindable<T> for Subject<T, E> {
    fn advance(&self) -> impl Fn(T) + '_ {
        move |value| self.next(value)
    }
}
