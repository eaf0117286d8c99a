#![forbid(unsafe_code)]

//! Cancellable side effects.
//!
//! A [`Disposable`] represents something that was acquired and must be
//! released exactly once: an active subscription, a registered callback, a
//! nested scope. Every implementation in this crate is idempotent, so teardown
//! order between independent owners never matters.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Capability for releasing one previously acquired resource.
///
/// `dispose` takes `&self`: disposables are shared between the owner that
/// created them and the scope that tears them down, so implementations keep
/// their released state behind interior mutability.
pub trait Disposable {
    /// Release the resource. Calling this more than once is a no-op.
    fn dispose(&self);

    /// Whether [`dispose`](Self::dispose) has already run.
    fn is_disposed(&self) -> bool;
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
    fn dispose(&self) {
        (**self).dispose();
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}

impl<D: Disposable + ?Sized> Disposable for Rc<D> {
    fn dispose(&self) {
        (**self).dispose();
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}

/// A disposable that runs a closure the first time it is disposed.
///
/// The closure is dropped right after it runs, releasing anything it
/// captured.
pub struct ActionDisposable {
    action: RefCell<Option<Box<dyn FnOnce()>>>,
    disposed: Cell<bool>,
}

impl ActionDisposable {
    /// Wrap `action` so it runs once on disposal.
    #[must_use]
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: RefCell::new(Some(Box::new(action))),
            disposed: Cell::new(false),
        }
    }

    /// A disposable with nothing to release.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            action: RefCell::new(None),
            disposed: Cell::new(false),
        }
    }
}

impl Disposable for ActionDisposable {
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        // Take the closure before running it so a re-entrant dispose from
        // inside the action finds nothing left to do.
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl fmt::Debug for ActionDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDisposable")
            .field("disposed", &self.disposed.get())
            .finish_non_exhaustive()
    }
}
