#![forbid(unsafe_code)]

//! Lifecycle-scoped collections of disposables.
//!
//! # Design
//!
//! A [`DisposeBag`] is created per consuming context (typically a view's
//! active lifetime) and handed explicitly to whatever creates subscriptions
//! for that context. When the context ends, disposing the bag releases every
//! member exactly once.
//!
//! Cloning a `DisposeBag` creates a new handle to the **same** bag. The bag
//! disposes itself when the last strong handle is dropped, so forgetting to
//! call [`DisposeBag::dispose`] never leaks a subscription.
//!
//! # Invariants
//!
//! 1. Every member is disposed exactly once, on `dispose()` or on drop.
//! 2. A disposable added after the bag was disposed is disposed immediately.
//! 3. Members are released outside the internal borrow: a member may add to
//!    or dispose the bag from its own teardown.
//! 4. Members that were disposed on their own are pruned lazily, on the next
//!    `add`; they are not disposed again.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::disposable::Disposable;

struct BagInner {
    members: Vec<Box<dyn Disposable>>,
    disposed: bool,
}

impl Drop for BagInner {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let members = std::mem::take(&mut self.members);
        if !members.is_empty() {
            debug!(count = members.len(), "dispose bag dropped, releasing members");
        }
        for member in &members {
            member.dispose();
        }
    }
}

/// An unordered collection of disposables released together.
#[derive(Clone)]
pub struct DisposeBag {
    inner: Rc<RefCell<BagInner>>,
}

impl Default for DisposeBag {
    fn default() -> Self {
        Self::new()
    }
}

impl DisposeBag {
    /// Create an empty, live bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BagInner {
                members: Vec::new(),
                disposed: false,
            })),
        }
    }

    /// Take ownership of `disposable` until the bag is disposed.
    ///
    /// If the bag is already disposed, `disposable` is released right away.
    pub fn add(&self, disposable: impl Disposable + 'static) {
        self.add_boxed(Box::new(disposable));
    }

    /// Boxed form of [`add`](Self::add).
    pub fn add_boxed(&self, disposable: Box<dyn Disposable>) {
        let (rejected, pruned) = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                (Some(disposable), Vec::new())
            } else {
                let (pruned, mut live): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.members)
                    .into_iter()
                    .partition(|member| member.is_disposed());
                live.push(disposable);
                inner.members = live;
                (None, pruned)
            }
        };
        // Dropped outside the borrow.
        drop(pruned);
        if let Some(late) = rejected {
            trace!("disposable added to a disposed bag, releasing immediately");
            late.dispose();
        }
    }

    /// Release every member and mark the bag disposed. Idempotent.
    pub fn dispose(&self) {
        let members = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            std::mem::take(&mut inner.members)
        };
        debug!(count = members.len(), "disposing bag");
        for member in &members {
            member.dispose();
        }
    }

    /// Whether the bag has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Number of members currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().members.len()
    }

    /// Whether the bag holds no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().members.is_empty()
    }

    /// A non-owning handle to this bag.
    #[must_use]
    pub fn downgrade(&self) -> WeakDisposeBag {
        WeakDisposeBag {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Disposable for DisposeBag {
    fn dispose(&self) {
        DisposeBag::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        DisposeBag::is_disposed(self)
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DisposeBag")
            .field("members", &inner.members.len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}

/// Non-owning reference to a [`DisposeBag`].
///
/// Used by observations to remember the scope they were created in without
/// keeping that scope alive.
#[derive(Clone, Default)]
pub struct WeakDisposeBag {
    inner: Weak<RefCell<BagInner>>,
}

impl WeakDisposeBag {
    /// The bag, if any strong handle to it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<DisposeBag> {
        self.inner.upgrade().map(|inner| DisposeBag { inner })
    }
}

impl fmt::Debug for WeakDisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDisposeBag")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
