#![forbid(unsafe_code)]

//! Observation of component view-models.
//!
//! When a screen swaps the view-model behind a sub-component (a reused list
//! cell, a detail pane re-selected from its master list), everything bound
//! for the previous view-model must be torn down before the new one is
//! presented. [`ViewModelObservation`] keeps a nested [`DisposeBag`] per
//! view-model for that purpose and rotates it ahead of every other listener.
//!
//! The component lifecycle that owns presenters is referenced weakly and
//! resolved when [`ViewModelObservation::bind_to`] runs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::bag::DisposeBag;
use crate::disposable::Disposable;
use crate::error::BindError;
use crate::observation::Observation;

/// Marker for component state objects that drive a sub-presenter.
pub trait ComponentViewModel: Clone + 'static {}

/// Applies a view-model to the view it presents.
pub trait Presenter {
    type ViewModel;

    /// Present `view_model`. Bindings made for it belong in `scope`, which is
    /// disposed as soon as the next view-model arrives.
    fn present(&self, view_model: &Self::ViewModel, scope: &DisposeBag);
}

/// Owner of the presenters for the sub-views of a component.
pub trait Lifecycle<V: ?Sized> {
    type Presenter: Presenter;

    /// The presenter attached to `view`, created on demand when
    /// `create_if_needed` is set.
    ///
    /// The lifecycle keeps its presenters alive; binders only hold them
    /// weakly.
    fn presenter_for(&self, view: &V, create_if_needed: bool) -> Option<Rc<Self::Presenter>>;
}

/// The per-view-model scope slot.
#[derive(Default)]
struct NestedScope {
    current: RefCell<Option<DisposeBag>>,
    disposed: Cell<bool>,
}

impl NestedScope {
    /// Dispose the current bag and install a fresh one.
    fn rotate(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            trace!(members = previous.len(), "rotating nested view-model scope");
            previous.dispose();
        }
        if !self.disposed.get() {
            *self.current.borrow_mut() = Some(DisposeBag::new());
        }
    }

    fn current(&self) -> Option<DisposeBag> {
        self.current.borrow().clone()
    }
}

impl Disposable for NestedScope {
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let current = self.current.borrow_mut().take();
        if let Some(current) = current {
            current.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// An observation of view-models with a nested scope and a weak lifecycle.
pub struct ViewModelObservation<VM, L> {
    observation: Observation<VM>,
    lifecycle: Weak<L>,
    nested: Rc<NestedScope>,
}

impl<VM, L> Clone for ViewModelObservation<VM, L> {
    fn clone(&self) -> Self {
        Self {
            observation: self.observation.clone(),
            lifecycle: Weak::clone(&self.lifecycle),
            nested: Rc::clone(&self.nested),
        }
    }
}

impl<VM: fmt::Debug, L> fmt::Debug for ViewModelObservation<VM, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModelObservation")
            .field("observation", &self.observation)
            .field("lifecycle_alive", &(self.lifecycle.strong_count() > 0))
            .field("nested_disposed", &self.nested.disposed.get())
            .finish()
    }
}

impl<VM: ComponentViewModel, L: 'static> ViewModelObservation<VM, L> {
    /// Wrap `observation`. Must run before anything else registers on it so
    /// the scope rotation is the first listener.
    ///
    /// The nested scope ends with the observation, whichever way it is
    /// disposed, and at the latest with `scope`.
    pub(crate) fn new(observation: Observation<VM>, lifecycle: Weak<L>, scope: &DisposeBag) -> Self {
        let nested = Rc::new(NestedScope::default());
        let rotator = Rc::clone(&nested);
        observation.register(move |_| rotator.rotate());
        observation.on_dispose(Box::new(Rc::clone(&nested)));
        scope.add(Rc::clone(&nested));
        Self {
            observation,
            lifecycle,
            nested,
        }
    }

    /// The underlying observation, for conversions and plain bindings.
    #[must_use]
    pub fn observation(&self) -> &Observation<VM> {
        &self.observation
    }

    /// The latest view-model.
    #[must_use]
    pub fn value(&self) -> Option<VM> {
        self.observation.value()
    }

    /// The scope of the current view-model; `None` before the first one
    /// arrives or after disposal.
    #[must_use]
    pub fn nested_scope(&self) -> Option<DisposeBag> {
        self.nested.current()
    }

    /// Present every view-model pushed from now on through the presenter the
    /// lifecycle attaches to `view`.
    pub fn bind_to<V: ?Sized>(&self, view: &V) -> Result<(), BindError>
    where
        L: Lifecycle<V>,
        L::Presenter: Presenter<ViewModel = VM> + 'static,
    {
        let lifecycle = self.lifecycle.upgrade().ok_or(BindError::LifecycleReleased)?;
        let presenter = lifecycle
            .presenter_for(view, true)
            .ok_or(BindError::PresenterUnavailable)?;
        let presenter = Rc::downgrade(&presenter);
        let nested = Rc::clone(&self.nested);
        self.observation.register(move |view_model| {
            let (Some(presenter), Some(scope)) = (presenter.upgrade(), nested.current()) else {
                return;
            };
            presenter.present(view_model, &scope);
        });
        Ok(())
    }

    /// [`bind_to`](Self::bind_to) for a view that may not exist; `None` binds
    /// nothing and succeeds.
    pub fn bind_to_optional<V: ?Sized>(&self, view: Option<&V>) -> Result<(), BindError>
    where
        L: Lifecycle<V>,
        L::Presenter: Presenter<ViewModel = VM> + 'static,
    {
        match view {
            Some(view) => self.bind_to(view),
            None => Ok(()),
        }
    }
}

impl<VM: ComponentViewModel, L: 'static> Disposable for ViewModelObservation<VM, L> {
    fn dispose(&self) {
        self.observation.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.observation.is_disposed()
    }
}
