#![forbid(unsafe_code)]

//! Lifecycle-scoped reactive bindings.
//!
//! `tether` connects value streams exposed by view-models to the attributes
//! of the views presenting them, and guarantees that every subscription made
//! for a view is released when that view's scope ends.
//!
//! - [`Observation`]: typed handle holding the latest value and an ordered
//!   set of listeners; transformable through [`Converter`]s and bindable to a
//!   [`Bindable`].
//! - [`DisposeBag`]: the scope. Disposing it (or dropping its last handle)
//!   releases every [`Disposable`] registered into it.
//! - [`ViewObserver`]: the entry point. Given a [`Source`] it builds an
//!   observation and registers its teardown into the bag it was created with.
//! - [`ViewModelObservation`]: observation of component view-models with a
//!   nested scope rotated on every new view-model.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc`/`RefCell`). Propagation is
//! synchronous: `put` returns once the whole downstream chain has run.
//! Disposal is the only cancellation mechanism and is irreversible.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tether::{DisposeBag, Subject, ViewObserver};
//!
//! let bag = DisposeBag::new();
//! let observer = ViewObserver::new(&bag);
//! let count: Subject<u32> = Subject::new();
//!
//! let label = Rc::new(RefCell::new(String::new()));
//! let sink = Rc::clone(&label);
//! observer
//!     .observe(&count)
//!     .convert(|n| format!("{n} authors"))
//!     .bind_fn(move |text| *sink.borrow_mut() = text);
//!
//! count.next(3);
//! assert_eq!(*label.borrow(), "3 authors");
//!
//! bag.dispose();
//! assert_eq!(count.observer_count(), 0);
//! ```

pub mod bag;
pub mod bindable;
pub mod config;
pub mod converter;
pub mod disposable;
pub mod error;
pub mod observation;
pub mod source;
pub mod view_model;
pub mod view_observer;

pub use bag::{DisposeBag, WeakDisposeBag};
pub use bindable::{BindValue, Bindable, BindableFn};
pub use config::{ObserverConfig, TerminalEventPolicy};
pub use converter::{Converter, ConverterOption, ConverterReverse};
pub use disposable::{ActionDisposable, Disposable};
pub use error::BindError;
pub use observation::{Observation, WeakObservation};
pub use source::{Event, EventCallback, Source, Subject};
pub use view_model::{ComponentViewModel, Lifecycle, Presenter, ViewModelObservation};
pub use view_observer::ViewObserver;
