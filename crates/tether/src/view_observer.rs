#![forbid(unsafe_code)]

//! Entry point for turning sources into observations.
//!
//! A [`ViewObserver`] is handed to a view when it sets up its bindings. It
//! carries the [`DisposeBag`] of that view's active lifetime: every
//! observation it builds owns its source subscription and is registered into
//! that bag, so the view never disposes a subscription by hand.
//!
//! # Terminal events
//!
//! Only `Next` events feed observations. What happens on `Failed` and
//! `Completed` is decided by [`TerminalEventPolicy`]; the default drops
//! them, leaving the observation alive with its last value.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::bag::DisposeBag;
use crate::config::{ObserverConfig, TerminalEventPolicy};
use crate::observation::Observation;
use crate::source::{Event, Source};
use crate::view_model::{ComponentViewModel, ViewModelObservation};

/// Builds observations and registers their teardown into one scope.
#[derive(Clone)]
pub struct ViewObserver {
    scope: DisposeBag,
    config: Rc<ObserverConfig>,
}

impl fmt::Debug for ViewObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewObserver")
            .field("scope", &self.scope)
            .field("config", &self.config)
            .finish()
    }
}

impl ViewObserver {
    /// An observer registering into `scope` with the default configuration.
    #[must_use]
    pub fn new(scope: &DisposeBag) -> Self {
        Self::with_config(scope, ObserverConfig::default())
    }

    #[must_use]
    pub fn with_config(scope: &DisposeBag, config: ObserverConfig) -> Self {
        Self {
            scope: scope.clone(),
            config: Rc::new(config),
        }
    }

    /// The scope observations are registered into.
    #[must_use]
    pub fn scope(&self) -> &DisposeBag {
        &self.scope
    }

    #[must_use]
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// An observer for a sub-component: its bag is fresh and is itself a
    /// member of this observer's bag.
    #[must_use]
    pub fn child(&self) -> Self {
        let scope = DisposeBag::new();
        self.scope.add(scope.clone());
        Self {
            scope,
            config: Rc::clone(&self.config),
        }
    }

    /// Observe `source`: every `Next` value is pushed into the returned
    /// observation until the scope is disposed.
    pub fn observe<S>(&self, source: &S) -> Observation<S::Item>
    where
        S: Source,
        S::Item: Clone + 'static,
        S::Error: fmt::Debug + 'static,
    {
        let observation = Observation::with_scope(self.scope.downgrade());
        let target = observation.downgrade();
        let policy = self.config.on_terminal;
        let label = self.config.label().to_owned();

        let upstream = source.subscribe(Box::new(move |event| match event {
            Event::Next(value) => target.put(value),
            Event::Failed(error) => match policy {
                TerminalEventPolicy::Ignore => {}
                TerminalEventPolicy::Log => {
                    warn!(observer = %label, ?error, "source failed, keeping last value");
                }
                TerminalEventPolicy::Dispose => {
                    warn!(observer = %label, ?error, "source failed, disposing observation");
                    if let Some(observation) = target.upgrade() {
                        observation.dispose();
                    }
                }
            },
            Event::Completed => match policy {
                TerminalEventPolicy::Ignore => {}
                TerminalEventPolicy::Log => {
                    debug!(observer = %label, "source completed, keeping last value");
                }
                TerminalEventPolicy::Dispose => {
                    debug!(observer = %label, "source completed, disposing observation");
                    if let Some(observation) = target.upgrade() {
                        observation.dispose();
                    }
                }
            },
        }));

        observation.attach_upstream(upstream);
        self.scope.add(observation.clone());
        debug!(observer = %self.config.label(), "observation created");
        observation
    }

    /// Observe `source` and map each value through `attribute`.
    pub fn observe_attribute<S, U>(
        &self,
        source: &S,
        attribute: impl Fn(&S::Item) -> U + 'static,
    ) -> Observation<U>
    where
        S: Source,
        S::Item: Clone + 'static,
        S::Error: fmt::Debug + 'static,
        U: Clone + 'static,
    {
        self.observe(source).convert(attribute)
    }

    /// Observe a source of component view-models.
    ///
    /// Besides the plain observation, each view-model gets its own nested
    /// scope, disposed when the next one arrives. `lifecycle` is held weakly
    /// and resolved when the result is bound to a view.
    pub fn observe_view_model<S, L>(
        &self,
        source: &S,
        lifecycle: &Rc<L>,
    ) -> ViewModelObservation<S::Item, L>
    where
        S: Source,
        S::Item: ComponentViewModel,
        S::Error: fmt::Debug + 'static,
        L: 'static,
    {
        ViewModelObservation::new(self.observe(source), Rc::downgrade(lifecycle), &self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Subject;
    use crate::view_model::{Lifecycle, Presenter};
    use std::cell::RefCell;

    fn observer_with(policy: TerminalEventPolicy) -> (DisposeBag, ViewObserver) {
        let bag = DisposeBag::new();
        let config = ObserverConfig::default().with_terminal_policy(policy);
        let observer = ViewObserver::with_config(&bag, config);
        (bag, observer)
    }

    #[test]
    fn observe_forwards_next_values() {
        let bag = DisposeBag::new();
        let observer = ViewObserver::new(&bag);
        let subject: Subject<i32> = Subject::new();
        let obs = observer.observe(&subject);

        subject.next(1);
        subject.next(2);
        assert_eq!(obs.value(), Some(2));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn scope_dispose_unsubscribes_from_source() {
        let bag = DisposeBag::new();
        let observer = ViewObserver::new(&bag);
        let subject: Subject<i32> = Subject::new();
        let obs = observer.observe(&subject);
        assert_eq!(subject.observer_count(), 1);

        bag.dispose();
        assert_eq!(subject.observer_count(), 0);
        assert!(obs.is_disposed());
    }

    #[test]
    fn dropping_observation_and_scope_unsubscribes() {
        let subject: Subject<i32> = Subject::new();
        {
            let bag = DisposeBag::new();
            let _obs = ViewObserver::new(&bag).observe(&subject);
            assert_eq!(subject.observer_count(), 1);
        }
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn terminal_events_ignored_by_default() {
        let bag = DisposeBag::new();
        let observer = ViewObserver::new(&bag);
        let subject: Subject<i32, String> = Subject::new();
        let obs = observer.observe(&subject);

        subject.next(5);
        subject.fail("offline".to_string());
        assert!(!obs.is_disposed());
        assert_eq!(obs.value(), Some(5));
    }

    #[test]
    fn log_policy_keeps_observation() {
        let bag = DisposeBag::new();
        let config = ObserverConfig::default().with_terminal_policy(TerminalEventPolicy::Log);
        let observer = ViewObserver::with_config(&bag, config);
        let subject: Subject<i32> = Subject::new();
        let obs = observer.observe(&subject);

        subject.complete();
        assert!(!obs.is_disposed());
    }

    #[test]
    fn dispose_policy_tears_down_on_failure() {
        let bag = DisposeBag::new();
        let config = ObserverConfig::default().with_terminal_policy(TerminalEventPolicy::Dispose);
        let observer = ViewObserver::with_config(&bag, config);
        let subject: Subject<i32, String> = Subject::new();
        let obs = observer.observe(&subject);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        obs.register(move |v| seen_clone.borrow_mut().push(*v));

        subject.next(1);
        subject.fail("gone".to_string());
        assert!(obs.is_disposed());
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn log_policy_keeps_observation_on_failure() {
        let (_bag, observer) = observer_with(TerminalEventPolicy::Log);
        let subject: Subject<i32, String> = Subject::new();
        let obs = observer.observe(&subject);

        subject.next(4);
        subject.fail("timeout".to_string());
        assert!(!obs.is_disposed());
        assert_eq!(obs.value(), Some(4));
    }

    #[test]
    fn dispose_policy_tears_down_on_completion() {
        let (bag, observer) = observer_with(TerminalEventPolicy::Dispose);
        let subject: Subject<i32> = Subject::new();
        let obs = observer.observe(&subject);
        let doubled = obs.convert(|v| v * 2);

        subject.next(2);
        subject.complete();
        assert!(obs.is_disposed());
        assert_eq!(obs.value(), Some(2));
        assert_eq!(doubled.value(), Some(4));
        assert!(!bag.is_disposed());
    }

    #[test]
    fn completed_observations_are_pruned_from_scope() {
        let (bag, observer) = observer_with(TerminalEventPolicy::Dispose);
        for _ in 0..100 {
            let subject: Subject<i32> = Subject::new();
            observer.observe(&subject);
            subject.complete();
        }
        assert_eq!(bag.len(), 1);
    }

    #[derive(Clone)]
    struct Row(Subject<u32>);

    impl ComponentViewModel for Row {}

    #[derive(Default)]
    struct RowPresenter {
        seen: Rc<RefCell<Vec<u32>>>,
    }

    impl Presenter for RowPresenter {
        type ViewModel = Row;

        fn present(&self, view_model: &Row, scope: &DisposeBag) {
            let seen = Rc::clone(&self.seen);
            ViewObserver::new(scope)
                .observe(&view_model.0)
                .bind_fn(move |v| seen.borrow_mut().push(v));
        }
    }

    struct RowView;

    #[derive(Default)]
    struct Rows {
        presenter: RefCell<Option<Rc<RowPresenter>>>,
    }

    impl Lifecycle<RowView> for Rows {
        type Presenter = RowPresenter;

        fn presenter_for(&self, _view: &RowView, create_if_needed: bool) -> Option<Rc<RowPresenter>> {
            let mut slot = self.presenter.borrow_mut();
            if slot.is_none() && create_if_needed {
                *slot = Some(Rc::new(RowPresenter::default()));
            }
            slot.clone()
        }
    }

    #[test]
    fn dispose_policy_releases_current_view_model_bindings() {
        let (_bag, observer) = observer_with(TerminalEventPolicy::Dispose);
        let lifecycle = Rc::new(Rows::default());
        let rows: Subject<Row> = Subject::new();
        let vm = observer.observe_view_model(&rows, &lifecycle);
        vm.bind_to(&RowView).expect("bind");
        let presenter = lifecycle.presenter.borrow().clone().expect("presenter");

        let inner: Subject<u32> = Subject::new();
        rows.next(Row(inner.clone()));
        inner.next(1);
        assert_eq!(*presenter.seen.borrow(), vec![1]);

        rows.complete();
        assert!(vm.observation().is_disposed());
        assert!(vm.nested_scope().is_none());
        assert_eq!(inner.observer_count(), 0);
        inner.next(9);
        assert_eq!(*presenter.seen.borrow(), vec![1]);
    }

    #[test]
    fn observe_attribute_maps() {
        let bag = DisposeBag::new();
        let observer = ViewObserver::new(&bag);
        let subject: Subject<Vec<&'static str>> = Subject::new();
        let count = observer.observe_attribute(&subject, |names| names.len());

        subject.next(vec!["Ada", "Grace"]);
        assert_eq!(count.value(), Some(2));
        // Source observation plus the converted stage.
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn child_scope_is_released_with_parent() {
        let bag = DisposeBag::new();
        let observer = ViewObserver::new(&bag);
        let child = observer.child();
        let subject: Subject<i32> = Subject::new();
        let obs = child.observe(&subject);

        bag.dispose();
        assert!(child.scope().is_disposed());
        assert!(obs.is_disposed());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn observe_into_disposed_scope_is_inert() {
        let bag = DisposeBag::new();
        bag.dispose();
        let subject: Subject<i32> = Subject::new();
        let obs = ViewObserver::new(&bag).observe(&subject);

        assert!(obs.is_disposed());
        assert_eq!(subject.observer_count(), 0);
    }
}
