//! A search screen: a query field over a filtered list of authors.
//!
//! The view-model owns the query and publishes a fresh list view-model for
//! every query. The view binds its field two-way to the query and hands each
//! list view-model to the list presenter, whose per-list bindings are
//! released whenever the next list arrives.

use std::cell::RefCell;
use std::rc::Rc;

use tether::{
    BindError, Bindable, ComponentViewModel, Converter, ConverterOption, ConverterReverse,
    DisposeBag, Lifecycle, Presenter, Subject, ViewObserver,
};
use tracing::info;

// ── View-models ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthorsViewModel {
    pub authors: Vec<String>,
    /// Row highlighted in the list.
    pub highlighted: Subject<usize>,
}

impl ComponentViewModel for AuthorsViewModel {}

pub struct SearchAuthorsViewModel {
    pub search_for: Subject<String>,
    pub authors: Subject<AuthorsViewModel>,
    scope: DisposeBag,
}

impl SearchAuthorsViewModel {
    pub fn new(catalog: Vec<String>) -> Self {
        let search_for: Subject<String> = Subject::new();
        let authors: Subject<AuthorsViewModel> = Subject::new();
        let scope = DisposeBag::new();

        let publish = authors.clone();
        ViewObserver::new(&scope)
            .observe(&search_for)
            .bind_fn(move |query: String| {
                let matches: Vec<String> = catalog
                    .iter()
                    .filter(|name| name.to_lowercase().contains(&query))
                    .cloned()
                    .collect();
                publish.next(AuthorsViewModel {
                    authors: matches,
                    highlighted: Subject::new(),
                });
            });

        Self {
            search_for,
            authors,
            scope,
        }
    }

    pub fn dispose(&self) {
        self.scope.dispose();
    }
}

// ── Converters ────────────────────────────────────────────────────────────

/// Field text to query: trimmed and lower-cased.
#[derive(Default)]
pub struct QueryNormalizer;

impl Converter for QueryNormalizer {
    type Value = String;
    type Converted = String;

    fn convert(&self, value: &String) -> String {
        value.clone()
    }
}

impl ConverterReverse for QueryNormalizer {
    fn convert_back(&self, value: &String) -> String {
        value.trim().to_lowercase()
    }
}

/// `n` → "n <noun>" with singular/plural forms chosen by the caller.
pub struct CountCaption {
    singular: &'static str,
    plural: &'static str,
}

impl Converter for CountCaption {
    type Value = usize;
    type Converted = String;

    fn convert(&self, value: &usize) -> String {
        let noun = if *value == 1 { self.singular } else { self.plural };
        format!("{value} {noun}")
    }
}

impl ConverterOption for CountCaption {
    type Options = (&'static str, &'static str);

    fn with_options((singular, plural): Self::Options) -> Self {
        Self { singular, plural }
    }
}

// ── Views ─────────────────────────────────────────────────────────────────

/// A text field: displays bound text, publishes user edits.
#[derive(Clone, Default)]
pub struct TextField {
    text: Rc<RefCell<String>>,
    pub edits: Subject<String>,
}

impl TextField {
    /// Simulate the user replacing the field contents.
    pub fn type_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_owned();
        self.edits.next(text.to_owned());
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }
}

impl Bindable<String> for TextField {
    fn advance(&self) -> impl Fn(String) + '_ {
        move |text| *self.text.borrow_mut() = text
    }
}

/// A caption label that may be blank.
#[derive(Clone, Default)]
pub struct Caption {
    text: Rc<RefCell<Option<String>>>,
}

impl Caption {
    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl Bindable<Option<String>> for Caption {
    fn advance(&self) -> impl Fn(Option<String>) + '_ {
        move |text| *self.text.borrow_mut() = text
    }
}

#[derive(Default)]
pub struct AuthorsList;

#[derive(Default)]
pub struct AuthorsPresenter {
    rows: RefCell<Vec<String>>,
    highlighted: Rc<RefCell<Option<usize>>>,
}

impl AuthorsPresenter {
    pub fn rows(&self) -> Vec<String> {
        self.rows.borrow().clone()
    }

    pub fn highlighted(&self) -> Option<usize> {
        *self.highlighted.borrow()
    }
}

impl Presenter for AuthorsPresenter {
    type ViewModel = AuthorsViewModel;

    fn present(&self, view_model: &AuthorsViewModel, scope: &DisposeBag) {
        info!(rows = view_model.authors.len(), "presenting authors list");
        *self.rows.borrow_mut() = view_model.authors.clone();
        *self.highlighted.borrow_mut() = None;

        let highlighted = Rc::clone(&self.highlighted);
        ViewObserver::new(scope)
            .observe(&view_model.highlighted)
            .bind_fn(move |row| *highlighted.borrow_mut() = Some(row));
    }
}

/// Owns the presenters of the search screen's sub-views.
#[derive(Default)]
pub struct SearchAuthorsLifecycle {
    authors: RefCell<Option<Rc<AuthorsPresenter>>>,
}

impl SearchAuthorsLifecycle {
    pub fn authors_presenter(&self) -> Option<Rc<AuthorsPresenter>> {
        self.authors.borrow().clone()
    }
}

impl Lifecycle<AuthorsList> for SearchAuthorsLifecycle {
    type Presenter = AuthorsPresenter;

    fn presenter_for(&self, _view: &AuthorsList, create_if_needed: bool) -> Option<Rc<AuthorsPresenter>> {
        let mut slot = self.authors.borrow_mut();
        if slot.is_none() && create_if_needed {
            *slot = Some(Rc::new(AuthorsPresenter::default()));
        }
        slot.clone()
    }
}

#[derive(Default)]
pub struct SearchAuthorsView {
    pub search_field: TextField,
    pub caption: Caption,
    pub authors_view: AuthorsList,
}

impl SearchAuthorsView {
    pub fn bindings(
        &self,
        observer: &ViewObserver,
        view_model: &SearchAuthorsViewModel,
        lifecycle: &Rc<SearchAuthorsLifecycle>,
    ) -> Result<(), BindError> {
        observer
            .observe(&view_model.search_for)
            .bind(self.search_field.clone());
        observer
            .observe(&self.search_field.edits)
            .convert_back_with::<QueryNormalizer>()
            .bind(view_model.search_for.clone());
        observer
            .observe_attribute(&view_model.authors, |list| list.authors.len())
            .convert_with_options::<CountCaption>(|| ("author", "authors"))
            .bind(self.caption.clone());
        observer
            .observe_view_model(&view_model.authors, lifecycle)
            .bind_to(&self.authors_view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<String> {
        ["Octavia Butler", "Ursula K. Le Guin", "Ted Chiang"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn mounted() -> (DisposeBag, SearchAuthorsViewModel, Rc<SearchAuthorsLifecycle>, SearchAuthorsView) {
        let scope = DisposeBag::new();
        let view_model = SearchAuthorsViewModel::new(catalog());
        let lifecycle = Rc::new(SearchAuthorsLifecycle::default());
        let view = SearchAuthorsView::default();
        view.bindings(&ViewObserver::new(&scope), &view_model, &lifecycle)
            .expect("lifecycle is alive");
        (scope, view_model, lifecycle, view)
    }

    #[test]
    fn typing_normalizes_query_and_filters_list() {
        let (_scope, view_model, lifecycle, view) = mounted();

        view.search_field.type_text("  CHI ");
        assert_eq!(view_model.search_for.latest().as_deref(), Some("chi"));
        assert_eq!(view.search_field.text(), "chi");
        assert_eq!(view.caption.text().as_deref(), Some("1 author"));

        let presenter = lifecycle.authors_presenter().expect("created on first list");
        assert_eq!(presenter.rows(), vec!["Ted Chiang".to_string()]);
    }

    #[test]
    fn highlight_binding_is_rebuilt_per_list() {
        let (_scope, view_model, lifecycle, view) = mounted();

        view.search_field.type_text("u");
        let first = view_model.authors.latest().expect("published");
        let presenter = lifecycle.authors_presenter().expect("created on first list");
        first.highlighted.next(1);
        assert_eq!(presenter.highlighted(), Some(1));

        view.search_field.type_text("t");
        assert_eq!(presenter.highlighted(), None);
        assert_eq!(first.highlighted.observer_count(), 0);
        first.highlighted.next(0);
        assert_eq!(presenter.highlighted(), None);
    }

    #[test]
    fn teardown_detaches_every_source() {
        let (scope, view_model, _lifecycle, view) = mounted();
        view.search_field.type_text("a");

        scope.dispose();
        view_model.dispose();
        assert_eq!(view_model.search_for.observer_count(), 0);
        assert_eq!(view_model.authors.observer_count(), 0);
        assert_eq!(view.search_field.edits.observer_count(), 0);
    }

    #[test]
    fn caption_pluralizes() {
        let caption = CountCaption::with_options(("author", "authors"));
        assert_eq!(caption.convert(&0), "0 authors");
        assert_eq!(caption.convert(&1), "1 author");
        assert_eq!(caption.convert(&3), "3 authors");
    }
}
