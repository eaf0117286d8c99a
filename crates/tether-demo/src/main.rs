#![forbid(unsafe_code)]

//! Drives the search-authors screen through a scripted session.
//!
//! Set `RUST_LOG=tether=debug` to watch observations being created and
//! scopes being torn down. `TETHER_OBSERVER_CONFIG` may hold a JSON
//! `ObserverConfig`, e.g. `{"on_terminal":"log","label":"search"}`.

mod screen;

use std::rc::Rc;

use tether::{DisposeBag, ObserverConfig, ViewObserver};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::screen::{SearchAuthorsLifecycle, SearchAuthorsView, SearchAuthorsViewModel};

const CONFIG_ENV: &str = "TETHER_OBSERVER_CONFIG";

fn observer_config() -> ObserverConfig {
    let Ok(raw) = std::env::var(CONFIG_ENV) else {
        return ObserverConfig::default().with_label("search-authors");
    };
    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, "ignoring malformed {CONFIG_ENV}");
            ObserverConfig::default().with_label("search-authors")
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let catalog = ["Octavia Butler", "Ursula K. Le Guin", "N. K. Jemisin", "Ted Chiang"]
        .into_iter()
        .map(String::from)
        .collect();
    let view_model = SearchAuthorsViewModel::new(catalog);
    let lifecycle = Rc::new(SearchAuthorsLifecycle::default());
    let view = SearchAuthorsView::default();

    // The view's active lifetime.
    let scope = DisposeBag::new();
    let observer = ViewObserver::with_config(&scope, observer_config());
    if let Err(error) = view.bindings(&observer, &view_model, &lifecycle) {
        warn!(%error, "authors list left unbound");
    }

    for typed in ["  LE", "b", "", "zz"] {
        view.search_field.type_text(typed);
        if let Some(list) = view_model.authors.latest() {
            if !list.authors.is_empty() {
                list.highlighted.next(0);
            }
        }
        let presenter = lifecycle.authors_presenter();
        info!(
            typed,
            field = %view.search_field.text(),
            caption = ?view.caption.text(),
            rows = ?presenter.as_ref().map(|p| p.rows()),
            highlighted = ?presenter.as_ref().and_then(|p| p.highlighted()),
            "after edit"
        );
    }

    scope.dispose();
    view_model.dispose();
    info!(
        query_observers = view_model.search_for.observer_count(),
        list_observers = view_model.authors.observer_count(),
        "screen torn down"
    );
}
