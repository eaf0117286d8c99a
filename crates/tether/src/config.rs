#![forbid(unsafe_code)]

//! Configuration for [`ViewObserver`](crate::ViewObserver).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What an observation does when its source fails or completes.
///
/// Bindings are fire-and-forget by default: a terminal event leaves the
/// observation holding its last value and nothing else happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TerminalEventPolicy {
    /// Drop terminal events silently.
    #[default]
    Ignore,
    /// Emit a `tracing` event and keep the observation alive.
    Log,
    /// Emit a `tracing` event and dispose the observation.
    Dispose,
}

/// Configuration for observations built by a [`ViewObserver`](crate::ViewObserver).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ObserverConfig {
    /// Handling of `Failed` and `Completed` events from sources.
    pub on_terminal: TerminalEventPolicy,
    /// Optional label attached to log events, to tell observers apart.
    pub label: Option<String>,
}

impl ObserverConfig {
    /// Set how terminal source events are handled.
    #[must_use]
    pub fn with_terminal_policy(mut self, policy: TerminalEventPolicy) -> Self {
        self.on_terminal = policy;
        self
    }

    /// Set the label attached to log events.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("unlabeled")
    }
}
