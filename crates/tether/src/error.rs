#![forbid(unsafe_code)]

use std::fmt;

/// Why a view-model observation could not be bound to a view.
///
/// In every case nothing was registered: the observation keeps running and
/// the view is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The component lifecycle was dropped before the bind call.
    LifecycleReleased,
    /// The lifecycle has no presenter for the view and would not create one.
    PresenterUnavailable,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LifecycleReleased => write!(f, "component lifecycle already released"),
            Self::PresenterUnavailable => write!(f, "no presenter available for view"),
        }
    }
}

impl std::error::Error for BindError {}
