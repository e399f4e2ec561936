//! Error taxonomy for the touch and feedback layer.
//!
//! None of these ever reach the end user directly. Gesture errors are
//! programmer mistakes and get logged, platform errors degrade silently into
//! the fallback chain, and callback errors are reported through one toast
//! plus an error haptic.

use thiserror::Error;

use super::touch::ElementId;

/// Misuse of the gesture primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    /// A drag was begun on an element that already has one open.
    #[error("drag already open on element {element:?}")]
    InvalidState { element: ElementId },
    /// A move/end/cancel arrived for an element with no open drag.
    #[error("no open drag on element {element:?}")]
    UnknownElement { element: ElementId },
    /// Threshold set that cannot produce a sane gesture.
    #[error("invalid gesture config: {0}")]
    InvalidConfig(String),
}

/// Failure of a platform primitive (vibration, share sheet, clipboard).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("platform call failed: {0}")]
    Failed(String),
}

/// Outcome of a native share attempt that did not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShareError {
    /// The user dismissed the share sheet. Not a failure.
    #[error("share cancelled by user")]
    Cancelled,
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// A host-supplied callback (reload, swipe action) reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type returned by reload tickets and swipe actions.
pub type CallbackResult = Result<(), CallbackError>;
