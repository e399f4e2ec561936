//! ContextOS Mobile: app-like touch layer
//!
//! Gives the prompt deck a native feel on touch devices:
//! - Pointer drag tracking with axis lock (shared by both recognizers)
//! - Pull-to-refresh on the prompt list
//! - Swipe-to-act on list rows (left = delete, right = share)
//! - Haptic pulses, toasts, activity overlays, share → clipboard fallback
//! - One-shot capability probe
//!
//! Everything runs on the UI thread. Build one `FeedbackDispatcher` at
//! startup and hand an `Rc` of it to each recognizer.

pub mod capability;
pub mod clock;
pub mod config;
pub mod error;
pub mod feedback;
pub mod platform;
pub mod pull;
pub mod swipe;
pub mod touch;
pub mod ui;

#[cfg(test)]
mod testing;

pub use capability::{Capabilities, CapabilityProbe};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FeedbackConfig, PullConfig, SwipeConfig, TrackerConfig};
pub use error::{CallbackError, CallbackResult, GestureError, PlatformError, ShareError};
pub use feedback::{FeedbackDispatcher, FeedbackRequest, HapticKind, OverlayHandle};
pub use platform::{HeadlessPlatform, Platform, SharePayload};
pub use pull::{PullIndicator, PullState, PullToRefreshController, Reload, ReloadCompleter, ReloadTicket};
pub use swipe::{SwipeActionController, SwipeActions, SwipeDirection, SwipeRelease, SwipeState};
pub use touch::{Axis, DragSample, ElementId, GestureOutcome, GestureTracker};
