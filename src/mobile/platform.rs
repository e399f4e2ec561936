//! Platform primitives the feedback layer drives.
//!
//! Every method has a conservative default, so a host only implements what
//! its platform actually offers. Missing primitives report
//! `PlatformError::Unsupported` and the dispatcher degrades around them.

use super::error::{PlatformError, ShareError};

/// Title used when a share request carries none.
pub const DEFAULT_SHARE_TITLE: &str = "ContextOS Prompt";

/// Content handed to the native share sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn new(title: impl Into<String>, text: impl Into<String>, url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: if title.is_empty() {
                DEFAULT_SHARE_TITLE.to_string()
            } else {
                title
            },
            text: text.into(),
            url: url.into(),
        }
    }

    /// What the clipboard fallback copies: the text, or the url when the text is empty.
    pub fn clipboard_text(&self) -> &str {
        if self.text.is_empty() {
            &self.url
        } else {
            &self.text
        }
    }
}

pub trait Platform {
    /// Primary input is a touch screen.
    fn is_touch_primary(&self) -> bool {
        false
    }

    /// Running as an installed/standalone app rather than in a browser tab.
    fn is_standalone(&self) -> bool {
        false
    }

    fn supports_vibration(&self) -> bool {
        false
    }

    fn supports_share(&self) -> bool {
        false
    }

    /// Play a vibration pattern: alternating on/off durations in milliseconds.
    fn vibrate(&self, _pattern: &[u32]) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported("vibration"))
    }

    fn share(&self, _payload: &SharePayload) -> Result<(), ShareError> {
        Err(PlatformError::Unsupported("share").into())
    }

    fn write_clipboard(&self, _text: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported("clipboard"))
    }

    /// Selection-based copy used when the clipboard API refuses.
    fn legacy_copy(&self, _text: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported("legacy copy"))
    }
}

/// Platform with nothing available.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPlatform;

impl Platform for HeadlessPlatform {}
