//! Test doubles shared by the mobile module tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::clock::ManualClock;
use super::error::{PlatformError, ShareError};
use super::feedback::FeedbackDispatcher;
use super::platform::{Platform, SharePayload};

/// Platform that records every call and fails on request.
#[derive(Default)]
pub struct RecordingPlatform {
    pub touch: bool,
    pub standalone: bool,
    pub vibration: bool,
    pub share: bool,
    probe_calls: Cell<usize>,
    pub vibrations: RefCell<Vec<Vec<u32>>>,
    pub shares: RefCell<Vec<SharePayload>>,
    pub clipboard: RefCell<Vec<String>>,
    pub legacy: RefCell<Vec<String>>,
    pub share_error: RefCell<Option<ShareError>>,
    pub vibrate_fails: Cell<bool>,
    pub clipboard_fails: Cell<bool>,
    pub legacy_fails: Cell<bool>,
}

impl RecordingPlatform {
    pub fn touch_device() -> Self {
        Self {
            touch: true,
            standalone: true,
            vibration: true,
            share: true,
            ..Default::default()
        }
    }

    pub fn desktop() -> Self {
        Self::default()
    }

    /// Touch screen without a vibration motor.
    pub fn touch_only() -> Self {
        Self {
            touch: true,
            ..Default::default()
        }
    }

    /// Vibration motor on a mouse-driven device.
    pub fn vibration_only() -> Self {
        Self {
            vibration: true,
            ..Default::default()
        }
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.get()
    }

    pub fn vibration_count(&self) -> usize {
        self.vibrations.borrow().len()
    }

    pub fn last_vibration(&self) -> Option<Vec<u32>> {
        self.vibrations.borrow().last().cloned()
    }
}

impl Platform for RecordingPlatform {
    fn is_touch_primary(&self) -> bool {
        self.probe_calls.set(self.probe_calls.get() + 1);
        self.touch
    }

    fn is_standalone(&self) -> bool {
        self.standalone
    }

    fn supports_vibration(&self) -> bool {
        self.vibration
    }

    fn supports_share(&self) -> bool {
        self.share
    }

    fn vibrate(&self, pattern: &[u32]) -> Result<(), PlatformError> {
        if self.vibrate_fails.get() {
            return Err(PlatformError::Failed("motor busy".into()));
        }
        self.vibrations.borrow_mut().push(pattern.to_vec());
        Ok(())
    }

    fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        self.shares.borrow_mut().push(payload.clone());
        match self.share_error.borrow().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write_clipboard(&self, text: &str) -> Result<(), PlatformError> {
        if self.clipboard_fails.get() {
            return Err(PlatformError::Failed("permission denied".into()));
        }
        self.clipboard.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn legacy_copy(&self, text: &str) -> Result<(), PlatformError> {
        if self.legacy_fails.get() {
            return Err(PlatformError::Failed("no selection".into()));
        }
        self.legacy.borrow_mut().push(text.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub platform: Rc<RecordingPlatform>,
    pub clock: Rc<ManualClock>,
    pub feedback: Rc<FeedbackDispatcher>,
}

pub fn harness(platform: RecordingPlatform) -> Harness {
    let platform = Rc::new(platform);
    let clock = Rc::new(ManualClock::new());
    let feedback = Rc::new(FeedbackDispatcher::new(platform.clone(), clock.clone()));
    Harness {
        platform,
        clock,
        feedback,
    }
}
