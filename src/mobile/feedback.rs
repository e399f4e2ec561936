//! Native-feeling feedback: haptic pulses, toasts, activity overlays and the
//! share → clipboard → legacy-copy fallback chain.
//!
//! The dispatcher is a plain value built once by the host and shared (`Rc`)
//! with every recognizer. All of its mutable state lives behind `RefCell`s
//! and is only touched from the UI thread, so "last write wins" is the whole
//! synchronisation story: a new toast replaces the visible one, a new
//! overlay replaces the visible one.
//!
//! Nothing here returns an error to the caller. Platform failures are logged
//! and degrade into the next tier or into a no-op.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use web_time::Instant;

use super::capability::{Capabilities, CapabilityProbe};
use super::clock::Clock;
use super::config::FeedbackConfig;
use super::error::{CallbackResult, ShareError};
use super::platform::{Platform, SharePayload};

/// Haptic pulse kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticKind {
    Light,
    Medium,
    Heavy,
    Success,
    Warning,
    Error,
}

impl HapticKind {
    /// Vibration pattern in milliseconds (on, off, on, ...).
    pub fn pattern(self) -> &'static [u32] {
        match self {
            HapticKind::Light => &[10],
            HapticKind::Medium => &[50],
            HapticKind::Heavy => &[100],
            HapticKind::Success => &[10, 50, 10],
            HapticKind::Warning => &[50, 100],
            HapticKind::Error => &[100, 50, 100],
        }
    }
}

/// A single piece of user-perceptible feedback.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackRequest {
    Haptic(HapticKind),
    Toast { message: String, duration: Duration },
    Overlay(String),
}

/// Where a transient element is in its fade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientPhase {
    FadingIn,
    Shown,
    FadingOut,
}

/// Render-ready snapshot of the visible toast.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastView {
    pub message: String,
    pub opacity: f32,
    pub phase: TransientPhase,
}

/// Render-ready snapshot of the visible overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub message: String,
    pub opacity: f32,
    /// Swallows input while true; false once `hide()` started the fade-out
    pub blocking: bool,
}

struct Toast {
    message: String,
    shown_at: Instant,
    duration: Duration,
}

struct OverlayEntry {
    id: u64,
    message: String,
    shown_at: Instant,
    hidden_at: Option<Instant>,
}

#[derive(Default)]
struct OverlaySlot {
    current: Option<OverlayEntry>,
    next_id: u64,
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Disposable handle to an activity overlay.
///
/// `hide()` is idempotent. Hiding a handle whose overlay was already replaced
/// by a newer one does nothing. Dropping the handle does not hide the overlay.
#[must_use = "the overlay stays up until `hide()` is called"]
pub struct OverlayHandle {
    id: u64,
    slot: Weak<RefCell<OverlaySlot>>,
    clock: Rc<dyn Clock>,
}

impl OverlayHandle {
    pub fn hide(&self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let mut slot = slot.borrow_mut();
        if let Some(entry) = slot.current.as_mut() {
            if entry.id == self.id && entry.hidden_at.is_none() {
                entry.hidden_at = Some(self.clock.now());
                log::debug!("overlay {} hidden", self.id);
            }
        }
    }

    /// Whether this handle's overlay is still the one on screen and not hiding.
    pub fn is_active(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| {
            slot.borrow()
                .current
                .as_ref()
                .is_some_and(|e| e.id == self.id && e.hidden_at.is_none())
        })
    }
}

pub struct FeedbackDispatcher {
    platform: Rc<dyn Platform>,
    probe: CapabilityProbe,
    clock: Rc<dyn Clock>,
    config: FeedbackConfig,
    toast: RefCell<Option<Toast>>,
    overlay: Rc<RefCell<OverlaySlot>>,
}

impl FeedbackDispatcher {
    pub fn new(platform: Rc<dyn Platform>, clock: Rc<dyn Clock>) -> Self {
        Self {
            probe: CapabilityProbe::new(platform.clone()),
            platform,
            clock,
            config: FeedbackConfig::default(),
            toast: RefCell::new(None),
            overlay: Rc::new(RefCell::new(OverlaySlot::default())),
        }
    }

    pub fn with_config(mut self, config: FeedbackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.probe.detect()
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Route a request to the matching primitive.
    pub fn dispatch(&self, request: FeedbackRequest) -> Option<OverlayHandle> {
        match request {
            FeedbackRequest::Haptic(kind) => {
                self.haptic(kind);
                None
            }
            FeedbackRequest::Toast { message, duration } => {
                self.toast_for(message, duration);
                None
            }
            FeedbackRequest::Overlay(message) => Some(self.overlay(message)),
        }
    }

    // ─── Haptics ────────────────────────────────────────────────────────────

    pub fn haptic(&self, kind: HapticKind) {
        if !self.capabilities().haptics_enabled() {
            log::trace!("haptic {:?} skipped: not available", kind);
            return;
        }
        if let Err(e) = self.platform.vibrate(kind.pattern()) {
            log::debug!("haptic {:?} dropped: {}", kind, e);
        }
    }

    // ─── Toasts ─────────────────────────────────────────────────────────────

    /// Show a toast for the default duration.
    pub fn toast(&self, message: impl Into<String>) {
        self.toast_for(message, self.config.toast_duration);
    }

    /// Show a toast, replacing any visible one.
    pub fn toast_for(&self, message: impl Into<String>, duration: Duration) {
        let message = message.into();
        log::debug!("toast: {}", message);
        *self.toast.borrow_mut() = Some(Toast {
            message,
            shown_at: self.clock.now(),
            duration,
        });
    }

    /// The toast currently on screen, if any. Expired toasts are dropped here.
    pub fn visible_toast(&self) -> Option<ToastView> {
        let mut slot = self.toast.borrow_mut();
        let toast = slot.as_ref()?;
        let fade = self.config.fade;
        let age = self.clock.now().saturating_duration_since(toast.shown_at);

        if age >= toast.duration.saturating_add(fade) {
            *slot = None;
            return None;
        }

        let (phase, opacity) = if age < fade.min(toast.duration) {
            (TransientPhase::FadingIn, fraction(age, fade))
        } else if age < toast.duration {
            (TransientPhase::Shown, 1.0)
        } else {
            (
                TransientPhase::FadingOut,
                1.0 - fraction(age - toast.duration, fade),
            )
        };

        Some(ToastView {
            message: toast.message.clone(),
            opacity,
            phase,
        })
    }

    // ─── Overlays ───────────────────────────────────────────────────────────

    /// Show a blocking activity overlay, replacing any visible one.
    pub fn overlay(&self, message: impl Into<String>) -> OverlayHandle {
        let mut slot = self.overlay.borrow_mut();
        slot.next_id += 1;
        let id = slot.next_id;
        let message = message.into();
        log::debug!("overlay {}: {}", id, message);
        slot.current = Some(OverlayEntry {
            id,
            message,
            shown_at: self.clock.now(),
            hidden_at: None,
        });
        OverlayHandle {
            id,
            slot: Rc::downgrade(&self.overlay),
            clock: self.clock.clone(),
        }
    }

    /// The overlay currently on screen, if any. Fully faded overlays are dropped here.
    pub fn active_overlay(&self) -> Option<OverlayView> {
        let mut slot = self.overlay.borrow_mut();
        let entry = slot.current.as_ref()?;
        let now = self.clock.now();
        let fade = self.config.fade;

        let view = match entry.hidden_at {
            Some(hidden_at) => {
                let since = now.saturating_duration_since(hidden_at);
                if since >= fade {
                    slot.current = None;
                    return None;
                }
                OverlayView {
                    message: entry.message.clone(),
                    opacity: 1.0 - fraction(since, fade),
                    blocking: false,
                }
            }
            None => OverlayView {
                message: entry.message.clone(),
                opacity: fraction(now.saturating_duration_since(entry.shown_at), fade),
                blocking: true,
            },
        };
        Some(view)
    }

    // ─── Callback reporting ─────────────────────────────────────────────────

    /// Turn a callback outcome into feedback: an optional success toast, or
    /// one failure toast plus an error haptic.
    pub fn report(&self, result: &CallbackResult, success: Option<&str>, failure: &str) {
        match result {
            Ok(()) => {
                if let Some(message) = success {
                    self.toast(message);
                }
            }
            Err(e) => {
                log::warn!("{}: {}", failure, e);
                self.toast(failure);
                self.haptic(HapticKind::Error);
            }
        }
    }

    // ─── Share / clipboard ──────────────────────────────────────────────────

    /// Share through the native sheet, falling back to the clipboard.
    ///
    /// Returns `false` without copying when the user cancels the sheet.
    pub fn share(&self, payload: &SharePayload) -> bool {
        if !self.capabilities().can_share {
            log::debug!("share unsupported, copying instead");
            return self.copy_to_clipboard(payload.clipboard_text());
        }

        match self.platform.share(payload) {
            Ok(()) => {
                self.haptic(HapticKind::Success);
                true
            }
            Err(ShareError::Cancelled) => {
                log::debug!("share cancelled");
                false
            }
            Err(ShareError::Platform(e)) => {
                log::warn!("share failed, copying instead: {}", e);
                self.copy_to_clipboard(payload.clipboard_text())
            }
        }
    }

    /// Copy text through the clipboard API, then the legacy selection copy.
    pub fn copy_to_clipboard(&self, text: &str) -> bool {
        let copied = match self.platform.write_clipboard(text) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("clipboard write failed ({}), trying legacy copy", e);
                match self.platform.legacy_copy(text) {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("copy failed: {}", e);
                        false
                    }
                }
            }
        };

        if copied {
            self.haptic(HapticKind::Success);
            self.toast("Copied to clipboard");
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobile::error::{CallbackError, PlatformError};
    use crate::mobile::clock::ManualClock;
    use crate::mobile::testing::{harness, RecordingPlatform};

    #[test]
    fn test_haptic_patterns() {
        let h = harness(RecordingPlatform::touch_device());
        h.feedback.haptic(HapticKind::Light);
        assert_eq!(h.platform.last_vibration(), Some(vec![10]));
        h.feedback.haptic(HapticKind::Success);
        assert_eq!(h.platform.last_vibration(), Some(vec![10, 50, 10]));
        h.feedback.haptic(HapticKind::Error);
        assert_eq!(h.platform.last_vibration(), Some(vec![100, 50, 100]));
    }

    #[test]
    fn test_haptic_noop_without_vibration() {
        let h = harness(RecordingPlatform::touch_only());
        h.feedback.haptic(HapticKind::Heavy);
        assert_eq!(h.platform.vibration_count(), 0);
    }

    #[test]
    fn test_haptic_noop_when_not_touch_primary() {
        let h = harness(RecordingPlatform::vibration_only());
        h.feedback.haptic(HapticKind::Medium);
        assert_eq!(h.platform.vibration_count(), 0);
    }

    #[test]
    fn test_haptic_swallows_platform_failure() {
        let h = harness(RecordingPlatform::touch_device());
        h.platform.vibrate_fails.set(true);
        h.feedback.haptic(HapticKind::Medium);
        assert_eq!(h.platform.vibration_count(), 0);
    }

    #[test]
    fn test_toast_lifecycle() {
        let h = harness(RecordingPlatform::desktop());
        h.feedback.toast("Saved");

        let view = h.feedback.visible_toast().unwrap();
        assert_eq!(view.phase, TransientPhase::FadingIn);
        assert_eq!(view.opacity, 0.0);

        h.clock.advance_ms(1000);
        let view = h.feedback.visible_toast().unwrap();
        assert_eq!(view.phase, TransientPhase::Shown);
        assert_eq!(view.opacity, 1.0);

        h.clock.advance_ms(1150);
        let view = h.feedback.visible_toast().unwrap();
        assert_eq!(view.phase, TransientPhase::FadingOut);
        assert!((view.opacity - 0.5).abs() < 1e-3);

        h.clock.advance_ms(150);
        assert!(h.feedback.visible_toast().is_none());
    }

    #[test]
    fn test_sticky_toast_stays_visible() {
        let h = harness(RecordingPlatform::desktop());
        h.feedback.toast_for("Offline", Duration::MAX);
        h.clock.advance_ms(60_000);
        let view = h.feedback.visible_toast().unwrap();
        assert_eq!(view.message, "Offline");
        assert_eq!(view.phase, TransientPhase::Shown);
    }

    #[test]
    fn test_configured_toast_duration() {
        let platform = Rc::new(RecordingPlatform::desktop());
        let clock = Rc::new(ManualClock::new());
        let feedback = FeedbackDispatcher::new(platform, clock.clone())
            .with_config(FeedbackConfig::default().with_toast_duration(Duration::from_millis(500)));
        feedback.toast("Saved");
        clock.advance_ms(700);
        assert_eq!(feedback.visible_toast().unwrap().phase, TransientPhase::FadingOut);
        clock.advance_ms(100);
        assert!(feedback.visible_toast().is_none());
    }

    #[test]
    fn test_new_toast_preempts_visible_one() {
        let h = harness(RecordingPlatform::desktop());
        h.feedback.toast("A");
        h.clock.advance_ms(1000);
        h.feedback.toast("B");

        let view = h.feedback.visible_toast().unwrap();
        assert_eq!(view.message, "B");
        // B's cycle restarted: still visible after A would have expired.
        h.clock.advance_ms(1500);
        assert_eq!(h.feedback.visible_toast().unwrap().message, "B");
    }

    #[test]
    fn test_overlay_hide_is_idempotent() {
        let h = harness(RecordingPlatform::desktop());
        let handle = h.feedback.overlay("Deleting...");
        h.clock.advance_ms(300);
        assert!(h.feedback.active_overlay().unwrap().blocking);

        handle.hide();
        h.clock.advance_ms(100);
        let once = h.feedback.active_overlay();
        handle.hide();
        let twice = h.feedback.active_overlay();
        assert_eq!(once, twice);
        assert!(!once.unwrap().blocking);

        h.clock.advance_ms(200);
        assert!(h.feedback.active_overlay().is_none());
        handle.hide();
        assert!(h.feedback.active_overlay().is_none());
    }

    #[test]
    fn test_new_overlay_replaces_and_stale_hide_is_ignored() {
        let h = harness(RecordingPlatform::desktop());
        let first = h.feedback.overlay("Loading...");
        let second = h.feedback.overlay("Saving...");
        assert!(!first.is_active());
        assert!(second.is_active());

        first.hide();
        let view = h.feedback.active_overlay().unwrap();
        assert_eq!(view.message, "Saving...");
        assert!(view.blocking);

        second.hide();
        assert!(!second.is_active());
    }

    #[test]
    fn test_overlay_handle_outlives_dispatcher() {
        let h = harness(RecordingPlatform::desktop());
        let handle = h.feedback.overlay("Loading...");
        drop(h);
        handle.hide();
        assert!(!handle.is_active());
    }

    #[test]
    fn test_share_without_support_goes_to_clipboard() {
        let h = harness(RecordingPlatform::desktop());
        let payload = SharePayload::new("Greeting", "Hello {{name}}", "https://ctx.example");
        assert!(h.feedback.share(&payload));
        assert!(h.platform.shares.borrow().is_empty());
        assert_eq!(*h.platform.clipboard.borrow(), vec!["Hello {{name}}".to_string()]);
        assert_eq!(h.feedback.visible_toast().unwrap().message, "Copied to clipboard");
    }

    #[test]
    fn test_share_success_fires_success_haptic() {
        let h = harness(RecordingPlatform::touch_device());
        assert!(h.feedback.share(&SharePayload::new("t", "x", "u")));
        assert_eq!(h.platform.shares.borrow().len(), 1);
        assert_eq!(h.platform.last_vibration(), Some(vec![10, 50, 10]));
        assert!(h.platform.clipboard.borrow().is_empty());
    }

    #[test]
    fn test_share_cancelled_returns_false_silently() {
        let h = harness(RecordingPlatform::touch_device());
        *h.platform.share_error.borrow_mut() = Some(ShareError::Cancelled);
        assert!(!h.feedback.share(&SharePayload::new("t", "x", "u")));
        assert!(h.platform.clipboard.borrow().is_empty());
        assert!(h.feedback.visible_toast().is_none());
    }

    #[test]
    fn test_share_failure_falls_back_to_url_when_text_empty() {
        let h = harness(RecordingPlatform::touch_device());
        *h.platform.share_error.borrow_mut() =
            Some(ShareError::Platform(PlatformError::Failed("sheet crashed".into())));
        assert!(h.feedback.share(&SharePayload::new("t", "", "https://ctx.example/p/1")));
        assert_eq!(
            *h.platform.clipboard.borrow(),
            vec!["https://ctx.example/p/1".to_string()]
        );
    }

    #[test]
    fn test_clipboard_legacy_tier() {
        let h = harness(RecordingPlatform::desktop());
        h.platform.clipboard_fails.set(true);
        assert!(h.feedback.copy_to_clipboard("abc"));
        assert_eq!(*h.platform.legacy.borrow(), vec!["abc".to_string()]);
    }

    #[test]
    fn test_clipboard_both_tiers_fail() {
        let h = harness(RecordingPlatform::desktop());
        h.platform.clipboard_fails.set(true);
        h.platform.legacy_fails.set(true);
        assert!(!h.feedback.copy_to_clipboard("abc"));
        assert!(h.feedback.visible_toast().is_none());
    }

    #[test]
    fn test_report_failure_toasts_and_buzzes_once() {
        let h = harness(RecordingPlatform::touch_device());
        h.feedback
            .report(&Err(CallbackError::new("503")), Some("ok"), "Refresh failed");
        assert_eq!(h.feedback.visible_toast().unwrap().message, "Refresh failed");
        assert_eq!(*h.platform.vibrations.borrow(), vec![vec![100, 50, 100]]);
    }

    #[test]
    fn test_dispatch_routes_requests() {
        let h = harness(RecordingPlatform::touch_device());
        assert!(h
            .feedback
            .dispatch(FeedbackRequest::Haptic(HapticKind::Warning))
            .is_none());
        assert_eq!(h.platform.last_vibration(), Some(vec![50, 100]));

        h.feedback.dispatch(FeedbackRequest::Toast {
            message: "hi".into(),
            duration: Duration::from_millis(500),
        });
        assert_eq!(h.feedback.visible_toast().unwrap().message, "hi");

        let handle = h
            .feedback
            .dispatch(FeedbackRequest::Overlay("busy".into()))
            .unwrap();
        assert!(handle.is_active());
    }
}
