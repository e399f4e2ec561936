//! Pull-to-refresh recognizer.
//!
//! ```text
//!  Idle ──down at scroll top──▶ Pulling ◀──progress < 1──┐
//!   ▲                             │                       │
//!   │                     progress = 1 (medium haptic)    │
//!   │                             ▼                       │
//!   │                       ArmedToRelease ───────────────┘
//!   │                             │ up
//!   │                             ▼
//!   └── settled + cool-down ── Refreshing (success haptic, reload())
//! ```
//!
//! A release from `Pulling` and a cancel from either drag state go straight
//! back to `Idle`. The reload callback hands back a `ReloadTicket`; the host
//! calls `poll()` from its update loop until the ticket settles.

use std::rc::Rc;
use std::sync::mpsc::{self, TryRecvError};

use web_time::Instant;

use super::config::PullConfig;
use super::error::{CallbackError, CallbackResult, GestureError};
use super::feedback::{FeedbackDispatcher, HapticKind};
use super::touch::{Axis, ElementId, GestureOutcome, GestureTracker};

pub const LABEL_PULL: &str = "Pull to refresh";
pub const LABEL_RELEASE: &str = "Release to refresh";
pub const LABEL_REFRESHING: &str = "Refreshing...";

const TOAST_REFRESHED: &str = "Refreshed successfully";
const TOAST_REFRESH_FAILED: &str = "Refresh failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    Idle,
    Pulling,
    ArmedToRelease,
    Refreshing,
}

/// Deferred result of one `reload()` call.
///
/// Dropping the paired `ReloadCompleter` without completing counts as a
/// failure, so a lost worker can never leave the indicator stuck.
pub struct ReloadTicket {
    rx: mpsc::Receiver<CallbackResult>,
}

/// Settles a `ReloadTicket`. `Send`, so it can move to a worker thread.
pub struct ReloadCompleter {
    tx: mpsc::Sender<CallbackResult>,
}

impl ReloadTicket {
    pub fn pending() -> (ReloadCompleter, ReloadTicket) {
        let (tx, rx) = mpsc::channel();
        (ReloadCompleter { tx }, ReloadTicket { rx })
    }

    /// A ticket that is already settled.
    pub fn ready(result: CallbackResult) -> Self {
        let (completer, ticket) = Self::pending();
        completer.complete(result);
        ticket
    }

    fn poll(&self) -> Option<CallbackResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(CallbackError::new("reload dropped without settling")))
            }
        }
    }
}

impl ReloadCompleter {
    pub fn complete(self, result: CallbackResult) {
        // Receiver gone means the controller was dropped; nothing to report to.
        let _ = self.tx.send(result);
    }
}

/// Data-layer reload hook.
pub trait Reload {
    fn reload(&mut self) -> ReloadTicket;
}

impl<F> Reload for F
where
    F: FnMut() -> ReloadTicket,
{
    fn reload(&mut self) -> ReloadTicket {
        self()
    }
}

/// Indicator presentation derived from the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullIndicator {
    pub offset: f32,
    pub opacity: f32,
    pub label: &'static str,
}

impl PullIndicator {
    pub const REST: PullIndicator = PullIndicator {
        offset: 0.0,
        opacity: 0.0,
        label: LABEL_PULL,
    };
}

struct Refresh {
    /// `None` once the reload settled
    ticket: Option<ReloadTicket>,
    released_at: Instant,
}

pub struct PullToRefreshController {
    region: ElementId,
    config: PullConfig,
    tracker: GestureTracker,
    feedback: Rc<FeedbackDispatcher>,
    reload: Box<dyn Reload>,
    state: PullState,
    /// Medium haptic already played for this drag
    armed_once: bool,
    indicator: PullIndicator,
    refresh: Option<Refresh>,
}

impl PullToRefreshController {
    pub fn new(
        region: ElementId,
        config: PullConfig,
        feedback: Rc<FeedbackDispatcher>,
        reload: impl Reload + 'static,
    ) -> Result<Self, GestureError> {
        config.tracker.validate()?;
        Ok(Self {
            region,
            config,
            tracker: GestureTracker::new(config.tracker),
            feedback,
            reload: Box::new(reload),
            state: PullState::Idle,
            armed_once: false,
            indicator: PullIndicator::REST,
            refresh: None,
        })
    }

    pub fn state(&self) -> PullState {
        self.state
    }

    pub fn indicator(&self) -> PullIndicator {
        self.indicator
    }

    fn is_dragging(&self) -> bool {
        matches!(self.state, PullState::Pulling | PullState::ArmedToRelease)
    }

    /// Pointer pressed inside the region. Only tracked at scroll offset 0.
    pub fn pointer_down(&mut self, x: f32, y: f32, time: Instant, scroll_offset: f32) -> PullState {
        if self.state == PullState::Refreshing {
            log::debug!("pull ignored: refresh in flight");
            return self.state;
        }
        if scroll_offset > 0.0 {
            log::trace!("pull ignored: region scrolled to {}", scroll_offset);
            return self.state;
        }
        match self.tracker.begin(self.region, x, y, time) {
            Ok(_) => {
                self.state = PullState::Pulling;
                self.armed_once = false;
                log::debug!("pull: Idle -> Pulling");
            }
            Err(e) => log::warn!("pull: {}", e),
        }
        self.state
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, time: Instant) -> Option<GestureOutcome> {
        if !self.is_dragging() {
            return None;
        }
        let outcome = match self.tracker.update(self.region, x, y, time) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("pull: {}", e);
                return None;
            }
        };

        let pull = pull_distance(&outcome);
        let progress = if pull > 0.0 { outcome.progress } else { 0.0 };

        if progress >= 1.0 {
            if self.state == PullState::Pulling {
                self.state = PullState::ArmedToRelease;
                log::debug!("pull: Pulling -> ArmedToRelease");
            }
            if !self.armed_once {
                self.armed_once = true;
                self.feedback.haptic(HapticKind::Medium);
            }
        } else if self.state == PullState::ArmedToRelease {
            self.state = PullState::Pulling;
            log::debug!("pull: ArmedToRelease -> Pulling");
        }

        self.indicator = PullIndicator {
            offset: pull * self.config.indicator_damping,
            opacity: progress,
            label: if self.state == PullState::ArmedToRelease {
                LABEL_RELEASE
            } else {
                LABEL_PULL
            },
        };
        Some(outcome)
    }

    pub fn pointer_up(&mut self) -> PullState {
        if !self.is_dragging() {
            return self.state;
        }
        match self.tracker.end(self.region) {
            Ok(outcome) if self.state == PullState::ArmedToRelease && outcome.committed => {
                self.start_refresh();
            }
            Ok(_) => {
                log::debug!("pull: released below threshold");
                self.reset();
            }
            Err(e) => {
                log::warn!("pull: {}", e);
                self.reset();
            }
        }
        self.state
    }

    /// The platform took the pointer stream away.
    pub fn pointer_cancel(&mut self) -> PullState {
        if !self.is_dragging() {
            return self.state;
        }
        if let Err(e) = self.tracker.cancel(self.region) {
            log::warn!("pull: {}", e);
        }
        log::debug!("pull: cancelled");
        self.reset();
        self.state
    }

    /// Settle the reload and run the visual cool-down. Call once per frame.
    pub fn poll(&mut self) -> PullState {
        let Some(refresh) = self.refresh.as_mut() else {
            return self.state;
        };

        if let Some(result) = refresh.ticket.as_ref().and_then(ReloadTicket::poll) {
            refresh.ticket = None;
            self.feedback
                .report(&result, Some(TOAST_REFRESHED), TOAST_REFRESH_FAILED);
        }

        let cooled = self.feedback.now().saturating_duration_since(refresh.released_at)
            >= self.config.cooldown;
        if refresh.ticket.is_none() && cooled {
            log::debug!("pull: Refreshing -> Idle");
            self.reset();
        }
        self.state
    }

    fn start_refresh(&mut self) {
        log::debug!("pull: ArmedToRelease -> Refreshing");
        self.state = PullState::Refreshing;
        self.indicator = PullIndicator {
            offset: self.config.refreshing_offset,
            opacity: 1.0,
            label: LABEL_REFRESHING,
        };
        self.feedback.haptic(HapticKind::Success);
        let ticket = self.reload.reload();
        self.refresh = Some(Refresh {
            ticket: Some(ticket),
            released_at: self.feedback.now(),
        });
        self.poll();
    }

    fn reset(&mut self) {
        self.state = PullState::Idle;
        self.indicator = PullIndicator::REST;
        self.armed_once = false;
        self.refresh = None;
    }
}

/// Downward vertical displacement; anything else does not pull.
fn pull_distance(outcome: &GestureOutcome) -> f32 {
    if outcome.axis == Axis::Vertical && outcome.delta > 0.0 {
        outcome.delta
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobile::testing::{harness, Harness, RecordingPlatform};
    use std::cell::{Cell, RefCell};

    const REGION: ElementId = ElementId(100);
    const MEDIUM: [u32; 1] = [50];
    const SUCCESS: [u32; 3] = [10, 50, 10];
    const ERROR: [u32; 3] = [100, 50, 100];

    struct Rig {
        h: Harness,
        pull: PullToRefreshController,
        calls: Rc<Cell<usize>>,
        completer: Rc<RefCell<Option<ReloadCompleter>>>,
    }

    impl Rig {
        fn now(&self) -> Instant {
            self.h.feedback.now()
        }

        fn drag(&mut self, to_y: f32) {
            let t = self.now();
            self.pull.pointer_down(0.0, 0.0, t, 0.0);
            self.pull.pointer_move(0.0, to_y, t);
        }

        fn complete(&self, result: CallbackResult) {
            self.completer.borrow_mut().take().unwrap().complete(result);
        }
    }

    fn rig() -> Rig {
        let h = harness(RecordingPlatform::touch_device());
        let calls = Rc::new(Cell::new(0));
        let completer = Rc::new(RefCell::new(None));
        let (c, slot) = (calls.clone(), completer.clone());
        let pull = PullToRefreshController::new(
            REGION,
            PullConfig::default(),
            h.feedback.clone(),
            move || {
                c.set(c.get() + 1);
                let (done, ticket) = ReloadTicket::pending();
                *slot.borrow_mut() = Some(done);
                ticket
            },
        )
        .unwrap();
        Rig {
            h,
            pull,
            calls,
            completer,
        }
    }

    #[test]
    fn test_full_refresh_cycle() {
        let mut r = rig();
        let t = r.now();
        assert_eq!(r.pull.pointer_down(0.0, 0.0, t, 0.0), PullState::Pulling);

        let out = r.pull.pointer_move(0.0, 90.0, t).unwrap();
        assert_eq!(out.axis, Axis::Vertical);
        assert_eq!(out.progress, 1.0);
        assert_eq!(r.pull.state(), PullState::ArmedToRelease);
        assert_eq!(r.pull.indicator().label, LABEL_RELEASE);
        assert_eq!(*r.h.platform.vibrations.borrow(), vec![MEDIUM.to_vec()]);

        assert_eq!(r.pull.pointer_up(), PullState::Refreshing);
        assert_eq!(r.calls.get(), 1);
        assert_eq!(r.h.platform.last_vibration(), Some(SUCCESS.to_vec()));
        assert_eq!(r.pull.indicator().label, LABEL_REFRESHING);

        r.complete(Ok(()));
        assert_eq!(r.pull.poll(), PullState::Refreshing);
        assert_eq!(
            r.h.feedback.visible_toast().unwrap().message,
            "Refreshed successfully"
        );

        r.h.clock.advance_ms(500);
        assert_eq!(r.pull.poll(), PullState::Idle);
        assert_eq!(r.pull.indicator(), PullIndicator::REST);
    }

    #[test]
    fn test_armed_haptic_fires_once_per_drag() {
        let mut r = rig();
        let t = r.now();
        r.pull.pointer_down(0.0, 0.0, t, 0.0);
        for y in [85.0, 90.0, 70.0, 95.0, 79.0, 120.0] {
            r.pull.pointer_move(0.0, y, t);
        }
        assert_eq!(r.pull.state(), PullState::ArmedToRelease);
        assert_eq!(r.h.platform.vibration_count(), 1);
    }

    #[test]
    fn test_armed_reverts_to_pulling() {
        let mut r = rig();
        r.drag(90.0);
        let t = r.now();
        r.pull.pointer_move(0.0, 60.0, t);
        assert_eq!(r.pull.state(), PullState::Pulling);
        assert_eq!(r.pull.indicator().label, LABEL_PULL);
        assert_eq!(r.pull.pointer_up(), PullState::Idle);
        assert_eq!(r.calls.get(), 0);
    }

    #[test]
    fn test_short_pull_resets_without_reload() {
        let mut r = rig();
        r.drag(40.0);
        assert_eq!(r.pull.state(), PullState::Pulling);
        assert!((r.pull.indicator().opacity - 0.5).abs() < 1e-6);
        assert_eq!(r.pull.indicator().offset, 20.0);

        assert_eq!(r.pull.pointer_up(), PullState::Idle);
        assert_eq!(r.calls.get(), 0);
        assert_eq!(r.pull.indicator(), PullIndicator::REST);
        assert_eq!(r.h.platform.vibration_count(), 0);
    }

    #[test]
    fn test_not_tracked_when_scrolled() {
        let mut r = rig();
        let t = r.now();
        assert_eq!(r.pull.pointer_down(0.0, 0.0, t, 12.0), PullState::Idle);
        assert!(r.pull.pointer_move(0.0, 200.0, t).is_none());
        assert_eq!(r.pull.pointer_up(), PullState::Idle);
        assert_eq!(r.calls.get(), 0);
    }

    #[test]
    fn test_upward_and_sideways_drags_never_arm() {
        let mut r = rig();
        r.drag(-200.0);
        assert_eq!(r.pull.state(), PullState::Pulling);
        assert_eq!(r.pull.indicator().opacity, 0.0);
        r.pull.pointer_up();

        let t = r.now();
        r.pull.pointer_down(0.0, 0.0, t, 0.0);
        r.pull.pointer_move(150.0, 10.0, t);
        r.pull.pointer_move(150.0, 200.0, t);
        assert_eq!(r.pull.state(), PullState::Pulling);
        assert_eq!(r.pull.pointer_up(), PullState::Idle);
        assert_eq!(r.calls.get(), 0);
    }

    #[test]
    fn test_failed_reload_reports_and_returns_idle() {
        let mut r = rig();
        r.drag(100.0);
        r.pull.pointer_up();
        r.complete(Err(CallbackError::new("HTTP 500")));
        r.h.clock.advance_ms(500);
        assert_eq!(r.pull.poll(), PullState::Idle);

        assert_eq!(r.h.feedback.visible_toast().unwrap().message, "Refresh failed");
        assert_eq!(
            *r.h.platform.vibrations.borrow(),
            vec![MEDIUM.to_vec(), SUCCESS.to_vec(), ERROR.to_vec()]
        );
    }

    #[test]
    fn test_waits_for_slow_reload_past_cooldown() {
        let mut r = rig();
        r.drag(100.0);
        r.pull.pointer_up();
        r.h.clock.advance_ms(5_000);
        assert_eq!(r.pull.poll(), PullState::Refreshing);
        r.complete(Ok(()));
        assert_eq!(r.pull.poll(), PullState::Idle);
    }

    #[test]
    fn test_dropped_completer_counts_as_failure() {
        let mut r = rig();
        r.drag(100.0);
        r.pull.pointer_up();
        drop(r.completer.borrow_mut().take());
        r.h.clock.advance_ms(500);
        assert_eq!(r.pull.poll(), PullState::Idle);
        assert_eq!(r.h.feedback.visible_toast().unwrap().message, "Refresh failed");
    }

    #[test]
    fn test_pull_during_refresh_is_ignored() {
        let mut r = rig();
        r.drag(100.0);
        r.pull.pointer_up();

        let t = r.now();
        assert_eq!(r.pull.pointer_down(0.0, 0.0, t, 0.0), PullState::Refreshing);
        assert!(r.pull.pointer_move(0.0, 150.0, t).is_none());
        assert_eq!(r.pull.pointer_up(), PullState::Refreshing);
        assert_eq!(r.calls.get(), 1);
    }

    #[test]
    fn test_cancel_while_armed() {
        let mut r = rig();
        r.drag(100.0);
        assert_eq!(r.pull.pointer_cancel(), PullState::Idle);
        assert_eq!(r.pull.indicator(), PullIndicator::REST);
        assert_eq!(r.pull.pointer_up(), PullState::Idle);
        assert_eq!(r.calls.get(), 0);
    }

    #[test]
    fn test_nested_down_keeps_current_drag() {
        let mut r = rig();
        r.drag(50.0);
        let t = r.now();
        assert_eq!(r.pull.pointer_down(5.0, 5.0, t, 0.0), PullState::Pulling);
        r.pull.pointer_move(0.0, 90.0, t);
        assert_eq!(r.pull.state(), PullState::ArmedToRelease);
    }

    #[test]
    fn test_ready_ticket_settles_on_release() {
        let h = harness(RecordingPlatform::desktop());
        let mut pull = PullToRefreshController::new(
            REGION,
            PullConfig::default(),
            h.feedback.clone(),
            || ReloadTicket::ready(Ok(())),
        )
        .unwrap();
        let t = h.feedback.now();
        pull.pointer_down(0.0, 0.0, t, 0.0);
        pull.pointer_move(0.0, 80.0, t);
        assert_eq!(pull.pointer_up(), PullState::Refreshing);
        assert_eq!(
            h.feedback.visible_toast().unwrap().message,
            "Refreshed successfully"
        );
        h.clock.advance_ms(499);
        assert_eq!(pull.poll(), PullState::Refreshing);
        h.clock.advance_ms(1);
        assert_eq!(pull.poll(), PullState::Idle);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let h = harness(RecordingPlatform::desktop());
        let cfg = PullConfig::default()
            .with_tracker(crate::mobile::config::TrackerConfig::new(30.0, 10.0));
        let result = PullToRefreshController::new(REGION, cfg, h.feedback.clone(), || {
            ReloadTicket::ready(Ok(()))
        });
        assert!(result.is_err());
    }
}
