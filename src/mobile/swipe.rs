//! Swipe-to-act recognizer for list rows.
//!
//! Each bound row runs its own `Idle → Swiping → {Committed | Idle}` cycle.
//! Rows are independent: two fingers on two rows make two gestures. A row
//! fires at most one action per gesture, and only when released past the
//! release threshold in a direction that has a handler.

use std::collections::HashMap;
use std::rc::Rc;

use web_time::Instant;

use super::config::SwipeConfig;
use super::error::{CallbackResult, GestureError};
use super::feedback::{FeedbackDispatcher, HapticKind};
use super::touch::{Axis, ElementId, GestureOutcome, GestureTracker};

const TOAST_ACTION_FAILED: &str = "Action failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeState {
    Idle,
    Swiping,
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// What a released swipe did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeRelease {
    /// The handler for this direction ran.
    Fired(SwipeDirection),
    /// Nothing fired; the row snaps back.
    Reset,
}

pub type SwipeAction = Box<dyn FnMut() -> CallbackResult>;

/// Optional per-direction handlers for one row.
#[derive(Default)]
pub struct SwipeActions {
    left: Option<SwipeAction>,
    right: Option<SwipeAction>,
}

impl SwipeActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_left(mut self, action: impl FnMut() -> CallbackResult + 'static) -> Self {
        self.left = Some(Box::new(action));
        self
    }

    pub fn on_right(mut self, action: impl FnMut() -> CallbackResult + 'static) -> Self {
        self.right = Some(Box::new(action));
        self
    }

    fn get_mut(&mut self, direction: SwipeDirection) -> Option<&mut SwipeAction> {
        match direction {
            SwipeDirection::Left => self.left.as_mut(),
            SwipeDirection::Right => self.right.as_mut(),
        }
    }
}

struct Row {
    actions: SwipeActions,
    state: SwipeState,
    offset: f32,
}

pub struct SwipeActionController {
    config: SwipeConfig,
    tracker: GestureTracker,
    feedback: Rc<FeedbackDispatcher>,
    rows: HashMap<ElementId, Row>,
}

impl SwipeActionController {
    pub fn new(config: SwipeConfig, feedback: Rc<FeedbackDispatcher>) -> Result<Self, GestureError> {
        config.tracker.validate()?;
        Ok(Self {
            config,
            tracker: GestureTracker::new(config.tracker),
            feedback,
            rows: HashMap::new(),
        })
    }

    /// Bind (or rebind) a row. Rebinding drops any drag in progress on it.
    pub fn bind(&mut self, row: ElementId, actions: SwipeActions) {
        if self.tracker.is_open(row) {
            let _ = self.tracker.cancel(row);
        }
        self.rows.insert(
            row,
            Row {
                actions,
                state: SwipeState::Idle,
                offset: 0.0,
            },
        );
    }

    pub fn unbind(&mut self, row: ElementId) {
        if self.tracker.is_open(row) {
            let _ = self.tracker.cancel(row);
        }
        self.rows.remove(&row);
    }

    pub fn is_bound(&self, row: ElementId) -> bool {
        self.rows.contains_key(&row)
    }

    pub fn state(&self, row: ElementId) -> Option<SwipeState> {
        self.rows.get(&row).map(|r| r.state)
    }

    /// Current visual offset of a row, already clamped.
    pub fn offset(&self, row: ElementId) -> f32 {
        self.rows.get(&row).map_or(0.0, |r| r.offset)
    }

    pub fn pointer_down(&mut self, row: ElementId, x: f32, y: f32, time: Instant) -> SwipeState {
        let Some(entry) = self.rows.get_mut(&row) else {
            log::trace!("swipe ignored: {:?} not bound", row);
            return SwipeState::Idle;
        };
        match self.tracker.begin(row, x, y, time) {
            Ok(_) => {
                entry.state = SwipeState::Swiping;
                entry.offset = 0.0;
                log::debug!("swipe {:?}: -> Swiping", row);
            }
            Err(e) => log::warn!("swipe: {}", e),
        }
        entry.state
    }

    pub fn pointer_move(
        &mut self,
        row: ElementId,
        x: f32,
        y: f32,
        time: Instant,
    ) -> Option<GestureOutcome> {
        let entry = self.rows.get_mut(&row)?;
        if entry.state != SwipeState::Swiping {
            return None;
        }
        let outcome = match self.tracker.update(row, x, y, time) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("swipe: {}", e);
                return None;
            }
        };
        entry.offset = if outcome.axis == Axis::Horizontal {
            outcome
                .delta
                .clamp(-self.config.max_offset, self.config.max_offset)
        } else {
            0.0
        };
        Some(outcome)
    }

    pub fn pointer_up(&mut self, row: ElementId) -> SwipeRelease {
        let Some(entry) = self.rows.get_mut(&row) else {
            return SwipeRelease::Reset;
        };
        if entry.state != SwipeState::Swiping {
            return SwipeRelease::Reset;
        }
        entry.offset = 0.0;
        entry.state = SwipeState::Idle;

        let outcome = match self.tracker.end(row) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("swipe: {}", e);
                return SwipeRelease::Reset;
            }
        };
        if !outcome.committed || outcome.axis != Axis::Horizontal {
            log::debug!("swipe {:?}: released below threshold", row);
            return SwipeRelease::Reset;
        }

        let direction = if outcome.delta < 0.0 {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        };
        let Some(action) = entry.actions.get_mut(direction) else {
            log::debug!("swipe {:?}: no {:?} handler", row, direction);
            return SwipeRelease::Reset;
        };

        entry.state = SwipeState::Committed;
        log::debug!("swipe {:?}: -> Committed ({:?})", row, direction);
        self.feedback.haptic(HapticKind::Medium);
        let result = action();
        self.feedback.report(&result, None, TOAST_ACTION_FAILED);
        SwipeRelease::Fired(direction)
    }

    /// The platform took the pointer stream away.
    pub fn pointer_cancel(&mut self, row: ElementId) {
        let Some(entry) = self.rows.get_mut(&row) else {
            return;
        };
        if entry.state == SwipeState::Swiping {
            if let Err(e) = self.tracker.cancel(row) {
                log::warn!("swipe: {}", e);
            }
            log::debug!("swipe {:?}: cancelled", row);
        }
        entry.state = SwipeState::Idle;
        entry.offset = 0.0;
    }
}
