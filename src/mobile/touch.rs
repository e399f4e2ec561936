//! Pointer Drag Tracking
//!
//! Turns a raw pointer stream into an axis-locked drag description:
//! - pointer-down opens a `DragSample` for one bound element
//! - pointer-move recomputes the outcome; the axis locks once the drag
//!   leaves the lock radius and never changes afterwards
//! - pointer-up closes the sample and reports whether it committed
//! - cancel closes the sample and never commits
//!
//! The tracker has no opinion about what a drag means. Pull-to-refresh and
//! swipe actions both sit on top of it with their own thresholds.

use std::collections::HashMap;
use std::time::Duration;

use web_time::Instant;

use super::config::TrackerConfig;
use super::error::GestureError;

/// Identity of a bound element (scroll region, list row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Drag axis decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    Undetermined,
}

/// One live drag on one element.
#[derive(Debug, Clone, Copy)]
pub struct DragSample {
    pub start_x: f32,
    pub start_y: f32,
    pub current_x: f32,
    pub current_y: f32,
    pub start_time: Instant,
    /// Time of the most recent event
    pub last_time: Instant,
    axis: Axis,
}

impl DragSample {
    fn new(x: f32, y: f32, time: Instant) -> Self {
        Self {
            start_x: x,
            start_y: y,
            current_x: x,
            current_y: y,
            start_time: time,
            last_time: time,
            axis: Axis::Undetermined,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    fn outcome(&self, config: &TrackerConfig, committed: bool) -> GestureOutcome {
        let dx = self.current_x - self.start_x;
        let dy = self.current_y - self.start_y;
        let delta = match self.axis {
            Axis::Horizontal => dx,
            Axis::Vertical => dy,
            Axis::Undetermined => 0.0,
        };
        GestureOutcome {
            axis: self.axis,
            delta,
            progress: (delta.abs() / config.commit_threshold).clamp(0.0, 1.0),
            committed,
            dx,
            dy,
            elapsed: self.last_time.saturating_duration_since(self.start_time),
        }
    }
}

/// Derived view of a drag, recomputed on every event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureOutcome {
    pub axis: Axis,
    /// Displacement along the locked axis, sign preserved. Zero while undetermined.
    pub delta: f32,
    /// `|delta| / commit_threshold`, clamped to 0..=1
    pub progress: f32,
    /// Only ever true on the outcome returned by `end`
    pub committed: bool,
    pub dx: f32,
    pub dy: f32,
    pub elapsed: Duration,
}

/// Axis-locking drag tracker with at most one open sample per element.
pub struct GestureTracker {
    config: TrackerConfig,
    open: HashMap<ElementId, DragSample>,
}

impl GestureTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            open: HashMap::with_capacity(4),
        }
    }

    pub fn is_open(&self, element: ElementId) -> bool {
        self.open.contains_key(&element)
    }

    pub fn sample(&self, element: ElementId) -> Option<&DragSample> {
        self.open.get(&element)
    }

    /// Open a drag on `element`. Nested drags on the same element are refused.
    pub fn begin(
        &mut self,
        element: ElementId,
        x: f32,
        y: f32,
        time: Instant,
    ) -> Result<DragSample, GestureError> {
        if self.open.contains_key(&element) {
            return Err(GestureError::InvalidState { element });
        }
        let sample = DragSample::new(x, y, time);
        self.open.insert(element, sample);
        Ok(sample)
    }

    /// Record a move and return the updated outcome.
    pub fn update(
        &mut self,
        element: ElementId,
        x: f32,
        y: f32,
        time: Instant,
    ) -> Result<GestureOutcome, GestureError> {
        let lock = self.config.lock_threshold;
        let sample = self
            .open
            .get_mut(&element)
            .ok_or(GestureError::UnknownElement { element })?;

        sample.current_x = x;
        sample.current_y = y;
        sample.last_time = time;

        if sample.axis == Axis::Undetermined {
            let adx = (x - sample.start_x).abs();
            let ady = (y - sample.start_y).abs();
            if adx.max(ady) > lock {
                sample.axis = if adx > ady {
                    Axis::Horizontal
                } else {
                    Axis::Vertical
                };
                log::trace!("{:?} locked {:?}", element, sample.axis);
            }
        }

        Ok(sample.outcome(&self.config, false))
    }

    /// Close the drag and report whether it committed.
    pub fn end(&mut self, element: ElementId) -> Result<GestureOutcome, GestureError> {
        let sample = self
            .open
            .remove(&element)
            .ok_or(GestureError::UnknownElement { element })?;
        let open = sample.outcome(&self.config, false);
        let committed =
            open.axis != Axis::Undetermined && open.delta.abs() >= self.config.commit_threshold;
        Ok(GestureOutcome { committed, ..open })
    }

    /// Close the drag because the input stream was taken away. Never commits.
    pub fn cancel(&mut self, element: ElementId) -> Result<GestureOutcome, GestureError> {
        let sample = self
            .open
            .remove(&element)
            .ok_or(GestureError::UnknownElement { element })?;
        Ok(sample.outcome(&self.config, false))
    }
}
