//! Tunable thresholds and timings.
//!
//! Pull-to-refresh and swipe actions each carry their own `TrackerConfig`, so
//! the two recognizers can be tuned independently.

use std::time::Duration;

use super::error::GestureError;

/// Axis-lock and commit distances for one recognizer, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Displacement below which no axis is chosen
    pub lock_threshold: f32,
    /// Displacement at which progress reaches 1.0 and a release commits
    pub commit_threshold: f32,
}

impl TrackerConfig {
    pub fn new(lock_threshold: f32, commit_threshold: f32) -> Self {
        Self {
            lock_threshold,
            commit_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), GestureError> {
        if !(self.lock_threshold > 0.0) {
            return Err(GestureError::InvalidConfig(format!(
                "lock threshold must be positive, got {}",
                self.lock_threshold
            )));
        }
        if !(self.commit_threshold >= self.lock_threshold) {
            return Err(GestureError::InvalidConfig(format!(
                "commit threshold {} is below lock threshold {}",
                self.commit_threshold, self.lock_threshold
            )));
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(30.0, 80.0)
    }
}

/// Pull-to-refresh tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullConfig {
    pub tracker: TrackerConfig,
    /// Minimum time between release and the indicator returning to rest
    pub cooldown: Duration,
    /// Indicator travel per unit of pull distance
    pub indicator_damping: f32,
    /// Indicator offset while refreshing
    pub refreshing_offset: f32,
}

impl PullConfig {
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            cooldown: Duration::from_millis(500),
            indicator_damping: 0.5,
            refreshing_offset: 40.0,
        }
    }
}

/// Swipe-to-act tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    /// `commit_threshold` here is the release threshold
    pub tracker: TrackerConfig,
    /// Visual clamp for the row offset
    pub max_offset: f32,
}

impl SwipeConfig {
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_max_offset(mut self, max_offset: f32) -> Self {
        self.max_offset = max_offset;
        self
    }
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            max_offset: 100.0,
        }
    }
}

/// Toast/overlay timings. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackConfig {
    pub toast_duration: Duration,
    pub fade: Duration,
}

impl FeedbackConfig {
    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            toast_duration: Duration::from_millis(2000),
            fade: Duration::from_millis(300),
        }
    }
}
