//! One-shot platform capability detection.

use std::cell::OnceCell;
use std::rc::Rc;

use super::platform::Platform;

/// Which feedback primitives the device offers. Immutable once detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub touch_primary: bool,
    pub standalone: bool,
    pub can_vibrate: bool,
    pub can_share: bool,
}

impl Capabilities {
    /// Haptics only make sense on a touch-first device that can vibrate.
    pub fn haptics_enabled(&self) -> bool {
        self.touch_primary && self.can_vibrate
    }
}

/// Reads the platform traits on first use and never again.
pub struct CapabilityProbe {
    platform: Rc<dyn Platform>,
    detected: OnceCell<Capabilities>,
}

impl CapabilityProbe {
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self {
            platform,
            detected: OnceCell::new(),
        }
    }

    pub fn detect(&self) -> Capabilities {
        *self.detected.get_or_init(|| {
            let caps = Capabilities {
                touch_primary: self.platform.is_touch_primary(),
                standalone: self.platform.is_standalone(),
                can_vibrate: self.platform.supports_vibration(),
                can_share: self.platform.supports_share(),
            };
            log::debug!("capabilities detected: {:?}", caps);
            caps
        })
    }
}
