//! Periodic placement: each grain starts a fixed step further back.

use super::{GrainSettings, Placement};

/// Steps the start offset by a fixed amount on every grain that fires.
///
/// Positions are in samples behind the write head and wrap at the history
/// capacity. Ticks that the density gate skips do not advance the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodic {
    /// Increment per fired grain, in samples
    pub step: f64,
    position: f64,
}

impl Default for Periodic {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Periodic {
    /// Creates a periodic policy starting at offset 0.
    pub fn new(step: f64) -> Self {
        Self {
            step,
            position: 0.0,
        }
    }

    /// Start offset of the next grain, in samples.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Moves the next start offset back to 0.
    pub fn reset(&mut self) {
        self.position = 0.0;
    }

    pub(super) fn place(&mut self, settings: &GrainSettings, capacity: f64) -> Placement {
        let start = self.position;

        let next = self.position + self.step;
        self.position = if next.is_finite() && capacity > 0.0 {
            next.rem_euclid(capacity)
        } else {
            0.0
        };

        Placement {
            start,
            speed: settings.speed,
            volume: settings.volume,
            pan: settings.pan,
        }
    }
}
