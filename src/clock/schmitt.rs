//! Rising-edge detection with hysteresis for clock and gate inputs.

/// Default voltage at which the trigger re-arms.
pub const DEFAULT_LOW: f64 = 0.1;

/// Default voltage at which a rising edge is reported.
pub const DEFAULT_HIGH: f64 = 1.0;

/// Detects rising edges of a noisy pulse signal.
///
/// An edge is reported when the input reaches `high` while the trigger is
/// armed. It re-arms once the input falls to `low` or below, so jitter around
/// a single threshold cannot produce extra edges.
///
/// # Examples
///
/// ```
/// use graincloud::clock::SchmittTrigger;
///
/// let mut trigger = SchmittTrigger::default();
/// assert!(!trigger.process(0.0));
/// assert!(trigger.process(5.0));
/// assert!(!trigger.process(5.0));
/// assert!(!trigger.process(0.0));
/// assert!(trigger.process(5.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchmittTrigger {
    low: f64,
    high: f64,
    armed: bool,
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_LOW, DEFAULT_HIGH)
    }
}

impl SchmittTrigger {
    /// Creates an armed trigger. The thresholds are swapped if given in reverse.
    pub fn new(low: f64, high: f64) -> Self {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        Self {
            low,
            high,
            armed: true,
        }
    }

    /// Feeds one input sample. Returns true on a rising edge.
    #[inline]
    pub fn process(&mut self, input: f64) -> bool {
        if self.armed {
            if input >= self.high {
                self.armed = false;
                return true;
            }
        } else if input <= self.low {
            self.armed = true;
        }
        false
    }

    /// Returns true while the input is considered high.
    pub fn is_high(&self) -> bool {
        !self.armed
    }

    /// Forgets the input state so the next high crossing is an edge.
    pub fn reset(&mut self) {
        self.armed = true;
    }
}
