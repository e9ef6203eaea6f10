//! Control values shared by every trigger strategy.

use crate::envelopes::GrainEnvelope;

/// How a bipolar musical control is turned into a playback speed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpeedMapping {
    /// The control value is the speed.
    #[default]
    Linear,
    /// `2^(value * octaves)`: 0 is unity speed, ±1 is ±`octaves` octaves.
    Exponential {
        /// Octaves covered by each half of the control range
        octaves: f64,
    },
}

impl SpeedMapping {
    /// Maps a control value to a speed multiplier.
    ///
    /// # Examples
    ///
    /// ```
    /// use graincloud::triggers::SpeedMapping;
    ///
    /// let mapping = SpeedMapping::Exponential { octaves: 2.0 };
    /// assert_eq!(mapping.map(0.0), 1.0);
    /// assert_eq!(mapping.map(0.5), 2.0);
    /// assert_eq!(mapping.map(-1.0), 0.25);
    ///
    /// assert_eq!(SpeedMapping::Linear.map(-0.5), -0.5);
    /// ```
    pub fn map(&self, value: f64) -> f64 {
        match self {
            SpeedMapping::Linear => value,
            SpeedMapping::Exponential { octaves } => (value * octaves).exp2(),
        }
    }
}

/// Per-callback snapshot of the host's grain controls.
///
/// Times are in seconds. The active [`TriggerStrategy`](super::TriggerStrategy)
/// derives each grain's position, speed, volume and pan from these values and
/// passes the rest through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSettings {
    /// Probability of firing on a scheduling tick, in [0, 1]
    pub density: f64,
    /// Length of each grain's snapshot window
    pub duration: f64,
    /// Lifetime of each grain
    pub envelope_duration: f64,
    /// Base playback speed
    pub speed: f64,
    /// Bias added to every start offset
    pub delay: f64,
    /// Base grain volume
    pub volume: f64,
    /// Base stereo position, -1.0 to 1.0
    pub pan: f64,
    /// Whether grains loop their window until the envelope ends
    pub looping: bool,
    /// Envelope given to new grains
    pub envelope: GrainEnvelope,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            density: 0.5,
            duration: 0.1,
            envelope_duration: 0.1,
            speed: 1.0,
            delay: 0.0,
            volume: 0.8,
            pan: 0.0,
            looping: false,
            envelope: GrainEnvelope::default(),
        }
    }
}

impl GrainSettings {
    /// Sets the firing probability.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Sets grain length and lifetime to the same value.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self.envelope_duration = seconds;
        self
    }

    /// Sets a lifetime that differs from the grain length.
    pub fn with_envelope_duration(mut self, seconds: f64) -> Self {
        self.envelope_duration = seconds;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = pan;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_envelope(mut self, envelope: GrainEnvelope) -> Self {
        self.envelope = envelope;
        self
    }
}
