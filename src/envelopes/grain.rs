//! Amplitude windows applied to each grain over its lifetime.

use super::curve::Curve;
use std::f64::consts::TAU;

/// Attack fraction of [`GrainEnvelope::attack_decay`].
pub const DEFAULT_ATTACK: f64 = 0.05;

/// Attack fraction of [`GrainEnvelope::reverse`], taken at the end of the grain.
pub const DEFAULT_REVERSE_ATTACK: f64 = 0.1;

/// The gain shape of a grain.
///
/// Every variant is a pure function of elapsed and total samples, so an
/// envelope is a plain value stored inside each voice. It is chosen when the
/// grain is triggered and cannot change while the grain plays.
///
/// # Examples
///
/// ```
/// use graincloud::envelopes::GrainEnvelope;
///
/// let env = GrainEnvelope::Hann;
/// assert_eq!(env.gain(0.0, 100.0), 0.0);
/// assert!((env.gain(50.0, 100.0) - 1.0).abs() < 1e-12);
///
/// assert_eq!(GrainEnvelope::Square.gain(99.0, 100.0), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GrainEnvelope {
    /// Short rise, then a fall over the rest of the grain.
    AttackDecay {
        /// Fraction of the grain spent rising, in [0, 1]
        attack: f64,
        /// Shape of both segments
        curve: Curve,
    },

    /// Raised cosine window.
    #[default]
    Hann,

    /// Constant full gain.
    Square,

    /// Fall first, then a short rise at the end of the grain.
    Reverse {
        /// Fraction of the grain spent rising at the end, in [0, 1]
        attack: f64,
        /// Shape of both segments
        curve: Curve,
    },
}

impl GrainEnvelope {
    /// One instance of every shape, in menu order.
    pub const ALL: [GrainEnvelope; 4] = [
        GrainEnvelope::attack_decay(),
        GrainEnvelope::Hann,
        GrainEnvelope::Square,
        GrainEnvelope::reverse(),
    ];

    /// Linear attack/decay with a 5% attack.
    pub const fn attack_decay() -> Self {
        GrainEnvelope::AttackDecay {
            attack: DEFAULT_ATTACK,
            curve: Curve::Linear,
        }
    }

    /// Linear decay followed by a 10% attack.
    pub const fn reverse() -> Self {
        GrainEnvelope::Reverse {
            attack: DEFAULT_REVERSE_ATTACK,
            curve: Curve::Linear,
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            GrainEnvelope::AttackDecay { .. } => "attack/decay",
            GrainEnvelope::Hann => "hann",
            GrainEnvelope::Square => "square",
            GrainEnvelope::Reverse { .. } => "reverse",
        }
    }

    /// Gain after `elapsed` of `total` samples, always in [0, 1].
    ///
    /// Returns 0.0 when `total` is not a positive finite number.
    #[inline]
    pub fn gain(&self, elapsed: f64, total: f64) -> f64 {
        if !(total.is_finite() && total > 0.0) {
            return 0.0;
        }
        let elapsed = elapsed.clamp(0.0, total);

        let gain = match *self {
            GrainEnvelope::AttackDecay { attack, curve } => {
                let rise_len = total * attack.clamp(0.0, 1.0);
                if elapsed < rise_len {
                    curve.rise(elapsed / rise_len)
                } else {
                    curve.fall(segment_progress(elapsed - rise_len, total - rise_len))
                }
            }
            GrainEnvelope::Hann => 0.5 * (1.0 - (TAU * elapsed / total).cos()),
            GrainEnvelope::Square => 1.0,
            GrainEnvelope::Reverse { attack, curve } => {
                let fall_len = total * (1.0 - attack.clamp(0.0, 1.0));
                if elapsed < fall_len {
                    curve.fall(elapsed / fall_len)
                } else {
                    curve.rise(segment_progress(elapsed - fall_len, total - fall_len))
                }
            }
        };

        gain.clamp(0.0, 1.0)
    }
}

/// Progress through a segment, treating an empty segment as finished.
#[inline]
fn segment_progress(position: f64, length: f64) -> f64 {
    if length > 0.0 { position / length } else { 1.0 }
}
