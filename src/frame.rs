//! Mono and stereo sample frames.
//!
//! Grains, the history buffer and the pool are all generic over a [`Frame`],
//! so the same engine runs on a single channel (`f64`) or on a [`Stereo`]
//! pair. Panning only has an effect on stereo frames.

use std::fmt::Debug;
use std::ops::Add;

/// One sample per channel at a single point in time.
pub trait Frame: Copy + Default + Add<Output = Self> + PartialEq + Debug + Send + 'static {
    /// Number of channels carried by this frame type.
    const CHANNELS: usize;

    /// Multiplies every channel by `gain`.
    fn scale(self, gain: f64) -> Self;

    /// Applies equal-power panning. `pan` ranges from -1.0 (left) to 1.0 (right).
    fn pan(self, pan: f64) -> Self;

    /// Builds a frame from per-channel values.
    ///
    /// Channels beyond [`Frame::CHANNELS`] are ignored; missing channels are
    /// filled from the first one, or with silence if `channels` is empty.
    fn from_channels(channels: &[f64]) -> Self;

    /// Returns the value of channel `index`, or 0.0 if out of range.
    fn channel(&self, index: usize) -> f64;

    /// Returns the largest absolute channel value.
    fn peak(&self) -> f64 {
        (0..Self::CHANNELS)
            .map(|i| self.channel(i).abs())
            .fold(0.0, f64::max)
    }

    /// Linear interpolation between `a` and `b`.
    #[inline]
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a.scale(1.0 - t) + b.scale(t)
    }

    /// 4-point Hermite interpolation between `y0` and `y1`, `t` in [0, 1].
    fn hermite(ym1: Self, y0: Self, y1: Self, y2: Self, t: f64) -> Self;
}

/// 4-point, 3rd-order Hermite interpolation (x-form) of a single channel.
///
/// From "Polynomial Interpolators for High-Quality Resampling of Oversampled
/// Audio" by Olli Niemitalo, p. 43.
#[inline]
pub fn hermite(ym1: f64, y0: f64, y1: f64, y2: f64, t: f64) -> f64 {
    let c0 = y0;
    let c1 = (y1 - ym1) * 0.5;
    let c2 = ym1 - y0 * 2.5 + y1 * 2.0 - y2 * 0.5;
    let c3 = (y2 - ym1) * 0.5 + (y0 - y1) * 1.5;
    ((c3 * t + c2) * t + c1) * t + c0
}

/// Left and right gains of the equal-power pan law.
#[inline]
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let pan = if pan.is_finite() {
        pan.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    ((0.5 * (1.0 - pan)).sqrt(), (0.5 * (1.0 + pan)).sqrt())
}

impl Frame for f64 {
    const CHANNELS: usize = 1;

    #[inline]
    fn scale(self, gain: f64) -> Self {
        self * gain
    }

    #[inline]
    fn pan(self, _pan: f64) -> Self {
        self
    }

    fn from_channels(channels: &[f64]) -> Self {
        channels.first().copied().unwrap_or(0.0)
    }

    fn channel(&self, index: usize) -> f64 {
        if index == 0 { *self } else { 0.0 }
    }

    #[inline]
    fn hermite(ym1: Self, y0: Self, y1: Self, y2: Self, t: f64) -> Self {
        hermite(ym1, y0, y1, y2, t)
    }
}

/// A left/right sample pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stereo {
    pub left: f64,
    pub right: f64,
}

impl Stereo {
    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// The same value on both channels.
    pub const fn mono(value: f64) -> Self {
        Self {
            left: value,
            right: value,
        }
    }
}

impl Add for Stereo {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl From<(f64, f64)> for Stereo {
    fn from((left, right): (f64, f64)) -> Self {
        Self { left, right }
    }
}

impl Frame for Stereo {
    const CHANNELS: usize = 2;

    #[inline]
    fn scale(self, gain: f64) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }

    #[inline]
    fn pan(self, pan: f64) -> Self {
        let (left_gain, right_gain) = pan_gains(pan);
        Self {
            left: self.left * left_gain,
            right: self.right * right_gain,
        }
    }

    fn from_channels(channels: &[f64]) -> Self {
        match channels {
            [] => Self::default(),
            [value] => Self::mono(*value),
            [left, right, ..] => Self::new(*left, *right),
        }
    }

    fn channel(&self, index: usize) -> f64 {
        match index {
            0 => self.left,
            1 => self.right,
            _ => 0.0,
        }
    }

    #[inline]
    fn hermite(ym1: Self, y0: Self, y1: Self, y2: Self, t: f64) -> Self {
        Self {
            left: hermite(ym1.left, y0.left, y1.left, y2.left, t),
            right: hermite(ym1.right, y0.right, y1.right, y2.right, t),
        }
    }
}
