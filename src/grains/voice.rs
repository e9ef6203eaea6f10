//! Grain - a single playback voice over a private snapshot of recorded audio.

use crate::envelopes::GrainEnvelope;
use crate::frame::Frame;
use crate::history::HistoryBuffer;

/// Parameters of one grain, with every time value in seconds.
///
/// # Examples
///
/// ```
/// use graincloud::grains::GrainRequest;
///
/// let request = GrainRequest {
///     start_offset: 0.25,
///     speed: -1.0,
///     ..GrainRequest::default()
/// };
/// assert_eq!(request.duration, 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainRequest {
    /// How far behind the write head the grain's window starts
    pub start_offset: f64,
    /// Playback rate; negative values play backwards
    pub speed: f64,
    /// Gain applied on top of the envelope
    pub volume: f64,
    /// Length of the snapshot window
    pub duration: f64,
    /// Lifetime of the grain, independent of `duration`
    pub envelope_duration: f64,
    /// Whether playback wraps around the window
    pub looping: bool,
    /// Stereo position, -1.0 (left) to 1.0 (right)
    pub pan: f64,
    /// Gain shape over the grain's lifetime
    pub envelope: GrainEnvelope,
}

impl Default for GrainRequest {
    fn default() -> Self {
        Self {
            start_offset: 0.0,
            speed: 1.0,
            volume: 1.0,
            duration: 0.1,
            envelope_duration: 0.1,
            looping: false,
            pan: 0.0,
            envelope: GrainEnvelope::default(),
        }
    }
}

/// Converts seconds to a whole number of samples, treating invalid input as zero.
#[inline]
pub(crate) fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    let samples = (seconds * sample_rate as f64).round();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// A playback voice holding its own copy of a window of the history buffer.
///
/// Triggering copies the requested window into the grain's local buffer, so
/// the grain sounds the same for its whole life while the host keeps
/// recording. Playback uses 4-point Hermite interpolation, so any speed,
/// including negative ones, reads between samples smoothly.
///
/// The local buffer is allocated once by [`Grain::new`]. Triggering and
/// processing never allocate.
///
/// # Type Parameters
///
/// * `SAMPLE_RATE` - Sample rate in Hz
/// * `F` - Frame type (`f64` for mono, [`Stereo`](crate::Stereo) for stereo)
///
/// # Examples
///
/// ```
/// use graincloud::grains::{Grain, GrainRequest};
/// use graincloud::history::{HistoryBuffer, RingBuffer};
///
/// const SAMPLE_RATE: u32 = 48000;
///
/// let mut history = RingBuffer::<f64>::new(SAMPLE_RATE as usize);
/// for i in 0..1000 {
///     history.write((i as f64 * 0.05).sin());
/// }
///
/// let mut grain = Grain::<SAMPLE_RATE>::new(4800);
/// grain.trigger(&history, &GrainRequest { duration: 0.01, envelope_duration: 0.01, ..Default::default() });
///
/// let mut count = 0;
/// while grain.is_active() {
///     grain.process();
///     count += 1;
/// }
/// assert_eq!(count, 480);
/// ```
#[derive(Debug, Clone)]
pub struct Grain<const SAMPLE_RATE: u32, F: Frame = f64> {
    buffer: Vec<F>,
    duration_samples: usize,
    envelope_duration_samples: usize,
    read_position: f64,
    speed: f64,
    volume: f64,
    pan: f64,
    looping: bool,
    envelope: GrainEnvelope,
    elapsed_samples: usize,
    active: bool,
}

impl<const SAMPLE_RATE: u32, F: Frame> Grain<SAMPLE_RATE, F> {
    /// Creates an idle grain able to hold up to `max_grain_samples` frames.
    ///
    /// # Panics
    ///
    /// Panics if `max_grain_samples` is 0.
    pub fn new(max_grain_samples: usize) -> Self {
        assert!(
            max_grain_samples > 0,
            "max_grain_samples must be greater than 0"
        );
        Self {
            buffer: vec![F::default(); max_grain_samples],
            duration_samples: 0,
            envelope_duration_samples: 0,
            read_position: 0.0,
            speed: 1.0,
            volume: 1.0,
            pan: 0.0,
            looping: false,
            envelope: GrainEnvelope::default(),
            elapsed_samples: 0,
            active: false,
        }
    }

    /// Starts the grain, replacing whatever it was playing.
    ///
    /// Copies `request.duration` seconds of `history`, truncated to the
    /// grain's capacity, beginning `request.start_offset` seconds behind the
    /// write head. The window is copied oldest frame first so that positive
    /// speeds play the recording forwards. If the window would reach past the
    /// newest frame it is moved back so that it ends on the newest frame.
    ///
    /// A request whose duration or envelope duration rounds to zero samples
    /// leaves the grain inactive.
    pub fn trigger<H: HistoryBuffer<F> + ?Sized>(&mut self, history: &H, request: &GrainRequest) {
        let duration = seconds_to_samples(request.duration, SAMPLE_RATE).min(self.buffer.len());
        let envelope_duration = seconds_to_samples(request.envelope_duration, SAMPLE_RATE);

        let start = if request.start_offset.is_finite() {
            (request.start_offset * SAMPLE_RATE as f64).max(0.0)
        } else {
            0.0
        };
        let start = start.max(duration.saturating_sub(1) as f64);
        for (i, frame) in self.buffer[..duration].iter_mut().enumerate() {
            *frame = history.read(start - i as f64);
        }

        self.duration_samples = duration;
        self.envelope_duration_samples = envelope_duration;
        self.read_position = 0.0;
        self.speed = if request.speed.is_finite() {
            request.speed
        } else {
            0.0
        };
        self.volume = if request.volume.is_finite() {
            request.volume
        } else {
            0.0
        };
        self.pan = request.pan;
        self.looping = request.looping;
        self.envelope = request.envelope;
        self.elapsed_samples = 0;
        self.active = duration > 0 && envelope_duration > 0;
    }

    /// Renders the next frame and advances the grain.
    ///
    /// Returns silence when the grain is inactive. A grain that finishes
    /// during this call still returns the frame it rendered; it is silent
    /// from the next call on.
    pub fn process(&mut self) -> F {
        if !self.active {
            return F::default();
        }

        let gain = self.envelope.gain(
            self.elapsed_samples as f64,
            self.envelope_duration_samples as f64,
        );
        let output = self
            .interpolate(self.read_position)
            .scale(gain * self.volume)
            .pan(self.pan);

        let length = self.duration_samples as f64;
        self.read_position += self.speed;
        if self.looping {
            self.read_position = self.read_position.rem_euclid(length);
            // rem_euclid rounds tiny negative positions up to `length`
            if self.read_position >= length {
                self.read_position = 0.0;
            }
        } else if self.read_position < 0.0 || self.read_position >= length {
            self.active = false;
        }

        self.elapsed_samples += 1;
        if self.elapsed_samples >= self.envelope_duration_samples {
            self.active = false;
        }

        output
    }

    /// Stops the grain immediately.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Hermite interpolation of the local buffer at `position`.
    #[inline]
    fn interpolate(&self, position: f64) -> F {
        let base = position.floor();
        let t = position - base;
        let base = base as isize;
        F::hermite(
            self.frame(base - 1),
            self.frame(base),
            self.frame(base + 1),
            self.frame(base + 2),
            t,
        )
    }

    /// Frame at `index`, wrapped when looping and clamped otherwise.
    #[inline]
    fn frame(&self, index: isize) -> F {
        let length = self.duration_samples as isize;
        let index = if self.looping {
            index.rem_euclid(length)
        } else {
            index.clamp(0, length - 1)
        };
        self.buffer[index as usize]
    }

    /// Returns true while the grain contributes to the output.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Fractional read position within the local buffer.
    pub fn read_position(&self) -> f64 {
        self.read_position
    }

    /// Samples rendered since the last trigger.
    pub fn elapsed_samples(&self) -> usize {
        self.elapsed_samples
    }

    /// Number of frames copied by the last trigger.
    pub fn duration_samples(&self) -> usize {
        self.duration_samples
    }

    /// Lifetime of the current grain in samples.
    pub fn envelope_duration_samples(&self) -> usize {
        self.envelope_duration_samples
    }

    /// Capacity of the local buffer in frames.
    pub fn max_grain_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Playback rate in samples per call; 0.0 if the request was not finite.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Gain on top of the envelope; 0.0 if the request was not finite.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Stereo position, -1.0 (left) to 1.0 (right).
    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// Returns true if playback wraps around the window.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Envelope shape chosen at trigger time.
    pub fn envelope(&self) -> GrainEnvelope {
        self.envelope
    }
}
