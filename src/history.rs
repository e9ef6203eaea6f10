//! Rolling recording of recent input audio.
//!
//! Grains never read the live recording while they play. They copy a window
//! of it when triggered (see [`Grain::trigger`](crate::grains::Grain::trigger)),
//! so the history is only read at trigger time and only ever written by the host.

use crate::frame::Frame;

#[cfg(feature = "wav")]
use std::path::Path;

/// A fixed-size circular store of recent frames.
///
/// Positions are expressed as a fractional *delay*: the number of samples
/// behind the most recently written frame. A delay of 0.0 reads the frame
/// written by the last call to [`HistoryBuffer::write`].
pub trait HistoryBuffer<F: Frame> {
    /// Appends a frame, overwriting the oldest one.
    fn write(&mut self, frame: F);

    /// Reads the frame `delay` samples behind the write head.
    fn read(&self, delay: f64) -> F;

    /// Number of frames the buffer holds.
    fn capacity(&self) -> usize;
}

/// Default [`HistoryBuffer`] backed by a preallocated ring of frames.
///
/// # Examples
///
/// ```
/// use graincloud::history::{HistoryBuffer, RingBuffer};
///
/// let mut history = RingBuffer::<f64>::new(4);
/// history.write(0.1);
/// history.write(0.2);
///
/// assert_eq!(history.read(0.0), 0.2);
/// assert_eq!(history.read(1.0), 0.1);
/// assert!((history.read(0.5) - 0.15).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer<F: Frame> {
    buffer: Vec<F>,
    write_pos: usize,
}

impl<F: Frame> RingBuffer<F> {
    /// Creates a silent buffer holding `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be greater than 0");
        Self {
            buffer: vec![F::default(); capacity],
            write_pos: 0,
        }
    }

    /// Creates a buffer long enough for `seconds` of audio.
    ///
    /// # Panics
    ///
    /// Panics if the duration rounds to zero frames.
    pub fn with_duration(seconds: f64, sample_rate: u32) -> Self {
        Self::new((seconds.max(0.0) * sample_rate as f64).round() as usize)
    }

    /// Creates a buffer whose contents are the given frames, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `frames` is empty.
    pub fn from_frames(frames: Vec<F>) -> Self {
        assert!(!frames.is_empty(), "history capacity must be greater than 0");
        Self {
            buffer: frames,
            write_pos: 0,
        }
    }

    /// Zeroes all stored frames.
    pub fn clear(&mut self) {
        self.buffer.fill(F::default());
        self.write_pos = 0;
    }

    /// Returns the frame at integer `delay`, wrapping around the ring.
    #[inline]
    fn frame_at(&self, delay: usize) -> F {
        let len = self.buffer.len();
        let newest = self.write_pos + len - 1;
        self.buffer[(newest - delay % len) % len]
    }

    /// Loads a WAV file so that its last frame is the newest one.
    ///
    /// Integer PCM is scaled to [-1.0, 1.0]. Channels are mapped through
    /// [`Frame::from_channels`], so mono files fill both sides of a stereo
    /// buffer and stereo files are reduced to their left channel for mono.
    #[cfg(feature = "wav")]
    pub fn from_wav_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f64> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| v as f64))
                .collect::<Result<Vec<f64>, _>>()?,
            hound::SampleFormat::Int => {
                let max_value = (1i64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f64 / max_value))
                    .collect::<Result<Vec<f64>, _>>()?
            }
        };

        let channels = (spec.channels as usize).max(1);
        let frames: Vec<F> = samples.chunks_exact(channels).map(F::from_channels).collect();
        if frames.is_empty() {
            return Err(crate::GrainError::EmptyWav);
        }

        log::debug!(
            "loaded {} frames ({} channels, {} Hz) into history",
            frames.len(),
            spec.channels,
            spec.sample_rate
        );
        Ok(Self::from_frames(frames))
    }
}

impl<F: Frame> HistoryBuffer<F> for RingBuffer<F> {
    #[inline]
    fn write(&mut self, frame: F) {
        self.buffer[self.write_pos] = frame;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    fn read(&self, delay: f64) -> F {
        let max_delay = (self.buffer.len() - 1) as f64;
        let delay = if delay.is_finite() {
            delay.clamp(0.0, max_delay)
        } else {
            0.0
        };

        let index = delay.floor();
        let frac = delay - index;
        let newer = self.frame_at(index as usize);
        if frac == 0.0 {
            return newer;
        }
        let older = self.frame_at(index as usize + 1);
        F::lerp(newer, older, frac)
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
