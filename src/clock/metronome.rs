//! Free-running tempo clock for scheduling grains without an external clock.

/// A sample-accurate internal clock.
///
/// Emits `steps_per_beat` scheduling ticks per beat at the given tempo. The
/// first tick fires on the first sample, so a freshly started engine does
/// not wait a whole step before producing grains.
///
/// The step length is kept fractional and the remainder carried over from
/// tick to tick, so long runs do not drift.
///
/// # Examples
///
/// ```
/// use graincloud::clock::Metronome;
///
/// // 120 BPM, 4 ticks per beat = 8 ticks per second
/// let mut metronome = Metronome::new(120.0, 4, 48000);
///
/// let ticks = (0..48000).filter(|_| metronome.tick()).count();
/// assert_eq!(ticks, 8);
/// ```
#[derive(Debug, Clone)]
pub struct Metronome {
    bpm: f64,
    steps_per_beat: u32,
    sample_rate: u32,
    samples_per_step: f64,
    /// Samples since the last tick, fractional
    accumulator: f64,
    ticks: u64,
}

impl Metronome {
    /// Creates a metronome that ticks on its first sample.
    ///
    /// # Panics
    ///
    /// Panics if `bpm` is not a positive finite number or `steps_per_beat` is 0.
    pub fn new(bpm: f64, steps_per_beat: u32, sample_rate: u32) -> Self {
        assert!(bpm.is_finite() && bpm > 0.0, "BPM must be greater than 0");
        assert!(steps_per_beat > 0, "steps_per_beat must be greater than 0");

        let samples_per_step = Self::samples_per_step_for(bpm, steps_per_beat, sample_rate);
        Self {
            bpm,
            steps_per_beat,
            sample_rate,
            samples_per_step,
            accumulator: samples_per_step,
            ticks: 0,
        }
    }

    fn samples_per_step_for(bpm: f64, steps_per_beat: u32, sample_rate: u32) -> f64 {
        let steps_per_second = bpm / 60.0 * steps_per_beat as f64;
        (sample_rate as f64 / steps_per_second).max(1.0)
    }

    /// Advances by one sample. Returns true on a tick.
    pub fn tick(&mut self) -> bool {
        if self.accumulator >= self.samples_per_step {
            self.accumulator -= self.samples_per_step;
            self.accumulator += 1.0;
            self.ticks = self.ticks.wrapping_add(1);
            true
        } else {
            self.accumulator += 1.0;
            false
        }
    }

    /// Ticks emitted so far; wraps at `u64::MAX`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Restarts the clock so that the next sample ticks.
    pub fn reset(&mut self) {
        self.accumulator = self.samples_per_step;
        self.ticks = 0;
    }

    /// Changes the tempo, keeping the current phase.
    ///
    /// # Panics
    ///
    /// Panics if `bpm` is not a positive finite number.
    pub fn set_tempo(&mut self, bpm: f64) {
        assert!(bpm.is_finite() && bpm > 0.0, "BPM must be greater than 0");
        let samples_per_step =
            Self::samples_per_step_for(bpm, self.steps_per_beat, self.sample_rate);
        // carry the phase over as a fraction of the step
        self.accumulator *= samples_per_step / self.samples_per_step;
        self.samples_per_step = samples_per_step;
        self.bpm = bpm;
    }

    /// Current tempo in BPM.
    pub fn tempo(&self) -> f64 {
        self.bpm
    }

    /// Ticks per beat.
    pub fn steps_per_beat(&self) -> u32 {
        self.steps_per_beat
    }

    /// Length of one step in samples.
    pub fn samples_per_step(&self) -> f64 {
        self.samples_per_step
    }
}
