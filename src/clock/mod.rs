//! Scheduling clocks.
//!
//! A grain engine asks its [`ClockSource`] once per sample whether a
//! scheduling tick happened. The source can follow an external clock voltage
//! directly, subdivide it, or ignore it and run from an internal
//! [`Metronome`].

mod divider;
mod metronome;
mod schmitt;

pub use divider::ClockDivider;
pub use metronome::Metronome;
pub use schmitt::{DEFAULT_HIGH, DEFAULT_LOW, SchmittTrigger};

use crate::error::{GrainError, Result};

/// Where scheduling ticks come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClockMode {
    /// One tick per rising edge of the clock input.
    #[default]
    External,
    /// `n` evenly spaced ticks per measured period of the clock input.
    Subdivided(u32),
    /// A free-running clock; the clock input is ignored.
    Internal { bpm: f64, steps_per_beat: u32 },
}

impl ClockMode {
    /// Checks that the mode's parameters describe a usable clock.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ClockMode::External => Ok(()),
            ClockMode::Subdivided(0) => Err(GrainError::InvalidSubdivision),
            ClockMode::Subdivided(_) => Ok(()),
            ClockMode::Internal { bpm, .. } if !(bpm.is_finite() && bpm > 0.0) => {
                Err(GrainError::InvalidTempo(bpm))
            }
            ClockMode::Internal { steps_per_beat: 0, .. } => Err(GrainError::InvalidSubdivision),
            ClockMode::Internal { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    External,
    Subdivided(ClockDivider),
    Internal(Metronome),
}

/// Turns a clock voltage into scheduling ticks according to a [`ClockMode`].
///
/// # Examples
///
/// ```
/// use graincloud::clock::{ClockMode, ClockSource};
///
/// let mut clock = ClockSource::new(ClockMode::External, 48000).unwrap();
/// assert!(!clock.tick(0.0));
/// assert!(clock.tick(10.0));
/// assert!(!clock.tick(10.0));
/// ```
#[derive(Debug, Clone)]
pub struct ClockSource {
    mode: ClockMode,
    sample_rate: u32,
    trigger: SchmittTrigger,
    source: Source,
}

impl ClockSource {
    /// Builds a clock running in `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if `mode` fails [`ClockMode::validate`].
    pub fn new(mode: ClockMode, sample_rate: u32) -> Result<Self> {
        let source = Self::build(mode, sample_rate)?;
        Ok(Self {
            mode,
            sample_rate,
            trigger: SchmittTrigger::default(),
            source,
        })
    }

    fn build(mode: ClockMode, sample_rate: u32) -> Result<Source> {
        mode.validate()?;
        Ok(match mode {
            ClockMode::External => Source::External,
            ClockMode::Subdivided(n) => Source::Subdivided(ClockDivider::new(n)),
            ClockMode::Internal { bpm, steps_per_beat } => {
                Source::Internal(Metronome::new(bpm, steps_per_beat, sample_rate))
            }
        })
    }

    /// Advances by one sample of clock input. Returns true on a scheduling tick.
    pub fn tick(&mut self, voltage: f64) -> bool {
        let edge = self.trigger.process(voltage);
        match &mut self.source {
            Source::External => edge,
            Source::Subdivided(divider) => divider.tick(edge),
            Source::Internal(metronome) => metronome.tick(),
        }
    }

    /// The active mode.
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Switches to a different mode. On error the current mode is kept.
    pub fn set_mode(&mut self, mode: ClockMode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        self.source = Self::build(mode, self.sample_rate)?;
        self.mode = mode;
        Ok(())
    }

    /// Forgets edge state, measured periods and internal clock phase.
    pub fn reset(&mut self) {
        self.trigger.reset();
        match &mut self.source {
            Source::External => {}
            Source::Subdivided(divider) => divider.reset(),
            Source::Internal(metronome) => metronome.reset(),
        }
    }
}
