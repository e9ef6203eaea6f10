//! Construction-time configuration for [`GrainEngine`](crate::GrainEngine).

use crate::clock::ClockMode;
use crate::error::{GrainError, Result};
use crate::grains::seconds_to_samples;
use crate::triggers::{GrainSettings, TriggerStrategy};

/// Sizes, clock and initial controls for a grain engine.
///
/// # Examples
///
/// ```
/// use graincloud::clock::ClockMode;
/// use graincloud::triggers::TriggerStrategy;
/// use graincloud::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_history_seconds(4.0)
///     .with_max_active_grains(8)
///     .with_clock(ClockMode::Subdivided(4))
///     .with_strategy(TriggerStrategy::periodic(2400.0));
///
/// assert!(config.validate(48000, 16).is_ok());
/// assert!(config.validate(48000, 4).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Longest grain a voice can hold, in seconds
    pub max_grain_seconds: f64,
    /// Length of the recorded input history, in seconds
    pub history_seconds: f64,
    /// Polyphony limit, `None` for every voice in the pool
    pub max_active_grains: Option<usize>,
    pub clock: ClockMode,
    /// Start-offset randomization in [0, 1]
    pub jitter: f64,
    pub strategy: TriggerStrategy,
    pub settings: GrainSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_grain_seconds: 2.0,
            history_seconds: 2.0,
            max_active_grains: None,
            clock: ClockMode::default(),
            jitter: 0.0,
            strategy: TriggerStrategy::default(),
            settings: GrainSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_grain_seconds(mut self, seconds: f64) -> Self {
        self.max_grain_seconds = seconds;
        self
    }

    pub fn with_history_seconds(mut self, seconds: f64) -> Self {
        self.history_seconds = seconds;
        self
    }

    pub fn with_max_active_grains(mut self, max_active: usize) -> Self {
        self.max_active_grains = Some(max_active);
        self
    }

    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<TriggerStrategy>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_settings(mut self, settings: GrainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Checks the configuration against an engine's sample rate and voice count.
    ///
    /// # Errors
    ///
    /// Returns [`GrainError::InvalidDuration`] for buffer lengths that are not
    /// positive or round to zero samples, [`GrainError::InvalidMaxActiveGrains`]
    /// for a polyphony limit outside `1..=capacity`, and the clock errors of
    /// [`ClockMode::validate`].
    pub fn validate(&self, sample_rate: u32, capacity: usize) -> Result<()> {
        check_duration("max_grain_seconds", self.max_grain_seconds, sample_rate)?;
        check_duration("history_seconds", self.history_seconds, sample_rate)?;

        if let Some(requested) = self.max_active_grains
            && (requested == 0 || requested > capacity)
        {
            return Err(GrainError::InvalidMaxActiveGrains {
                requested,
                capacity,
            });
        }

        self.clock.validate()
    }

    pub(crate) fn max_grain_samples(&self, sample_rate: u32) -> usize {
        seconds_to_samples(self.max_grain_seconds, sample_rate)
    }

    pub(crate) fn history_samples(&self, sample_rate: u32) -> usize {
        seconds_to_samples(self.history_seconds, sample_rate)
    }
}

fn check_duration(name: &'static str, value: f64, sample_rate: u32) -> Result<()> {
    if value.is_finite() && value > 0.0 && seconds_to_samples(value, sample_rate) > 0 {
        Ok(())
    } else {
        Err(GrainError::InvalidDuration { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate(48000, 16).is_ok());
        assert_eq!(config.history_samples(48000), 96000);
        assert_eq!(config.max_grain_samples(48000), 96000);
    }

    #[test]
    fn test_rejects_bad_durations() {
        for value in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-9] {
            let err = EngineConfig::default()
                .with_history_seconds(value)
                .validate(48000, 16)
                .unwrap_err();
            assert!(matches!(
                err,
                GrainError::InvalidDuration {
                    name: "history_seconds",
                    ..
                }
            ));
        }

        let err = EngineConfig::default()
            .with_max_grain_seconds(0.0)
            .validate(48000, 16)
            .unwrap_err();
        assert!(matches!(
            err,
            GrainError::InvalidDuration {
                name: "max_grain_seconds",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_max_active() {
        let config = EngineConfig::default().with_max_active_grains(0);
        assert!(matches!(
            config.validate(48000, 16),
            Err(GrainError::InvalidMaxActiveGrains {
                requested: 0,
                capacity: 16
            })
        ));

        let config = EngineConfig::default().with_max_active_grains(17);
        assert!(config.validate(48000, 16).is_err());
        assert!(config.validate(48000, 32).is_ok());
    }

    #[test]
    fn test_rejects_bad_clock() {
        let config = EngineConfig::default().with_clock(ClockMode::Subdivided(0));
        assert!(matches!(
            config.validate(48000, 16),
            Err(GrainError::InvalidSubdivision)
        ));
    }

    #[test]
    fn test_with_strategy_accepts_policies() {
        use crate::triggers::Periodic;

        let config = EngineConfig::default().with_strategy(Periodic::new(480.0));
        assert_eq!(config.strategy.name(), "periodic");
    }
}
