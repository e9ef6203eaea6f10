//! The complete granular processor: history, clock, strategy and voices.

use crate::clock::{ClockMode, ClockSource};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::frame::Frame;
use crate::grains::GrainPool;
use crate::history::{HistoryBuffer, RingBuffer};
use crate::triggers::{GrainSettings, TriggerStrategy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A granular processor for one audio stream.
///
/// Each call to [`process`](Self::process) runs the per-sample data flow in
/// a fixed order:
///
/// 1. the input frame is written to the history,
/// 2. the clock input is checked for a scheduling tick,
/// 3. on a tick the bound [`TriggerStrategy`] may add a grain to the pool,
/// 4. the pool mixes one frame from its active voices.
///
/// Because the history is written first, a grain triggered with a zero start
/// offset already contains the input frame of the same call.
///
/// # Type Parameters
///
/// * `SAMPLE_RATE` - Sample rate in Hz
/// * `GRAINS` - Number of voices in the pool
/// * `F` - Frame type, `f64` for mono or [`Stereo`](crate::Stereo)
/// * `H` - History buffer implementation
/// * `R` - Random number generator used for scheduling
///
/// # Examples
///
/// ```
/// use graincloud::clock::ClockMode;
/// use graincloud::triggers::{GrainSettings, TriggerStrategy};
/// use graincloud::{EngineConfig, GrainEngine};
///
/// let config = EngineConfig::default()
///     .with_clock(ClockMode::Internal { bpm: 120.0, steps_per_beat: 4 })
///     .with_strategy(TriggerStrategy::periodic(2400.0))
///     .with_settings(GrainSettings::default().with_density(1.0));
///
/// let mut engine = GrainEngine::<48000, 16>::new(&config).unwrap();
///
/// let mut peak: f64 = 0.0;
/// for i in 0..48000 {
///     let input = (i as f64 * 0.05).sin();
///     peak = peak.max(engine.process(input, 0.0).abs());
/// }
/// assert!(peak > 0.0);
/// assert!(peak <= 1.0);
/// ```
#[derive(Debug)]
pub struct GrainEngine<
    const SAMPLE_RATE: u32,
    const GRAINS: usize,
    F: Frame = f64,
    H: HistoryBuffer<F> = RingBuffer<F>,
    R: Rng = StdRng,
> {
    history: H,
    pool: GrainPool<SAMPLE_RATE, GRAINS, F>,
    strategy: TriggerStrategy,
    settings: GrainSettings,
    clock: ClockSource,
    jitter: f64,
    rng: R,
}

impl<const SAMPLE_RATE: u32, const GRAINS: usize, F: Frame> GrainEngine<SAMPLE_RATE, GRAINS, F> {
    /// Creates an engine with a silent ring-buffer history and an
    /// entropy-seeded random number generator.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`EngineConfig::validate`].
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate(SAMPLE_RATE, GRAINS)?;
        let history = RingBuffer::new(config.history_samples(SAMPLE_RATE));
        Self::with_parts(config, history, StdRng::from_entropy())
    }
}

impl<const SAMPLE_RATE: u32, const GRAINS: usize, F, H, R> GrainEngine<SAMPLE_RATE, GRAINS, F, H, R>
where
    F: Frame,
    H: HistoryBuffer<F>,
    R: Rng,
{
    /// Creates an engine around a caller-supplied history and generator.
    ///
    /// `config.history_seconds` is validated but the length of `history` is
    /// used as is. Seeding `rng` makes scheduling reproducible.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`EngineConfig::validate`].
    pub fn with_parts(config: &EngineConfig, history: H, rng: R) -> Result<Self> {
        config.validate(SAMPLE_RATE, GRAINS)?;

        let mut pool = GrainPool::new(config.max_grain_samples(SAMPLE_RATE));
        if let Some(max_active) = config.max_active_grains {
            pool.set_max_active_grains(max_active);
        }
        let clock = ClockSource::new(config.clock, SAMPLE_RATE)?;

        log::debug!(
            "grain engine: {} Hz, {} voices, {} history frames, {} strategy, {:?} clock",
            SAMPLE_RATE,
            GRAINS,
            history.capacity(),
            config.strategy.name(),
            config.clock
        );

        Ok(Self {
            history,
            pool,
            strategy: config.strategy,
            settings: config.settings,
            clock,
            jitter: clamp_jitter(config.jitter),
            rng,
        })
    }

    /// Processes one frame of input and clock voltage, returning one frame of output.
    pub fn process(&mut self, input: F, clock: f64) -> F {
        self.history.write(input);
        if self.clock.tick(clock) {
            self.fire();
        }
        self.pool.process()
    }

    /// Processes a block. Stops at the end of the shortest slice.
    pub fn process_block(&mut self, input: &[F], clock: &[f64], output: &mut [F]) {
        for ((out, &frame), &voltage) in output.iter_mut().zip(input).zip(clock) {
            *out = self.process(frame, voltage);
        }
    }

    /// Runs one scheduling tick now, as a manual trigger would.
    ///
    /// Returns true if a grain was added to the pool.
    pub fn fire(&mut self) -> bool {
        self.strategy
            .maybe_generate(
                &self.settings,
                &mut self.pool,
                &self.history,
                self.jitter,
                &mut self.rng,
            )
            .is_some()
    }

    /// Binds a new strategy. Grains already sounding are not affected.
    pub fn set_strategy(&mut self, strategy: impl Into<TriggerStrategy>) {
        let strategy = strategy.into();
        log::debug!("strategy: {} -> {}", self.strategy.name(), strategy.name());
        self.strategy = strategy;
    }

    /// The strategy that places new grains.
    pub fn strategy(&self) -> &TriggerStrategy {
        &self.strategy
    }

    /// Mutable access to the bound strategy's parameters.
    pub fn strategy_mut(&mut self) -> &mut TriggerStrategy {
        &mut self.strategy
    }

    /// Control values used for the next grain.
    pub fn settings(&self) -> &GrainSettings {
        &self.settings
    }

    /// Control values read on every scheduling tick.
    pub fn settings_mut(&mut self) -> &mut GrainSettings {
        &mut self.settings
    }

    /// Sets start-offset jitter, clamped to [0, 1].
    pub fn set_jitter(&mut self, jitter: f64) {
        self.jitter = clamp_jitter(jitter);
    }

    /// Start-offset jitter in [0, 1].
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// See [`GrainPool::set_max_active_grains`].
    pub fn set_max_active_grains(&mut self, max_active: usize) {
        self.pool.set_max_active_grains(max_active);
    }

    /// Changes where scheduling ticks come from.
    ///
    /// # Errors
    ///
    /// Returns an error, keeping the current mode, if `mode` fails
    /// [`ClockMode::validate`].
    pub fn set_clock_mode(&mut self, mode: ClockMode) -> Result<()> {
        let previous = self.clock.mode();
        self.clock.set_mode(mode)?;
        if previous != mode {
            log::debug!("clock mode: {previous:?} -> {mode:?}");
        }
        Ok(())
    }

    /// Where scheduling ticks currently come from.
    pub fn clock_mode(&self) -> ClockMode {
        self.clock.mode()
    }

    /// Number of voices currently sounding.
    pub fn active_grain_count(&self) -> usize {
        self.pool.active_grain_count()
    }

    /// The recording grains read from.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Direct access to the recording, e.g. to preload material.
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// The voice pool, for inspecting individual grains.
    pub fn pool(&self) -> &GrainPool<SAMPLE_RATE, GRAINS, F> {
        &self.pool
    }

    /// Stops every voice and resets the clock. The history is kept.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.clock.reset();
    }
}

fn clamp_jitter(jitter: f64) -> f64 {
    let clamped = if jitter.is_nan() { 0.0 } else { jitter.clamp(0.0, 1.0) };
    if clamped != jitter {
        log::warn!("jitter {jitter} clamped to {clamped}");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelopes::GrainEnvelope;
    use crate::error::GrainError;
    use crate::frame::Stereo;
    use crate::triggers::Periodic;
    use approx::assert_abs_diff_eq;

    const SR: u32 = 48000;

    type Engine = GrainEngine<SR, 8, f64, RingBuffer<f64>, StdRng>;

    fn engine(config: &EngineConfig) -> Engine {
        GrainEngine::with_parts(config, RingBuffer::new(48000), StdRng::seed_from_u64(7)).unwrap()
    }

    fn always() -> GrainSettings {
        GrainSettings::default().with_density(1.0)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig::default().with_history_seconds(0.0);
        assert!(matches!(
            GrainEngine::<SR, 8>::new(&config),
            Err(GrainError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_new_sizes_history_from_config() {
        let config = EngineConfig::default().with_history_seconds(0.5);
        let engine = GrainEngine::<SR, 8>::new(&config).unwrap();
        assert_eq!(engine.history().capacity(), 24000);
        assert_eq!(engine.pool().capacity(), 8);
    }

    #[test]
    fn test_same_call_input_reaches_output() {
        // a one-sample square grain at offset 0 plays exactly the frame just written
        let settings = always()
            .with_duration(1.0 / SR as f64)
            .with_volume(1.0)
            .with_envelope(GrainEnvelope::Square);
        let config = EngineConfig::default()
            .with_strategy(Periodic::new(0.0))
            .with_settings(settings);
        let mut engine = engine(&config);

        assert_eq!(engine.process(0.75, 0.0), 0.0);
        assert_eq!(engine.process(0.25, 5.0), 0.25);
        assert_eq!(engine.active_grain_count(), 0);
    }

    #[test]
    fn test_external_clock_fires_on_edges() {
        let config = EngineConfig::default()
            .with_strategy(Periodic::new(100.0))
            .with_settings(always());
        let mut engine = engine(&config);

        for i in 0..1000 {
            let clock = if i % 250 < 5 { 5.0 } else { 0.0 };
            engine.process(0.5, clock);
        }
        // 4 edges, the 100 ms grains have not finished yet
        assert_eq!(engine.active_grain_count(), 4);
    }

    #[test]
    fn test_fire_respects_density() {
        let config = EngineConfig::default().with_settings(always().with_density(0.0));
        let mut engine = engine(&config);
        assert!(!engine.fire());

        engine.settings_mut().density = 1.0;
        assert!(engine.fire());
        assert_eq!(engine.active_grain_count(), 1);
    }

    #[test]
    fn test_strategy_swap_keeps_sounding_grains() {
        let config = EngineConfig::default()
            .with_strategy(Periodic::new(10.0))
            .with_settings(always());
        let mut engine = engine(&config);
        engine.fire();
        engine.fire();

        let before: Vec<(f64, f64)> = engine
            .pool()
            .grains()
            .map(|g| (g.read_position(), g.speed()))
            .collect();

        engine.set_strategy(TriggerStrategy::cloud(3000.0, 100.0));
        assert_eq!(engine.strategy().name(), "cloud");

        let after: Vec<(f64, f64)> = engine
            .pool()
            .grains()
            .map(|g| (g.read_position(), g.speed()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(engine.active_grain_count(), 2);
    }

    #[test]
    fn test_max_active_from_config() {
        let config = EngineConfig::default()
            .with_max_active_grains(2)
            .with_settings(always());
        let mut engine = engine(&config);
        for _ in 0..10 {
            engine.fire();
        }
        assert_eq!(engine.active_grain_count(), 2);

        engine.set_max_active_grains(1);
        assert_eq!(engine.active_grain_count(), 1);
    }

    #[test]
    fn test_jitter_is_clamped() {
        let mut engine = engine(&EngineConfig::default().with_jitter(4.0));
        assert_eq!(engine.jitter(), 1.0);
        engine.set_jitter(f64::NAN);
        assert_eq!(engine.jitter(), 0.0);
    }

    #[test]
    fn test_set_clock_mode() {
        let mut engine = engine(&EngineConfig::default());
        assert!(engine.set_clock_mode(ClockMode::Subdivided(0)).is_err());
        assert_eq!(engine.clock_mode(), ClockMode::External);

        let mode = ClockMode::Internal {
            bpm: 120.0,
            steps_per_beat: 4,
        };
        engine.set_clock_mode(mode).unwrap();
        engine.settings_mut().density = 1.0;
        engine.process(0.0, 0.0);
        assert_eq!(engine.active_grain_count(), 1);
    }

    #[test]
    fn test_clear_stops_voices() {
        let mut engine = engine(&EngineConfig::default().with_settings(always()));
        engine.fire();
        engine.fire();
        engine.clear();
        assert_eq!(engine.active_grain_count(), 0);
        assert_eq!(engine.process(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_process_block_uses_shortest_slice() {
        let mut engine = engine(&EngineConfig::default());
        let input = [0.1; 8];
        let clock = [0.0; 4];
        let mut output = [9.0; 8];
        engine.process_block(&input, &clock, &mut output);
        assert_eq!(&output[..4], &[0.0; 4]);
        assert_eq!(&output[4..], &[9.0; 4]);
    }

    #[test]
    fn test_stereo_engine_pans() {
        let settings = always()
            .with_duration(0.01)
            .with_volume(1.0)
            .with_pan(1.0)
            .with_envelope(GrainEnvelope::Square);
        let config = EngineConfig::default()
            .with_strategy(Periodic::new(0.0))
            .with_settings(settings);
        let mut engine = GrainEngine::<SR, 4, Stereo>::with_parts(
            &config,
            RingBuffer::from_frames(vec![Stereo::mono(0.5); 1000]),
            StdRng::seed_from_u64(1),
        )
        .unwrap();

        let out = engine.process(Stereo::mono(0.5), 5.0);
        assert_abs_diff_eq!(out.left, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.right, 0.5, epsilon = 1e-12);
    }
}
