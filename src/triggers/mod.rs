//! Grain generation strategies.
//!
//! On every scheduling tick the bound [`TriggerStrategy`] decides whether a
//! grain fires and, if so, where in the history it starts, how fast it plays,
//! how loud it is and where it sits in the stereo field.
//!
//! Every strategy follows the same steps:
//!
//! 1. Draw `u` uniformly from [0, 1); if `u >= density` nothing fires.
//! 2. Let the policy place the grain (start offset, speed, volume, pan).
//! 3. Add the delay setting to the start offset, then apply jitter of up to
//!    one grain length per unit, then clamp to the oldest frame in the history.
//! 4. Add the grain to the pool with the duration, envelope duration, loop
//!    flag and envelope from [`GrainSettings`].
//!
//! Randomness always comes from a caller-supplied [`Rng`], so a seeded
//! generator makes scheduling reproducible.

mod cloud;
mod periodic;
mod random;
mod settings;

pub use cloud::Cloud;
pub use periodic::Periodic;
pub use random::RandomWindow;
pub use settings::{GrainSettings, SpeedMapping};

use crate::frame::Frame;
use crate::grains::{GrainPool, GrainRequest};
use crate::history::HistoryBuffer;
use rand::Rng;

/// Where and how a policy wants the next grain to play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    /// Start offset in samples behind the write head
    pub start: f64,
    pub speed: f64,
    pub volume: f64,
    pub pan: f64,
}

/// Uniform draw from `range`, tolerant of reversed and empty ranges.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, (a, b): (f64, f64)) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo < hi && (hi - lo).is_finite() {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// The policy used to place new grains.
///
/// Exactly one strategy is bound to an engine at a time. Replacing it only
/// affects grains fired afterwards.
///
/// # Examples
///
/// ```
/// use graincloud::grains::GrainPool;
/// use graincloud::history::RingBuffer;
/// use graincloud::triggers::{GrainSettings, TriggerStrategy};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let history = RingBuffer::<f64>::new(48000);
/// let mut pool = GrainPool::<48000, 8>::new(4800);
/// let mut rng = StdRng::seed_from_u64(42);
///
/// let mut strategy = TriggerStrategy::periodic(480.0);
/// let settings = GrainSettings::default().with_density(1.0);
///
/// let fired = strategy.maybe_generate(&settings, &mut pool, &history, 0.0, &mut rng);
/// assert_eq!(fired, Some(0));
/// assert_eq!(pool.active_grain_count(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerStrategy {
    Periodic(Periodic),
    RandomWindow(RandomWindow),
    Cloud(Cloud),
}

impl Default for TriggerStrategy {
    fn default() -> Self {
        TriggerStrategy::Cloud(Cloud::default())
    }
}

impl From<Periodic> for TriggerStrategy {
    fn from(policy: Periodic) -> Self {
        TriggerStrategy::Periodic(policy)
    }
}

impl From<RandomWindow> for TriggerStrategy {
    fn from(policy: RandomWindow) -> Self {
        TriggerStrategy::RandomWindow(policy)
    }
}

impl From<Cloud> for TriggerStrategy {
    fn from(policy: Cloud) -> Self {
        TriggerStrategy::Cloud(policy)
    }
}

impl TriggerStrategy {
    /// Periodic stepping by `step` samples.
    pub fn periodic(step: f64) -> Self {
        Periodic::new(step).into()
    }

    /// Uniform start offsets in `start_range` samples and volumes in `volume_range`.
    pub fn random_window(start_range: (f64, f64), volume_range: (f64, f64)) -> Self {
        RandomWindow::new(start_range, volume_range).into()
    }

    /// A cloud of grains `spread` samples around `center`.
    pub fn cloud(center: f64, spread: f64) -> Self {
        Cloud::new(center, spread).into()
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            TriggerStrategy::Periodic(_) => "periodic",
            TriggerStrategy::RandomWindow(_) => "random",
            TriggerStrategy::Cloud(_) => "cloud",
        }
    }

    /// Runs one scheduling tick without touching a pool.
    ///
    /// Returns the grain that would fire, or `None` if the density gate
    /// skipped this tick. `capacity` is the history length in samples.
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        settings: &GrainSettings,
        capacity: usize,
        sample_rate: u32,
        jitter: f64,
        rng: &mut R,
    ) -> Option<GrainRequest> {
        let density = if settings.density.is_nan() {
            0.0
        } else {
            settings.density.clamp(0.0, 1.0)
        };
        if rng.gen_range(0.0..1.0) >= density {
            return None;
        }

        let capacity = capacity as f64;
        let sample_rate = sample_rate as f64;

        let placement = match self {
            TriggerStrategy::Periodic(policy) => policy.place(settings, capacity),
            TriggerStrategy::RandomWindow(policy) => policy.place(settings, rng),
            TriggerStrategy::Cloud(policy) => policy.place(settings, rng),
        };

        let mut start = placement.start + finite_or_zero(settings.delay) * sample_rate;
        let jitter = if jitter.is_nan() { 0.0 } else { jitter.clamp(0.0, 1.0) };
        if jitter > 0.0 {
            let grain_length = finite_or_zero(settings.duration).max(0.0) * sample_rate;
            start += rng.gen_range(-1.0..=1.0) * jitter * grain_length;
        }
        // the oldest readable frame is `capacity - 1` samples back
        let oldest = (capacity - 1.0).max(0.0);
        let start = if start.is_finite() {
            start.clamp(0.0, oldest)
        } else {
            0.0
        };

        Some(GrainRequest {
            start_offset: start / sample_rate,
            speed: placement.speed,
            volume: placement.volume,
            duration: settings.duration,
            envelope_duration: settings.envelope_duration,
            looping: settings.looping,
            pan: placement.pan,
            envelope: settings.envelope,
        })
    }

    /// Runs one scheduling tick, adding a grain to `pool` if one fires.
    ///
    /// Returns the index of the voice that received the grain.
    pub fn maybe_generate<const SAMPLE_RATE: u32, const GRAINS: usize, F, H, R>(
        &mut self,
        settings: &GrainSettings,
        pool: &mut GrainPool<SAMPLE_RATE, GRAINS, F>,
        history: &H,
        jitter: f64,
        rng: &mut R,
    ) -> Option<usize>
    where
        F: Frame,
        H: HistoryBuffer<F> + ?Sized,
        R: Rng + ?Sized,
    {
        let request = self.plan(settings, history.capacity(), SAMPLE_RATE, jitter, rng)?;
        Some(pool.add_grain(history, &request))
    }
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
