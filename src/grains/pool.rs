//! Grain pool for polyphonic granular playback.
//!
//! # Design Overview
//!
//! The `GrainPool` owns a fixed array of [`Grain`] voices. Every call to
//! [`GrainPool::add_grain`] succeeds: it uses the first idle voice if one
//! exists, otherwise it steals the voice that was triggered longest ago.
//!
//! ## Voice Stealing
//!
//! Each voice records the value of a global trigger counter when it was last
//! triggered (its *age*). When every voice in the allocation range is busy,
//! the voice with the smallest age is re-triggered. Ordering is by trigger
//! time, not by how far a grain has progressed. The stolen grain is cut off
//! without a fade.
//!
//! ## Polyphony Limit
//!
//! [`GrainPool::set_max_active_grains`] restricts allocation to the first `k`
//! voices. The underlying array never changes size.
//!
//! ## Normalization
//!
//! [`GrainPool::process`] divides the summed output by the number of voices
//! that were active at the start of the call, so perceived loudness follows
//! polyphony only loosely.

use super::voice::{Grain, GrainRequest};
use crate::frame::Frame;
use crate::history::HistoryBuffer;

/// A voice together with the trigger counter value of its last trigger.
#[derive(Debug, Clone)]
struct GrainSlot<const SAMPLE_RATE: u32, F: Frame> {
    grain: Grain<SAMPLE_RATE, F>,
    age: u64,
}

/// Fixed-capacity pool of grain voices with oldest-first stealing.
///
/// # Type Parameters
///
/// * `SAMPLE_RATE` - Sample rate in Hz
/// * `GRAINS` - Number of voices (must be at least 1)
/// * `F` - Frame type
///
/// # Examples
///
/// ```
/// use graincloud::grains::{GrainPool, GrainRequest};
/// use graincloud::history::{HistoryBuffer, RingBuffer};
///
/// const SAMPLE_RATE: u32 = 48000;
///
/// let mut history = RingBuffer::<f64>::new(SAMPLE_RATE as usize);
/// history.write(0.5);
///
/// let mut pool = GrainPool::<SAMPLE_RATE, 2>::new(4800);
/// pool.add_grain(&history, &GrainRequest::default());
/// pool.add_grain(&history, &GrainRequest::default());
/// assert_eq!(pool.active_grain_count(), 2);
///
/// // the pool is full, so the first grain is stolen
/// assert_eq!(pool.add_grain(&history, &GrainRequest::default()), 0);
/// assert_eq!(pool.active_grain_count(), 2);
///
/// let sample = pool.process();
/// ```
#[derive(Debug, Clone)]
pub struct GrainPool<const SAMPLE_RATE: u32, const GRAINS: usize, F: Frame = f64> {
    slots: [GrainSlot<SAMPLE_RATE, F>; GRAINS],
    age_counter: u64,
    max_active: usize,
}

impl<const SAMPLE_RATE: u32, const GRAINS: usize, F: Frame> GrainPool<SAMPLE_RATE, GRAINS, F> {
    const NON_EMPTY: () = assert!(GRAINS > 0, "a grain pool needs at least one voice");

    /// Creates a pool of idle voices, each able to hold `max_grain_samples` frames.
    ///
    /// All voice buffers are allocated here, up front.
    ///
    /// # Panics
    ///
    /// Panics if `max_grain_samples` is 0.
    pub fn new(max_grain_samples: usize) -> Self {
        let () = Self::NON_EMPTY;
        let slots = std::array::from_fn(|_| GrainSlot {
            grain: Grain::new(max_grain_samples),
            age: 0,
        });

        Self {
            slots,
            age_counter: 0,
            max_active: GRAINS,
        }
    }

    /// Triggers a grain, stealing the oldest voice if none is free.
    ///
    /// Returns the index of the voice that now plays the grain.
    ///
    /// # Examples
    ///
    /// ```
    /// use graincloud::grains::{GrainPool, GrainRequest};
    /// use graincloud::history::RingBuffer;
    ///
    /// let history = RingBuffer::<f64>::new(48000);
    /// let mut pool = GrainPool::<48000, 4>::new(4800);
    ///
    /// assert_eq!(pool.add_grain(&history, &GrainRequest::default()), 0);
    /// assert_eq!(pool.add_grain(&history, &GrainRequest::default()), 1);
    /// ```
    pub fn add_grain<H: HistoryBuffer<F> + ?Sized>(
        &mut self,
        history: &H,
        request: &GrainRequest,
    ) -> usize {
        let index = self.find_grain_to_use();

        self.age_counter = self.age_counter.wrapping_add(1);

        let slot = &mut self.slots[index];
        slot.age = self.age_counter;
        slot.grain.trigger(history, request);
        index
    }

    /// Mixes one frame from every active voice.
    ///
    /// The sum is divided by the number of voices active at the start of the
    /// call. Returns silence when nothing is playing.
    pub fn process(&mut self) -> F {
        let active = self.active_grain_count();
        if active == 0 {
            return F::default();
        }

        let sum = self
            .slots
            .iter_mut()
            .filter(|slot| slot.grain.is_active())
            .fold(F::default(), |acc, slot| acc + slot.grain.process());

        sum.scale(1.0 / active as f64)
    }

    /// Fills `output` with consecutive mixed frames.
    pub fn process_block(&mut self, output: &mut [F]) {
        for frame in output.iter_mut() {
            *frame = self.process();
        }
    }

    /// Returns the number of voices currently playing.
    pub fn active_grain_count(&self) -> usize {
        self.slots.iter().filter(|s| s.grain.is_active()).count()
    }

    /// Limits allocation to the first `max_active` voices.
    ///
    /// The limit is clamped to `1..=GRAINS`. Voices beyond the new limit are
    /// stopped at once, so the active count never exceeds the limit.
    pub fn set_max_active_grains(&mut self, max_active: usize) {
        let clamped = max_active.clamp(1, GRAINS);
        if clamped != max_active {
            log::warn!("max active grains {max_active} clamped to {clamped}");
        }
        if clamped != self.max_active {
            log::debug!("max active grains: {} -> {}", self.max_active, clamped);
        }
        self.max_active = clamped;
        for slot in self.slots[clamped..].iter_mut() {
            slot.grain.stop();
        }
    }

    /// Current polyphony limit.
    pub fn max_active_grains(&self) -> usize {
        self.max_active
    }

    /// Number of voices in the pool.
    pub const fn capacity(&self) -> usize {
        GRAINS
    }

    /// Stops every voice.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.grain.stop();
        }
    }

    /// Read-only view of voice `index`.
    pub fn grain(&self, index: usize) -> Option<&Grain<SAMPLE_RATE, F>> {
        self.slots.get(index).map(|s| &s.grain)
    }

    /// Trigger counter value recorded by voice `index`, 0 if never triggered.
    pub fn age_of(&self, index: usize) -> Option<u64> {
        self.slots.get(index).map(|s| s.age)
    }

    /// Iterates over all voices.
    pub fn grains(&self) -> impl Iterator<Item = &Grain<SAMPLE_RATE, F>> {
        self.slots.iter().map(|s| &s.grain)
    }

    /// Finds a voice for a new grain.
    ///
    /// Priority:
    /// 1. First idle voice within the polyphony limit
    /// 2. Oldest voice within the polyphony limit
    fn find_grain_to_use(&self) -> usize {
        let candidates = &self.slots[..self.max_active];

        if let Some(idx) = candidates.iter().position(|s| !s.grain.is_active()) {
            return idx;
        }

        let oldest = self.find_oldest_grain();
        log::trace!("stealing grain {oldest} (age {})", self.slots[oldest].age);
        oldest
    }

    /// Finds the voice with the lowest age within the polyphony limit.
    fn find_oldest_grain(&self) -> usize {
        self.slots[..self.max_active]
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.age)
            .map_or(0, |(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelopes::GrainEnvelope;
    use crate::frame::Stereo;
    use crate::history::RingBuffer;
    use approx::assert_abs_diff_eq;

    const SAMPLE_RATE: u32 = 48000;

    fn constant_history(value: f64) -> RingBuffer<f64> {
        let mut history = RingBuffer::new(4800);
        for _ in 0..4800 {
            history.write(value);
        }
        history
    }

    fn square(duration: f64) -> GrainRequest {
        GrainRequest {
            duration,
            envelope_duration: duration,
            envelope: GrainEnvelope::Square,
            ..GrainRequest::default()
        }
    }

    #[test]
    fn test_creation() {
        let pool = GrainPool::<SAMPLE_RATE, 8>::new(1000);
        assert_eq!(pool.active_grain_count(), 0);
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.max_active_grains(), 8);
        assert_eq!(pool.grain(0).map(|g| g.max_grain_samples()), Some(1000));
        assert!(pool.grain(8).is_none());
    }

    #[test]
    fn test_silent_when_idle() {
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);
        assert_eq!(pool.process(), 0.0);
    }

    #[test]
    fn test_uses_first_free_voice() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);

        assert_eq!(pool.add_grain(&history, &square(0.01)), 0);
        assert_eq!(pool.add_grain(&history, &square(0.01)), 1);
        assert_eq!(pool.active_grain_count(), 2);
        assert_eq!(pool.age_of(0), Some(1));
        assert_eq!(pool.age_of(1), Some(2));
        assert_eq!(pool.age_of(2), Some(0));
    }

    #[test]
    fn test_steals_oldest_voice() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 3>::new(1000);

        for _ in 0..3 {
            pool.add_grain(&history, &square(0.01));
        }
        assert_eq!(pool.active_grain_count(), 3);

        let stolen = pool.add_grain(&history, &square(0.01));
        assert_eq!(stolen, 0);
        assert_eq!(pool.age_of(0), Some(4));

        // voice 1 is now the oldest
        assert_eq!(pool.add_grain(&history, &square(0.01)), 1);
        assert_eq!(pool.add_grain(&history, &square(0.01)), 2);
        assert_eq!(pool.add_grain(&history, &square(0.01)), 0);
        assert_eq!(pool.active_grain_count(), 3);
    }

    #[test]
    fn test_freed_voice_is_reused_before_stealing() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 2>::new(1000);

        pool.add_grain(&history, &square(10.0 / SAMPLE_RATE as f64));
        pool.add_grain(&history, &square(0.01));
        for _ in 0..10 {
            pool.process();
        }
        assert_eq!(pool.active_grain_count(), 1);

        // voice 0 finished, so it is reused even though voice 1 is older than the new grain
        assert_eq!(pool.add_grain(&history, &square(0.01)), 0);
    }

    #[test]
    fn test_mix_is_normalized_by_active_count() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);

        pool.add_grain(&history, &square(0.01));
        assert_abs_diff_eq!(pool.process(), 0.5);

        pool.add_grain(&history, &square(0.01));
        pool.add_grain(&history, &square(0.01));
        assert_abs_diff_eq!(pool.process(), 0.5);
    }

    #[test]
    fn test_non_finite_volume_mutes_only_its_grain() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 3>::new(1000);

        let broken = [f64::NAN, f64::INFINITY];
        for volume in broken {
            pool.add_grain(&history, &GrainRequest { volume, ..square(0.01) });
        }
        pool.add_grain(&history, &square(0.01));
        assert_eq!(pool.grain(0).map(|g| g.volume()), Some(0.0));
        assert_eq!(pool.grain(1).map(|g| g.volume()), Some(0.0));

        let out = pool.process();
        assert!(out.is_finite());
        assert_abs_diff_eq!(out, 0.5 / 3.0);
    }

    #[test]
    fn test_mix_counts_voices_finishing_this_call() {
        let history = constant_history(1.0);
        let mut pool = GrainPool::<SAMPLE_RATE, 2>::new(1000);

        pool.add_grain(&history, &square(1.0 / SAMPLE_RATE as f64));
        pool.add_grain(&history, &square(0.01));

        // both voices render this frame, one of them finishes
        assert_abs_diff_eq!(pool.process(), 1.0);
        assert_eq!(pool.active_grain_count(), 1);
        assert_abs_diff_eq!(pool.process(), 1.0);
    }

    #[test]
    fn test_max_active_limits_allocation() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 8>::new(1000);
        pool.set_max_active_grains(2);

        for _ in 0..10 {
            let idx = pool.add_grain(&history, &square(0.01));
            assert!(idx < 2);
            assert!(pool.active_grain_count() <= 2);
        }
    }

    #[test]
    fn test_lowering_max_active_stops_excess_voices() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);
        for _ in 0..4 {
            pool.add_grain(&history, &square(0.01));
        }

        pool.set_max_active_grains(1);
        assert_eq!(pool.active_grain_count(), 1);
        assert!(pool.grain(0).is_some_and(|g| g.is_active()));
    }

    #[test]
    fn test_max_active_is_clamped() {
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);
        pool.set_max_active_grains(0);
        assert_eq!(pool.max_active_grains(), 1);
        pool.set_max_active_grains(100);
        assert_eq!(pool.max_active_grains(), 4);
    }

    #[test]
    fn test_clear() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);
        pool.add_grain(&history, &square(0.01));
        pool.add_grain(&history, &square(0.01));

        pool.clear();
        assert_eq!(pool.active_grain_count(), 0);
        assert_eq!(pool.process(), 0.0);
    }

    #[test]
    fn test_process_block() {
        let history = constant_history(0.5);
        let mut pool = GrainPool::<SAMPLE_RATE, 4>::new(1000);
        pool.add_grain(&history, &square(64.0 / SAMPLE_RATE as f64));

        let mut block = [0.0; 128];
        pool.process_block(&mut block);
        assert!(block[..64].iter().all(|&s| (s - 0.5).abs() < 1e-12));
        assert!(block[64..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stereo_pool() {
        let mut history = RingBuffer::<Stereo>::new(1000);
        for _ in 0..1000 {
            history.write(Stereo::mono(1.0));
        }
        let mut pool = GrainPool::<SAMPLE_RATE, 2, Stereo>::new(1000);
        pool.add_grain(
            &history,
            &GrainRequest {
                pan: -1.0,
                ..square(0.01)
            },
        );
        pool.add_grain(
            &history,
            &GrainRequest {
                pan: 1.0,
                ..square(0.01)
            },
        );

        let frame = pool.process();
        assert_abs_diff_eq!(frame.left, 0.5);
        assert_abs_diff_eq!(frame.right, 0.5);
    }
}
