//! Tempo-derived subdivision of an external clock.

/// Derives evenly spaced scheduling ticks from an external clock.
///
/// The divider measures the number of samples between consecutive clock
/// edges and splits that period into `subdivisions` ticks. The first tick of
/// every period fires on the edge itself; the remaining ones follow at the
/// measured spacing. Until two edges have been seen only edges tick, and no
/// more than `subdivisions - 1` extra ticks are produced between two edges,
/// so a slowing clock never runs ahead.
///
/// # Examples
///
/// ```
/// use graincloud::clock::ClockDivider;
///
/// let mut divider = ClockDivider::new(4);
///
/// // a clock edge every 400 samples
/// let mut ticks = 0;
/// for i in 0..2000 {
///     if divider.tick(i % 400 == 0) {
///         ticks += 1;
///     }
/// }
/// // first period only ticks on its edge, later periods tick four times
/// assert_eq!(ticks, 1 + 4 * 4);
/// ```
#[derive(Debug, Clone)]
pub struct ClockDivider {
    subdivisions: u32,
    /// Samples since the last edge, None before the first edge
    since_edge: Option<u64>,
    /// Measured edge-to-edge period in samples
    period: Option<f64>,
    /// Samples since the last emitted tick, fractional
    accumulator: f64,
    /// Ticks emitted since the last edge, including the edge tick
    emitted: u32,
}

impl ClockDivider {
    /// Creates a divider producing `subdivisions` ticks per clock period.
    ///
    /// # Panics
    ///
    /// Panics if `subdivisions` is 0.
    pub fn new(subdivisions: u32) -> Self {
        assert!(subdivisions > 0, "subdivisions must be greater than 0");
        Self {
            subdivisions,
            since_edge: None,
            period: None,
            accumulator: 0.0,
            emitted: 0,
        }
    }

    /// Advances by one sample. `edge` is true when the clock input rose.
    ///
    /// Returns true on a scheduling tick.
    pub fn tick(&mut self, edge: bool) -> bool {
        if let Some(since_edge) = self.since_edge.as_mut() {
            *since_edge += 1;
        }

        if edge {
            if let Some(samples) = self.since_edge {
                self.period = Some(samples as f64);
            }
            self.since_edge = Some(0);
            self.accumulator = 0.0;
            self.emitted = 1;
            return true;
        }

        let Some(period) = self.period else {
            return false;
        };
        if self.emitted >= self.subdivisions {
            return false;
        }

        let spacing = period / self.subdivisions as f64;
        self.accumulator += 1.0;
        if self.accumulator >= spacing {
            self.accumulator -= spacing;
            self.emitted += 1;
            true
        } else {
            false
        }
    }

    /// Measured clock period in samples, once two edges have been seen.
    pub fn period(&self) -> Option<f64> {
        self.period
    }

    /// Ticks emitted per measured period.
    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Changes the number of ticks per period, keeping the measured period.
    ///
    /// # Panics
    ///
    /// Panics if `subdivisions` is 0.
    pub fn set_subdivisions(&mut self, subdivisions: u32) {
        assert!(subdivisions > 0, "subdivisions must be greater than 0");
        self.subdivisions = subdivisions;
    }

    /// Forgets the measured period.
    pub fn reset(&mut self) {
        self.since_edge = None;
        self.period = None;
        self.accumulator = 0.0;
        self.emitted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Indices of the samples that ticked.
    fn tick_positions(divider: &mut ClockDivider, period: u64, samples: u64) -> Vec<u64> {
        (0..samples)
            .filter(|i| divider.tick(i % period == 0))
            .collect()
    }

    #[test]
    fn test_single_subdivision_follows_edges() {
        let mut divider = ClockDivider::new(1);
        assert_eq!(tick_positions(&mut divider, 100, 350), vec![0, 100, 200, 300]);
    }

    #[test]
    fn test_even_spacing_after_first_period() {
        let mut divider = ClockDivider::new(4);
        let ticks = tick_positions(&mut divider, 400, 800);
        assert_eq!(ticks, vec![0, 400, 500, 600, 700]);
        assert_eq!(divider.period(), Some(400.0));
    }

    #[test]
    fn test_fractional_spacing() {
        let mut divider = ClockDivider::new(3);
        let ticks = tick_positions(&mut divider, 100, 200);
        assert_eq!(ticks.len(), 1 + 3);
        assert_eq!(ticks[1], 100);
        // 33.3 sample spacing
        assert_eq!(ticks[2], 134);
        assert_eq!(ticks[3], 167);
    }

    #[test]
    fn test_slowing_clock_does_not_overrun() {
        let mut divider = ClockDivider::new(2);
        for i in 0..=100 {
            divider.tick(i == 0 || i == 100);
        }
        // the clock now stops; only one extra tick follows the last edge
        let extra = (0..1000).filter(|_| divider.tick(false)).count();
        assert_eq!(extra, 1);
    }

    #[test]
    fn test_no_ticks_before_first_edge() {
        let mut divider = ClockDivider::new(4);
        assert!((0..1000).all(|_| !divider.tick(false)));
    }

    #[test]
    fn test_reset() {
        let mut divider = ClockDivider::new(2);
        tick_positions(&mut divider, 50, 200);
        assert!(divider.period().is_some());
        divider.reset();
        assert!(divider.period().is_none());
    }
}
