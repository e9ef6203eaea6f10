//! Uniform random placement within a window of the history.

use super::{GrainSettings, Placement, uniform};
use rand::Rng;

/// Draws each grain's start offset and volume uniformly from fixed ranges.
///
/// Ranges are `(min, max)` pairs; reversed pairs are accepted and an empty
/// range always yields its single value. Start offsets are in samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomWindow {
    /// Start offset range, in samples behind the write head
    pub start_range: (f64, f64),
    /// Volume range; replaces the volume setting
    pub volume_range: (f64, f64),
    /// Optional multiplier range applied to the speed setting
    pub speed_range: Option<(f64, f64)>,
}

impl Default for RandomWindow {
    fn default() -> Self {
        Self {
            start_range: (0.0, 12000.0),
            volume_range: (0.5, 1.0),
            speed_range: None,
        }
    }
}

impl RandomWindow {
    /// Picks starts from `start_range` (samples) and volumes from `volume_range`.
    pub fn new(start_range: (f64, f64), volume_range: (f64, f64)) -> Self {
        Self {
            start_range,
            volume_range,
            speed_range: None,
        }
    }

    /// Also randomizes speed by a factor drawn from `range`.
    pub fn with_speed_range(mut self, range: (f64, f64)) -> Self {
        self.speed_range = Some(range);
        self
    }

    pub(super) fn place<R: Rng + ?Sized>(&self, settings: &GrainSettings, rng: &mut R) -> Placement {
        let start = uniform(rng, self.start_range);
        let volume = uniform(rng, self.volume_range);
        let speed = match self.speed_range {
            Some(range) => settings.speed * uniform(rng, range),
            None => settings.speed,
        };

        Placement {
            start,
            speed,
            volume,
            pan: settings.pan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draws_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let window = RandomWindow::new((100.0, 200.0), (0.2, 0.4)).with_speed_range((0.5, 2.0));
        let settings = GrainSettings::default().with_speed(2.0);

        for _ in 0..1000 {
            let p = window.place(&settings, &mut rng);
            assert!((100.0..200.0).contains(&p.start));
            assert!((0.2..0.4).contains(&p.volume));
            assert!((1.0..4.0).contains(&p.speed));
        }
    }

    #[test]
    fn test_start_is_spread_across_window() {
        let mut rng = StdRng::seed_from_u64(11);
        let window = RandomWindow::new((0.0, 1000.0), (1.0, 1.0));
        let settings = GrainSettings::default();

        let starts: Vec<f64> = (0..1000).map(|_| window.place(&settings, &mut rng).start).collect();
        assert!(starts.iter().any(|&s| s < 250.0));
        assert!(starts.iter().any(|&s| s > 750.0));
    }

    #[test]
    fn test_fixed_ranges_and_speed_passthrough() {
        let mut rng = StdRng::seed_from_u64(1);
        let window = RandomWindow::new((500.0, 500.0), (0.9, 0.9));
        let settings = GrainSettings::default().with_speed(1.5).with_pan(-0.2);

        let p = window.place(&settings, &mut rng);
        assert_eq!(p.start, 500.0);
        assert_eq!(p.volume, 0.9);
        assert_eq!(p.speed, 1.5);
        assert_eq!(p.pan, -0.2);
    }
}
