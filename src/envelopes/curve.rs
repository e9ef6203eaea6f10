//! Segment shapes for grain envelopes.

/// Shape of a rising envelope segment.
///
/// A curve maps normalized progress through a segment, in [0, 1], to a gain
/// in [0, 1]. Falling segments evaluate the same curve on the remaining
/// progress, so `Power(2.0)` gives a slow-start attack and a fast-start decay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Curve {
    /// Straight ramp
    #[default]
    Linear,

    /// `t^exp`. Exponents above 1 bend the ramp downwards, below 1 upwards.
    Power(f64),

    /// Smoothstep ease-in/ease-out
    SCurve,
}

impl Curve {
    /// Evaluates the curve at `t`, clamped to [0, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use graincloud::envelopes::Curve;
    ///
    /// assert_eq!(Curve::Linear.apply(0.25), 0.25);
    /// assert_eq!(Curve::Power(2.0).apply(0.5), 0.25);
    /// ```
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Curve::Linear => t,
            Curve::Power(exp) if exp.is_finite() && *exp > 0.0 => t.powf(*exp),
            Curve::Power(_) => t,
            Curve::SCurve => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Rising segment: 0 at the start, 1 at the end.
    #[inline]
    pub fn rise(&self, progress: f64) -> f64 {
        self.apply(progress)
    }

    /// Falling segment: 1 at the start, 0 at the end.
    #[inline]
    pub fn fall(&self, progress: f64) -> f64 {
        self.apply(1.0 - progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for curve in [Curve::Linear, Curve::Power(3.0), Curve::SCurve] {
            assert_eq!(curve.rise(0.0), 0.0);
            assert_eq!(curve.rise(1.0), 1.0);
            assert_eq!(curve.fall(0.0), 1.0);
            assert_eq!(curve.fall(1.0), 0.0);
        }
    }

    #[test]
    fn test_power_shape() {
        assert_eq!(Curve::Power(2.0).rise(0.5), 0.25);
        assert_eq!(Curve::Power(2.0).fall(0.5), 0.25);
        assert!((Curve::Power(0.5).rise(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_power_is_linear() {
        assert_eq!(Curve::Power(0.0).apply(0.3), 0.3);
        assert_eq!(Curve::Power(f64::NAN).apply(0.3), 0.3);
    }

    #[test]
    fn test_scurve_is_symmetric() {
        let curve = Curve::SCurve;
        assert_eq!(curve.apply(0.5), 0.5);
        assert!(curve.apply(0.25) < 0.25);
        assert!(curve.apply(0.75) > 0.75);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Curve::Linear.apply(-1.0), 0.0);
        assert_eq!(Curve::Linear.apply(2.0), 1.0);
        assert_eq!(Curve::SCurve.apply(f64::NAN), 0.0);
    }
}
