use std::time::{Duration, Instant};

/// Quadratic ease-in-out, `t<0.5 ? 2t² : -1+(4-2t)t`, with `t` clamped to `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// A value easing from `from` to `to` over a fixed wall-clock window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    start: Instant,
    duration: Duration,
    from: f32,
    to: f32,
}

impl Ramp {
    pub fn new(from: f32, to: f32, duration: Duration, now: Instant) -> Self {
        Self {
            start: now,
            duration,
            from,
            to,
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Returns the eased value at `now` and whether the ramp has finished.
    pub fn sample(&self, now: Instant) -> (f32, bool) {
        if self.duration.is_zero() {
            return (self.to, true);
        }
        let elapsed = now.saturating_duration_since(self.start);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        let mix = ease_in_out(progress);
        let value = self.from + (self.to - self.from) * mix;
        (value, progress >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_in_out_accelerates_then_decelerates() {
        assert!((ease_in_out(0.0) - 0.0).abs() < 1e-6);
        assert!((ease_in_out(0.25) - 0.125).abs() < 1e-6);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(0.75) - 0.875).abs() < 1e-6);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_is_monotonic() {
        let mut last = 0.0;
        for step in 0..=20 {
            let sample = ease_in_out(step as f32 / 20.0);
            assert!(sample >= last - f32::EPSILON);
            last = sample;
        }
    }

    #[test]
    fn ease_in_out_clamps_outside_unit_interval() {
        assert_eq!(ease_in_out(-3.0), 0.0);
        assert_eq!(ease_in_out(7.0), 1.0);
    }

    #[test]
    fn ramp_interpolates_between_endpoints() {
        let start = Instant::now();
        let ramp = Ramp::new(1.0, 0.0, Duration::from_millis(100), start);
        let (value, finished) = ramp.sample(start + Duration::from_millis(50));
        assert!((value - 0.5).abs() < 1e-3);
        assert!(!finished);

        let (value, finished) = ramp.sample(start + Duration::from_millis(150));
        assert_eq!(value, 0.0);
        assert!(finished);
    }

    #[test]
    fn zero_length_ramp_snaps_to_target() {
        let now = Instant::now();
        let ramp = Ramp::new(0.2, 0.9, Duration::ZERO, now);
        assert_eq!(ramp.sample(now), (0.9, true));
    }
}
