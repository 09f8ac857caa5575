//! Per-frame animation state.

use std::time::{Duration, Instant};

/// Height of the bouncing sphere above its rest position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounce {
    /// Phase accumulator; never decreases.
    pub step: f32,
    pub amplitude: f32,
}

impl Default for Bounce {
    fn default() -> Self {
        Self {
            step: 0.0,
            amplitude: 5.0,
        }
    }
}

impl Bounce {
    pub fn new(amplitude: f32) -> Self {
        Self {
            step: 0.0,
            amplitude,
        }
    }

    /// Advance the phase by `speed` (negative and NaN speeds count as zero)
    /// and return the new height, `amplitude * |sin(step)|`.
    pub fn advance(&mut self, speed: f32) -> f32 {
        if speed > 0.0 {
            self.step += speed;
        }
        self.height()
    }

    pub fn height(&self) -> f32 {
        self.amplitude * self.step.sin().abs()
    }
}

/// Scene time that stops while the window can't be seen.
///
/// `tick` is called once per redraw; time spent paused is never added to
/// `elapsed`, and the first frame after resuming has a zero delta.
#[derive(Debug)]
pub struct FrameClock {
    elapsed: Duration,
    last: Option<Instant>,
    paused: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
            last: None,
            paused: false,
        }
    }

    /// Advance to `now`, returning the frame delta in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        if self.paused {
            self.last = None;
            return 0.0;
        }
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        self.elapsed += dt;
        dt.as_secs_f32()
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            log::debug!("frame clock {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
        if paused {
            self.last = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds of visible time since start.
    pub fn elapsed(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounce_follows_abs_sine() {
        let mut bounce = Bounce::default();
        assert_eq!(bounce.advance(0.0), 0.0);
        let h = bounce.advance(std::f32::consts::FRAC_PI_2);
        assert!((h - 5.0).abs() < 1e-5);
        // Past π the sine is negative but the height stays positive.
        let h = bounce.advance(std::f32::consts::PI);
        assert!(h > 4.99);
    }

    #[test]
    fn bounce_step_never_decreases() {
        let mut bounce = Bounce::default();
        bounce.advance(0.5);
        bounce.advance(-1.0);
        bounce.advance(f32::NAN);
        assert_eq!(bounce.step, 0.5);
    }

    #[test]
    fn clock_skips_paused_time() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(start), 0.0);
        let dt = clock.tick(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);

        clock.set_paused(true);
        assert_eq!(clock.tick(start + Duration::from_secs(5)), 0.0);
        clock.set_paused(false);

        // First frame after resuming contributes nothing.
        assert_eq!(clock.tick(start + Duration::from_secs(10)), 0.0);
        clock.tick(start + Duration::from_millis(10_016));
        assert!((clock.elapsed() - 0.032).abs() < 1e-5);
    }
}
