//! Fixed-step clock for the physics tick.
//!
//! The host advances decision ticks at the frame rate and asks the clock how
//! many fixed physics steps fit into the elapsed time.

/// Default physics rate.
pub const DEFAULT_PHYSICS_HZ: u32 = 60;

/// Upper bound on physics steps per frame.
const MAX_STEPS_PER_FRAME: u32 = 10;

/// Accumulates frame time into fixed physics steps.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    /// Accumulated, not yet simulated time
    accumulator: f32,
    /// Fixed timestep delta
    fixed_dt: f32,
    /// Simulation time covered by fixed steps so far
    elapsed: f32,
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(DEFAULT_PHYSICS_HZ)
    }
}

impl FixedStepClock {
    /// Creates a clock ticking at `hz` (at least 1).
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt: 1.0 / hz.max(1) as f32,
            elapsed: 0.0,
        }
    }

    /// Fixed timestep.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Simulation time covered by fixed steps.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Accumulate time for fixed timestep updates.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind after the cap: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.elapsed += count as f32 * self.fixed_dt;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_whole_steps() {
        let mut clock = FixedStepClock::new(60);
        assert_eq!(clock.accumulate(0.04), 2);
        assert!((clock.elapsed() - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_accumulate_carries_remainder() {
        let mut clock = FixedStepClock::new(60);
        assert_eq!(clock.accumulate(0.01), 0);
        assert_eq!(clock.accumulate(0.01), 1);
    }

    #[test]
    fn test_accumulate_caps_steps() {
        let mut clock = FixedStepClock::new(60);
        assert_eq!(clock.accumulate(1.0), 10);
        // Backlog dropped.
        assert_eq!(clock.accumulate(0.0), 0);
    }

    #[test]
    fn test_zero_hz_is_clamped() {
        let clock = FixedStepClock::new(0);
        assert_eq!(clock.fixed_dt(), 1.0);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut clock = FixedStepClock::new(60);
        assert_eq!(clock.accumulate(-1.0), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }
}
