//! Fixed-step scheduler
//!
//! Turns irregular frame callbacks into a whole number of fixed simulation
//! steps. Leftover time carries over to the next frame.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_SECS;
use crate::settings::SimRate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedStep {
    /// Step length in seconds
    step: f64,
    accumulator: f64,
    /// Timestamp of the previous frame, `None` until the first frame after start
    last_time: Option<f64>,
    running: bool,
}

impl FixedStep {
    pub fn new(rate: SimRate) -> Self {
        Self {
            step: rate.step_secs(),
            accumulator: 0.0,
            last_time: None,
            running: false,
        }
    }

    pub fn step_secs(&self) -> f64 {
        self.step
    }

    /// Step length in milliseconds
    pub fn step_ms(&self) -> f64 {
        self.step * 1000.0
    }

    pub fn set_rate(&mut self, rate: SimRate) {
        self.step = rate.step_secs();
        self.accumulator = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin accepting frames; `now` is the current frame time in seconds
    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.accumulator = 0.0;
        self.last_time = Some(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
        self.last_time = None;
    }

    /// Feed a frame timestamp (seconds) and return how many steps to run.
    ///
    /// Elapsed time per frame is clamped to [`MAX_FRAME_SECS`] so a stalled
    /// frame cannot trigger a burst of catch-up steps.
    pub fn advance(&mut self, now: f64) -> u32 {
        if !self.running {
            return 0;
        }
        let elapsed = match self.last_time {
            Some(last) if now.is_finite() => (now - last).clamp(0.0, MAX_FRAME_SECS),
            _ => 0.0,
        };
        if now.is_finite() {
            self.last_time = Some(now);
        }
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_running_yields_nothing() {
        let mut s = FixedStep::new(SimRate::Hz30);
        assert_eq!(s.advance(1.0), 0);
        assert!(!s.is_running());
    }

    #[test]
    fn test_steps_accumulate() {
        let mut s = FixedStep::new(SimRate::Hz30);
        s.start(0.0);
        assert_eq!(s.advance(0.05), 1);
        // 0.0167 carried + 0.07
        assert_eq!(s.advance(0.12), 2);
        // 0.02 carried + 0.09
        assert_eq!(s.advance(0.21), 3);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut s = FixedStep::new(SimRate::Hz30);
        s.start(0.0);
        // 5 s stall counts as 0.25 s, which is 7.5 steps
        assert_eq!(s.advance(5.0), 7);
    }

    #[test]
    fn test_time_going_backwards() {
        let mut s = FixedStep::new(SimRate::Hz30);
        s.start(10.0);
        assert_eq!(s.advance(9.0), 0);
        assert_eq!(s.advance(f64::NAN), 0);
    }

    #[test]
    fn test_stop_clears_running() {
        let mut s = FixedStep::new(SimRate::Hz30);
        s.start(0.0);
        s.stop();
        assert!(!s.is_running());
        assert_eq!(s.advance(1.0), 0);
    }
}
