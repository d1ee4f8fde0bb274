//! Frame clock.
//!
//! Elapsed and delta time for the frame driver, plus a frame rate sample
//! refreshed twice a second for the window title.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = Clock::new();
//!
//! // Once per frame:
//! let (elapsed, delta) = clock.update();
//! if clock.fps_refreshed() {
//!     window.set_title(&format!("{:.0} fps", clock.fps()));
//! }
//! ```

use std::time::{Duration, Instant};

/// Monotonic session clock.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    fps_refreshed: bool,
    /// Replaces the measured delta when set.
    fixed_delta: Option<f32>,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fps_refreshed: false,
            fixed_delta: None,
        }
    }

    /// Advance to now. Call once per frame.
    ///
    /// Returns `(elapsed, delta)` in seconds. With a fixed delta, elapsed
    /// is the sum of deltas so runs are reproducible.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        match self.fixed_delta {
            Some(fixed) => {
                self.delta_secs = fixed;
                self.elapsed_secs += fixed;
            }
            None => {
                self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
                self.elapsed_secs = now.duration_since(self.start).as_secs_f32();
            }
        }
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        self.fps_refreshed = fps_elapsed >= self.fps_update_interval;
        if self.fps_refreshed {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames since start or the last reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether the last [`update`](Self::update) produced a new fps sample.
    #[inline]
    pub fn fps_refreshed(&self) -> bool {
        self.fps_refreshed
    }

    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Restart from zero.
    pub fn reset(&mut self) {
        let fixed_delta = self.fixed_delta;
        *self = Self::new();
        self.fixed_delta = fixed_delta;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_clock_update() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_fixed_delta_accumulates() {
        let mut clock = Clock::new();
        clock.set_fixed_delta(Some(0.016));

        thread::sleep(Duration::from_millis(30));
        clock.update();
        let (elapsed, delta) = clock.update();

        assert!((delta - 0.016).abs() < 1e-6);
        assert!((elapsed - 0.032).abs() < 1e-6);
    }

    #[test]
    fn test_reset_keeps_fixed_delta() {
        let mut clock = Clock::new();
        clock.set_fixed_delta(Some(0.5));
        clock.update();
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.update(), (0.5, 0.5));
    }
}
