//! Frame driver.
//!
//! Two states: [`FrameState::Idle`] until the user enters, then
//! [`FrameState::Running`] for the rest of the session. Every running tick
//! performs, in this order:
//!
//! 1. advance host-side simulations (snow, camera damping)
//! 2. step the feedback simulator once
//! 3. bind the simulator's fresh output to the particle renderer
//! 4. draw
//!
//! The order is fixed here rather than left to the caller, so the draw
//! never reads a texture older than the step of the same tick.

use crate::time::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Running,
}

/// The per-tick work, split at the points the driver sequences.
pub trait FrameStage {
    fn advance_host(&mut self, elapsed: f32, delta: f32);
    fn step_simulation(&mut self, elapsed: f32, delta: f32);
    fn bind_simulation_output(&mut self);
    fn draw(&mut self, elapsed: f32);
}

#[derive(Debug, Default)]
pub struct FrameDriver {
    running: bool,
    clock: Clock,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FrameState {
        if self.running {
            FrameState::Running
        } else {
            FrameState::Idle
        }
    }

    /// Idle to Running. Returns `true` only on the call that transitions;
    /// there is no way back.
    ///
    /// Session time starts here.
    pub fn enter(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.clock.reset();
        log::info!("Entering the scene");
        true
    }

    /// Run one tick against the clock. Does nothing while idle.
    pub fn tick<S: FrameStage + ?Sized>(&mut self, stages: &mut S) -> bool {
        if !self.running {
            return false;
        }
        let (elapsed, delta) = self.clock.update();
        self.run_stages(stages, elapsed, delta);
        true
    }

    /// Run one tick with explicit times. Does nothing while idle.
    pub fn tick_with<S: FrameStage + ?Sized>(&mut self, stages: &mut S, elapsed: f32, delta: f32) -> bool {
        if !self.running {
            return false;
        }
        self.run_stages(stages, elapsed, delta);
        true
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn run_stages<S: FrameStage + ?Sized>(&mut self, stages: &mut S, elapsed: f32, delta: f32) {
        stages.advance_host(elapsed, delta);
        stages.step_simulation(elapsed, delta);
        stages.bind_simulation_output();
        stages.draw(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl FrameStage for Recorder {
        fn advance_host(&mut self, _elapsed: f32, delta: f32) {
            self.calls.push(format!("host {delta}"));
        }
        fn step_simulation(&mut self, elapsed: f32, _delta: f32) {
            self.calls.push(format!("step {elapsed}"));
        }
        fn bind_simulation_output(&mut self) {
            self.calls.push("bind".to_string());
        }
        fn draw(&mut self, _elapsed: f32) {
            self.calls.push("draw".to_string());
        }
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut driver = FrameDriver::new();
        let mut recorder = Recorder::default();
        assert!(!driver.tick(&mut recorder));
        assert!(!driver.tick_with(&mut recorder, 1.0, 0.016));
        assert!(recorder.calls.is_empty());
        assert_eq!(driver.state(), FrameState::Idle);
    }

    #[test]
    fn test_enter_once() {
        let mut driver = FrameDriver::new();
        assert!(driver.enter());
        assert!(!driver.enter());
        assert_eq!(driver.state(), FrameState::Running);
    }

    #[test]
    fn test_tick_order() {
        let mut driver = FrameDriver::new();
        let mut recorder = Recorder::default();
        driver.enter();
        driver.tick_with(&mut recorder, 2.0, 0.5);
        driver.tick_with(&mut recorder, 2.5, 0.5);
        assert_eq!(
            recorder.calls,
            ["host 0.5", "step 2", "bind", "draw", "host 0.5", "step 2.5", "bind", "draw"]
        );
    }

    #[test]
    fn test_clock_starts_on_enter() {
        let mut driver = FrameDriver::new();
        driver.clock_mut().set_fixed_delta(Some(0.25));
        let mut recorder = Recorder::default();
        driver.enter();
        driver.tick(&mut recorder);
        assert_eq!(driver.clock().elapsed(), 0.25);
        assert_eq!(recorder.calls[1], "step 0.25");
    }
}
