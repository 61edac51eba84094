//! Frame clock for real-time stepping.
//!
//! Turns measured frame times into simulation timesteps. A frame is never
//! shorter than `1 / max_fps`, matching a loop that sleeps to hold a frame
//! rate cap, and simulated time runs `time_ratio` times faster than real time.

use std::collections::VecDeque;

/// Number of recent frames averaged by [`FrameClock::fps`]
pub const FPS_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct FrameClock {
    max_fps: f32,
    time_ratio: f32,
    elapsed: f32,
    recent: VecDeque<f32>,
}

impl FrameClock {
    /// `max_fps <= 0` disables the cap
    pub fn new(max_fps: f32, time_ratio: f32) -> Self {
        Self {
            max_fps,
            time_ratio,
            elapsed: 0.0,
            recent: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Record a frame that took `frame_seconds` of real time and return the
    /// simulation timestep for it
    pub fn tick(&mut self, frame_seconds: f32) -> f32 {
        let frame = frame_seconds.max(self.min_frame());
        if self.recent.len() == FPS_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(frame);

        let dt = frame * self.time_ratio;
        self.elapsed += dt;
        dt
    }

    fn min_frame(&self) -> f32 {
        if self.max_fps > 0.0 {
            1.0 / self.max_fps
        } else {
            0.0
        }
    }

    /// Average frame rate over the last [`FPS_WINDOW`] frames
    pub fn fps(&self) -> f32 {
        let total: f32 = self.recent.iter().sum();
        if total > 0.0 {
            self.recent.len() as f32 / total
        } else {
            0.0
        }
    }

    /// Simulated seconds since creation or the last reset
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn max_fps(&self) -> f32 {
        self.max_fps
    }

    pub fn time_ratio(&self) -> f32 {
        self.time_ratio
    }

    pub fn set_time_ratio(&mut self, time_ratio: f32) {
        self.time_ratio = time_ratio;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.recent.clear();
    }

    /// Window caption: `FPS: 119.85 / 120, t = 3.42s`
    pub fn caption(&self) -> String {
        format!(
            "FPS: {:.2} / {}, t = {:.2}s",
            self.fps(),
            self.max_fps,
            self.elapsed
        )
    }
}
