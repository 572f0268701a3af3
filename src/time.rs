//! Frame clock for the scene's render loop.
//!
//! Elapsed time is monotonic from mount and feeds the drift and pulse phases.
//! The clock is driven with explicit instants so the scene can be stepped
//! deterministically in tests.
//!
//! # Example
//!
//! ```ignore
//! use pulsefield::time::FrameClock;
//! use std::time::Instant;
//!
//! let mut clock = FrameClock::new(Instant::now());
//!
//! // In your frame callback:
//! clock.tick(Instant::now());
//!
//! println!("Elapsed: {:.2}s", clock.elapsed());
//! println!("FPS: {:.1}", clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Time tracking for the render loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Mount instant.
    start: Instant,
    /// Instant of the last tick.
    last_frame: Instant,
    /// Seconds since mount (cached).
    elapsed_secs: f32,
    frame_count: u64,
    /// Frames per second, refreshed every `fps_update_interval`.
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            last_frame: start,
            elapsed_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: start,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Advance to `now`. Instants earlier than the last tick are treated as
    /// the last tick, so elapsed time never goes backwards.
    ///
    /// Returns `(elapsed, delta)` in seconds.
    pub fn tick(&mut self, now: Instant) -> (f32, f32) {
        let now = now.max(self.last_frame);

        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.elapsed_secs = now.duration_since(self.start).as_secs_f32();
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, delta)
    }

    /// Seconds since mount as of the last tick.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}
