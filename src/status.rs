//! Typewriter status line shown next to the field.
//!
//! The controller runs in one of two modes:
//!
//! - **Controlled**: progress is known, and the phrase is a fixed function of
//!   it ([`message_index_for`]). A change of phrase restarts the typewriter;
//!   nothing advances on its own.
//! - **Free-running**: progress is unknown, so phrases rotate on a timer,
//!   with a short fade out and in around each swap.
//!
//! Time only moves through [`StatusController::advance`], so the host can
//! drive it from its frame loop and tests can drive it step by step.
//!
//! # Example
//!
//! ```ignore
//! use pulsefield::status::{StatusController, StatusTiming};
//! use std::time::Duration;
//!
//! let mut status = StatusController::new(Some(0.3), StatusTiming::default());
//! status.advance(Duration::from_secs(2));
//! assert_eq!(status.displayed_text(), "Checking risk factors");
//! ```

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Phrases in display order.
pub const STATUS_MESSAGES: [&str; 5] = [
    "Analyzing documents",
    "Checking risk factors",
    "Computing signals",
    "Validating assumptions",
    "Finalizing analysis",
];

/// Upper edges of the progress bands for the first four phrases.
const BAND_EDGES: [f32; 4] = [0.25, 0.5, 0.75, 0.92];

/// Glyph appended while the line is animating.
pub const CURSOR_GLYPH: char = '▍';

/// Index into [`STATUS_MESSAGES`] for a progress value. Out-of-range input is
/// clamped; NaN maps to the first phrase.
pub fn message_index_for(progress: f32) -> usize {
    let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    BAND_EDGES
        .iter()
        .position(|&edge| p < edge)
        .unwrap_or(STATUS_MESSAGES.len() - 1)
}

/// Typewriter and rotation timings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTiming {
    pub char_delay_min_ms: u64,
    pub char_delay_max_ms: u64,
    /// Hold after a phrase finishes typing, free-running mode only.
    pub dwell_ms: u64,
    /// Length of each half of the fade pulse.
    pub fade_ms: u64,
}

impl Default for StatusTiming {
    fn default() -> Self {
        Self {
            char_delay_min_ms: 25,
            char_delay_max_ms: 45,
            dwell_ms: 2200,
            fade_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode {
    Controlled,
    FreeRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    /// Revealing characters.
    Typing,
    /// Full phrase shown.
    Holding,
    /// Line hidden before the swap.
    FadeOut,
    /// Next phrase selected, line visible again, typing not yet started.
    FadeIn,
    /// [`StatusController::stop`] was called.
    Stopped,
}

/// Status line state machine.
#[derive(Debug, Clone)]
pub struct StatusController {
    timing: StatusTiming,
    progress: Option<f32>,
    reduced_motion: bool,
    index: usize,
    /// Characters of the current phrase shown so far.
    revealed: usize,
    visible: bool,
    phase: StatusPhase,
    now: Duration,
    deadline: Option<Duration>,
    rng: SmallRng,
}

impl StatusController {
    /// Start a controller. `Some(progress)` selects controlled mode.
    pub fn new(progress: Option<f32>, timing: StatusTiming) -> Self {
        let progress = sanitize(progress);
        let mut status = Self {
            timing,
            progress,
            reduced_motion: false,
            index: progress.map(message_index_for).unwrap_or(0),
            revealed: 0,
            visible: true,
            phase: StatusPhase::Typing,
            now: Duration::ZERO,
            deadline: None,
            rng: SmallRng::from_entropy(),
        };
        status.start_typing(Duration::ZERO);
        status
    }

    /// Replace the delay RNG with a seeded one, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Start with reduced motion already on.
    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.set_reduced_motion(reduced);
        self
    }

    /// Report new progress, or `None` to switch to free-running mode.
    pub fn set_progress(&mut self, progress: Option<f32>) {
        if self.phase == StatusPhase::Stopped {
            return;
        }
        let progress = sanitize(progress);
        let was_controlled = self.progress.is_some();
        self.progress = progress;

        match progress {
            Some(p) => {
                let index = message_index_for(p);
                if index != self.index || !was_controlled {
                    self.index = index;
                    self.start_typing(self.now);
                }
            }
            None if was_controlled && self.phase == StatusPhase::Holding => {
                self.deadline = Some(self.now + ms(self.timing.dwell_ms));
            }
            None => {}
        }
    }

    /// Toggle reduced motion. Turning it on completes any reveal in progress
    /// and cuts short a running fade.
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if self.phase == StatusPhase::Stopped || self.reduced_motion == reduced {
            return;
        }
        self.reduced_motion = reduced;
        if !reduced {
            return;
        }
        match self.phase {
            StatusPhase::Typing | StatusPhase::FadeIn => self.start_typing(self.now),
            StatusPhase::FadeOut => {
                self.index = (self.index + 1) % STATUS_MESSAGES.len();
                self.start_typing(self.now);
            }
            StatusPhase::Holding | StatusPhase::Stopped => {}
        }
    }

    /// Move the controller's clock forward, firing every deadline that falls
    /// within `dt` in order.
    pub fn advance(&mut self, dt: Duration) {
        if self.phase == StatusPhase::Stopped {
            return;
        }
        self.now += dt;
        while let Some(at) = self.deadline {
            if at > self.now {
                break;
            }
            self.deadline = None;
            self.fire(at);
        }
    }

    /// Cancel all pending work. Nothing changes after this.
    pub fn stop(&mut self) {
        self.phase = StatusPhase::Stopped;
        self.deadline = None;
    }

    pub fn mode(&self) -> StatusMode {
        if self.progress.is_some() {
            StatusMode::Controlled
        } else {
            StatusMode::FreeRunning
        }
    }

    pub fn phase(&self) -> StatusPhase {
        self.phase
    }

    pub fn message_index(&self) -> usize {
        self.index
    }

    /// Full text of the current phrase.
    pub fn message(&self) -> &'static str {
        STATUS_MESSAGES[self.index]
    }

    /// Prefix of the current phrase revealed so far.
    pub fn displayed_text(&self) -> &'static str {
        let message = self.message();
        let end = message
            .char_indices()
            .nth(self.revealed)
            .map(|(i, _)| i)
            .unwrap_or(message.len());
        &message[..end]
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show_cursor(&self) -> bool {
        !self.reduced_motion
    }

    /// Text as it should appear on screen, cursor included. Empty while the
    /// line is faded out.
    pub fn render_line(&self) -> String {
        if !self.visible {
            return String::new();
        }
        let mut line = self.displayed_text().to_string();
        if self.show_cursor() {
            line.push(CURSOR_GLYPH);
        }
        line
    }

    fn char_delay(&mut self) -> Duration {
        let lo = self.timing.char_delay_min_ms;
        let hi = self.timing.char_delay_max_ms.max(lo);
        ms(self.rng.gen_range(lo..=hi))
    }

    fn start_typing(&mut self, at: Duration) {
        self.visible = true;
        if self.reduced_motion {
            self.revealed = self.message().chars().count();
            self.finish_typing(at);
            return;
        }
        self.revealed = 0;
        self.phase = StatusPhase::Typing;
        self.deadline = Some(at + self.char_delay());
    }

    fn finish_typing(&mut self, at: Duration) {
        self.phase = StatusPhase::Holding;
        self.deadline = match self.mode() {
            StatusMode::FreeRunning => Some(at + ms(self.timing.dwell_ms)),
            StatusMode::Controlled => None,
        };
    }

    fn fire(&mut self, at: Duration) {
        match self.phase {
            StatusPhase::Typing => {
                self.revealed += 1;
                if self.revealed >= self.message().chars().count() {
                    self.finish_typing(at);
                } else {
                    self.deadline = Some(at + self.char_delay());
                }
            }
            StatusPhase::Holding => {
                if self.reduced_motion {
                    self.index = (self.index + 1) % STATUS_MESSAGES.len();
                    self.start_typing(at);
                } else {
                    self.phase = StatusPhase::FadeOut;
                    self.visible = false;
                    self.deadline = Some(at + ms(self.timing.fade_ms));
                }
            }
            StatusPhase::FadeOut => {
                self.index = (self.index + 1) % STATUS_MESSAGES.len();
                self.revealed = 0;
                self.visible = true;
                self.phase = StatusPhase::FadeIn;
                self.deadline = Some(at + ms(self.timing.fade_ms));
            }
            StatusPhase::FadeIn => self.start_typing(at),
            StatusPhase::Stopped => {}
        }
    }
}

fn sanitize(progress: Option<f32>) -> Option<f32> {
    progress.filter(|p| !p.is_nan()).map(|p| p.clamp(0.0, 1.0))
}

/// Scheduling step. Never zero, so a deadline always lies ahead of the one
/// that scheduled it.
fn ms(v: u64) -> Duration {
    Duration::from_millis(v.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(progress: Option<f32>) -> StatusController {
        StatusController::new(progress, StatusTiming::default()).with_seed(42)
    }

    /// Enough time to type the longest phrase at the slowest delay.
    fn full_reveal() -> Duration {
        let longest = STATUS_MESSAGES.iter().map(|m| m.len()).max().unwrap_or(0) as u64;
        ms(longest * StatusTiming::default().char_delay_max_ms)
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(message_index_for(0.0), 0);
        assert_eq!(message_index_for(0.2499), 0);
        assert_eq!(message_index_for(0.25), 1);
        assert_eq!(message_index_for(0.4999), 1);
        assert_eq!(message_index_for(0.5), 2);
        assert_eq!(message_index_for(0.75), 3);
        assert_eq!(message_index_for(0.9199), 3);
        assert_eq!(message_index_for(0.92), 4);
        assert_eq!(message_index_for(1.0), 4);
    }

    #[test]
    fn test_band_clamps_input() {
        assert_eq!(message_index_for(-3.0), 0);
        assert_eq!(message_index_for(7.0), 4);
        assert_eq!(message_index_for(f32::NAN), 0);
    }

    #[test]
    fn test_typewriter_reveals_one_char_at_a_time() {
        let mut status = controller(Some(0.0));
        assert_eq!(status.displayed_text(), "");
        status.advance(ms(24));
        assert_eq!(status.displayed_text(), "");
        status.advance(ms(21));
        assert_eq!(status.displayed_text(), "A");
        status.advance(full_reveal());
        assert_eq!(status.displayed_text(), "Analyzing documents");
        assert_eq!(status.phase(), StatusPhase::Holding);
    }

    #[test]
    fn test_controlled_never_auto_advances() {
        let mut status = controller(Some(0.6));
        for _ in 0..600 {
            status.advance(ms(100));
            assert!(status.is_visible());
        }
        assert_eq!(status.message(), "Computing signals");
        assert_eq!(status.displayed_text(), "Computing signals");
    }

    #[test]
    fn test_progress_change_restarts_typing() {
        let mut status = controller(Some(0.1));
        status.advance(full_reveal());
        status.set_progress(Some(0.3));
        assert_eq!(status.message(), "Checking risk factors");
        assert_eq!(status.displayed_text(), "");
        assert_eq!(status.phase(), StatusPhase::Typing);

        // Same band: no restart.
        status.advance(full_reveal());
        status.set_progress(Some(0.4));
        assert_eq!(status.displayed_text(), "Checking risk factors");
    }

    #[test]
    fn test_free_running_cycle() {
        let timing = StatusTiming::default();
        let mut status = controller(None);
        assert_eq!(status.mode(), StatusMode::FreeRunning);
        status.advance(full_reveal());
        assert_eq!(status.phase(), StatusPhase::Holding);

        // The hold started somewhere inside the reveal window; stepping in
        // 10ms increments catches each phase change.
        let mut saw_hidden = false;
        for _ in 0..(timing.dwell_ms + 2 * timing.fade_ms) / 10 + 5 {
            status.advance(ms(10));
            if !status.is_visible() {
                saw_hidden = true;
                assert_eq!(status.phase(), StatusPhase::FadeOut);
                assert_eq!(status.render_line(), "");
            }
            if status.message_index() == 1 {
                break;
            }
        }
        assert!(saw_hidden);
        assert_eq!(status.message_index(), 1);
        assert!(status.is_visible());
    }

    #[test]
    fn test_free_running_wraps() {
        let mut status = controller(None);
        let mut seen = vec![status.message_index()];
        for _ in 0..2_000 {
            status.advance(ms(20));
            if *seen.last().unwrap() != status.message_index() {
                seen.push(status.message_index());
            }
            if seen.len() == 7 {
                break;
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 0, 1]);
    }

    #[test]
    fn test_reduced_motion_is_instant() {
        let mut status = controller(Some(0.8)).with_reduced_motion(true);
        assert_eq!(status.displayed_text(), "Validating assumptions");
        assert!(!status.show_cursor());
        assert_eq!(status.render_line(), "Validating assumptions");

        status.set_progress(Some(0.95));
        assert_eq!(status.displayed_text(), "Finalizing analysis");
    }

    #[test]
    fn test_reduced_motion_cycles_without_fade() {
        let mut status = controller(None).with_reduced_motion(true);
        assert_eq!(status.displayed_text(), STATUS_MESSAGES[0]);
        for _ in 0..250 {
            status.advance(ms(10));
            assert!(status.is_visible());
        }
        assert_eq!(status.message_index(), 1);
        assert_eq!(status.displayed_text(), STATUS_MESSAGES[1]);
    }

    #[test]
    fn test_cursor_appended_while_animating() {
        let mut status = controller(Some(0.0));
        status.advance(full_reveal());
        assert_eq!(status.render_line(), format!("Analyzing documents{}", CURSOR_GLYPH));
    }

    #[test]
    fn test_stop_cancels_everything() {
        let mut status = controller(None);
        status.advance(ms(100));
        let text = status.displayed_text();
        status.stop();
        status.advance(Duration::from_secs(30));
        status.set_progress(Some(0.99));
        status.set_reduced_motion(true);
        assert_eq!(status.phase(), StatusPhase::Stopped);
        assert_eq!(status.displayed_text(), text);
        assert_eq!(status.message_index(), 0);
    }

    #[test]
    fn test_switch_to_free_running_schedules_rotation() {
        let mut status = controller(Some(0.1));
        status.advance(full_reveal());
        status.set_progress(None);
        status.advance(ms(StatusTiming::default().dwell_ms + 1));
        assert_eq!(status.phase(), StatusPhase::FadeOut);
    }

    #[test]
    fn test_zero_timing_still_makes_progress() {
        let timing = StatusTiming {
            char_delay_min_ms: 0,
            char_delay_max_ms: 0,
            dwell_ms: 0,
            fade_ms: 0,
        };
        let mut status = StatusController::new(None, timing).with_seed(1);
        status.advance(ms(16));
        assert_eq!(status.displayed_text().chars().count(), 16);

        let start = status.message_index();
        status.advance(ms(25));
        assert_ne!(status.message_index(), start);
    }
}
