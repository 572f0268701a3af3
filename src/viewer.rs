//! Windowed and headless hosts for a [`Scene`].
//!
//! The viewer plays the part of the host application: it mounts the scene,
//! drives frames from the event loop, feeds the status line and, optionally,
//! simulates a backend poller that reports progress on a fixed interval.
//!
//! # Example
//!
//! ```ignore
//! use pulsefield::Viewer;
//!
//! Viewer::new()
//!     .with_particle_count(20_000)
//!     .with_progress_ramp(60.0)
//!     .with_poll_interval(5.0)
//!     .run()?;
//! ```

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{ElementState, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::config::FieldConfig;
use crate::cpu::{CpuRenderer, Headless};
use crate::error::SceneError;
use crate::gpu::GpuRenderer;
use crate::scene::{FrameRenderer, Scene, SceneHandle, SceneSnapshot};
use crate::status::StatusController;

/// Frames per second assumed by the headless driver.
const HEADLESS_FPS: u32 = 30;

/// How often the placeholder glyph is refreshed when the scene fell back.
const FALLBACK_TICK: Duration = Duration::from_millis(120);

/// Glyphs cycled by the no-GPU placeholder.
const PLACEHOLDER_GLYPHS: [char; 4] = ['·', '•', '●', '•'];

/// Negative or NaN seconds become zero; values too large for a `Duration`
/// saturate.
fn secs_to_duration(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Simulated backend progress: a linear ramp sampled by a poller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRamp {
    /// Time for progress to go from 0 to 1.
    pub duration: Duration,
    /// Interval between polls.
    pub poll: Duration,
}

impl ProgressRamp {
    /// Progress the poller would have last reported at `elapsed`.
    pub fn sample(&self, elapsed: Duration) -> f32 {
        let duration = self.duration.as_secs_f32();
        if duration <= 0.0 {
            return 1.0;
        }
        let polled = if self.poll.is_zero() {
            elapsed.as_secs_f32()
        } else {
            let polls = (elapsed.as_secs_f32() / self.poll.as_secs_f32()).floor();
            polls * self.poll.as_secs_f32()
        };
        (polled / duration).clamp(0.0, 1.0)
    }

    /// Spawn a poller thread writing into `handle`. It exits once progress
    /// reaches 1 or the returned sender is dropped.
    pub fn spawn(self, handle: SceneHandle) -> mpsc::Sender<()> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let start = Instant::now();
        thread::spawn(move || loop {
            let progress = self.sample(start.elapsed());
            handle.set_progress(progress);
            tracing::debug!(progress, "polled progress");
            if progress >= 1.0 {
                break;
            }
            let wait = if self.poll.is_zero() { Duration::from_millis(16) } else { self.poll };
            match stop_rx.recv_timeout(wait) {
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        });
        stop_tx
    }
}

/// One step of a headless run.
pub struct HeadlessFrame<'a> {
    pub index: u32,
    pub snapshot: SceneSnapshot,
    pub status: &'a StatusController,
    pub renderer: &'a CpuRenderer,
}

/// Builder and runner for a pulsefield window.
pub struct Viewer {
    particle_count: u32,
    config: FieldConfig,
    title: String,
    size: (u32, u32),
    ramp: Option<ProgressRamp>,
    poll: Duration,
    reduced_motion: bool,
    seed: Option<u64>,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            particle_count: 20_000,
            config: FieldConfig::default(),
            title: "pulsefield".to_string(),
            size: (960, 720),
            ramp: None,
            poll: Duration::from_secs(5),
            reduced_motion: false,
            seed: None,
        }
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Simulate a backend whose progress goes from 0 to 1 over `secs`.
    /// Without a ramp the scene stays in ambient idle mode.
    pub fn with_progress_ramp(mut self, secs: f32) -> Self {
        let duration = secs_to_duration(secs);
        self.ramp = Some(ProgressRamp {
            duration,
            poll: self.poll,
        });
        self
    }

    /// How often the simulated backend is polled.
    pub fn with_poll_interval(mut self, secs: f32) -> Self {
        self.poll = secs_to_duration(secs);
        if let Some(ramp) = &mut self.ramp {
            ramp.poll = self.poll;
        }
        self
    }

    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    /// Fixed seed for geometry and typing delays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn status_controller(&self) -> StatusController {
        let status = StatusController::new(None, self.config.status.clone());
        let status = match self.seed {
            Some(seed) => status.with_seed(seed),
            None => status,
        };
        status.with_reduced_motion(self.reduced_motion)
    }

    fn scene<R: FrameRenderer>(&self) -> Scene<R> {
        let scene = Scene::new(self.particle_count, self.config.clone());
        let scene = match self.seed {
            Some(seed) => scene.with_seed(seed),
            None => scene,
        };
        scene.set_reduced_motion(self.reduced_motion);
        scene
    }

    /// Open a window and run until it is closed.
    pub fn run(self) -> Result<(), SceneError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            scene: self.scene(),
            status: self.status_controller(),
            window: None,
            poller: None,
            title: self.title.clone(),
            last_title: String::new(),
            last_tick: Instant::now(),
            started: Instant::now(),
            error: None,
            viewer: self,
        };
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Render `frames` frames off-screen at a fixed frame rate, calling
    /// `on_frame` after each one. Progress follows the ramp in simulated time.
    pub fn run_headless<F>(
        self,
        frames: u32,
        cols: u32,
        rows: u32,
        mut on_frame: F,
    ) -> Result<(), SceneError>
    where
        F: FnMut(&HeadlessFrame<'_>),
    {
        let mut scene: Scene<CpuRenderer> = self.scene();
        let mut status = self.status_controller();
        scene.mount(&Headless::new(cols, rows))?;

        let start = Instant::now();
        let dt = Duration::from_secs(1) / HEADLESS_FPS;
        for index in 0..frames {
            let elapsed = dt * (index + 1);
            if let Some(ramp) = &self.ramp {
                scene.set_progress(ramp.sample(elapsed));
            }
            scene.frame(start + elapsed);
            status.set_progress(scene.handle().progress());
            status.advance(dt);

            if let Some(renderer) = scene.renderer() {
                on_frame(&HeadlessFrame {
                    index,
                    snapshot: scene.snapshot(),
                    status: &status,
                    renderer,
                });
            }
        }

        status.stop();
        scene.unmount();
        Ok(())
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    viewer: Viewer,
    scene: Scene<GpuRenderer>,
    status: StatusController,
    window: Option<Arc<Window>>,
    poller: Option<mpsc::Sender<()>>,
    title: String,
    last_title: String,
    last_tick: Instant,
    started: Instant,
    error: Option<SceneError>,
}

impl App {
    fn update_title(&mut self, now: Instant) {
        let Some(window) = &self.window else {
            return;
        };
        let line = self.status.render_line();
        let title = if self.scene.fallback().is_some() {
            let step = (now.duration_since(self.started).as_millis() / FALLBACK_TICK.as_millis())
                as usize;
            let glyph = PLACEHOLDER_GLYPHS[step % PLACEHOLDER_GLYPHS.len()];
            format!("{} {} {}", self.title, glyph, line)
        } else {
            format!("{} | {}", self.title, line)
        };
        if title != self.last_title {
            window.set_title(&title);
            self.last_title = title;
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.poller = None;
        self.status.stop();
        self.scene.unmount();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let (width, height) = self.viewer.size;
        let window_attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        if let Err(e) = self.scene.mount(&window) {
            tracing::warn!(error = %e, "showing placeholder instead of the field");
        }
        if let Some(ramp) = self.viewer.ramp {
            self.poller = Some(ramp.spawn(self.scene.handle()));
        }
        self.last_tick = Instant::now();
        self.started = self.last_tick;
        window.request_redraw();
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let StartCause::ResumeTimeReached { .. } = cause {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(physical_size) => {
                self.scene.resize(physical_size.width, physical_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => self.shutdown(event_loop),
                    Key::Character("r") | Key::Character("R") => {
                        let reduced = !self.scene.handle().reduced_motion();
                        self.scene.set_reduced_motion(reduced);
                        self.status.set_reduced_motion(reduced);
                        tracing::info!(reduced, "reduced motion toggled");
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_tick);
                self.last_tick = now;

                self.scene.frame(now);
                self.status.set_progress(self.scene.handle().progress());
                self.status.advance(dt);
                self.update_title(now);

                if self.scene.wants_frame() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                } else {
                    event_loop.set_control_flow(ControlFlow::WaitUntil(now + FALLBACK_TICK));
                }
            }
            _ => {}
        }
    }
}
