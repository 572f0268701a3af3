//! Scene controller: owns the point cloud, the clock and a renderer.
//!
//! A scene moves through `Unmounted → Mounting → Running → Unmounted`.
//! Mounting generates geometry and seeds, asks the [`RenderTarget`] for a
//! renderer and starts the clock. The host then calls [`Scene::frame`] from
//! its animation-frame callback until it calls [`Scene::unmount`].
//!
//! Progress and the reduced-motion flag are written through a
//! [`SceneHandle`], which any thread may hold. Each frame reads both values
//! exactly once. Reported progress arrives in coarse poll steps, so the
//! scene eases a displayed value toward it and derives the stage gates from
//! that.
//!
//! When no drawing context can be created, or the context is lost later, the
//! scene records a [`Fallback`] and stops rendering. The host is expected to
//! show a static placeholder instead; nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! use pulsefield::cpu::Headless;
//! use pulsefield::{FieldConfig, Scene};
//! use std::time::Instant;
//!
//! let mut scene = Scene::new(20_000, FieldConfig::default());
//! scene.mount(&Headless::new(80, 40))?;
//!
//! let handle = scene.handle();
//! std::thread::spawn(move || handle.set_progress(0.4));
//!
//! scene.frame(Instant::now());
//! scene.unmount();
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::activation::{ActivationModel, StageGates};
use crate::camera::{CameraPose, DriftCamera};
use crate::config::FieldConfig;
use crate::error::{GpuError, RenderError, SceneError};
use crate::geometry::{generate_points, PointCloud, MAX_POINTS};
use crate::seeds::{generate_seeds, ActivationSeed};
use crate::time::FrameClock;

/// Immutable data generated at mount and shared with the renderer.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub cloud: PointCloud,
    pub seeds: Vec<ActivationSeed>,
    pub config: FieldConfig,
}

impl SceneAssets {
    pub fn generate<R: Rng>(particle_count: u32, config: FieldConfig, rng: &mut R) -> Self {
        let cloud = generate_points(particle_count, &config.volume, rng);
        let seeds = generate_seeds(config.seeds.count, &config.seeds, &config.volume, rng);
        Self { cloud, seeds, config }
    }

    /// CPU activation model over these assets.
    pub fn model(&self) -> ActivationModel<'_> {
        ActivationModel {
            seeds: &self.seeds,
            drift: &self.config.drift,
            shading: &self.config.shading,
            palette: &self.config.palette,
            stages: &self.config.reveal,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub assets: &'a SceneAssets,
    /// Seconds since mount.
    pub elapsed: f32,
    /// Clamped progress as last reported, or `None` in ambient idle mode.
    pub progress: Option<f32>,
    /// Eased progress the gates were computed from.
    pub displayed_progress: Option<f32>,
    pub gates: StageGates,
    pub camera: CameraPose,
    pub reduced_motion: bool,
}

/// Whether a renderer actually put a frame on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    Drawn,
    /// Transient surface condition; try again next frame.
    Skipped,
}

/// A live drawing context bound to one surface.
pub trait FrameRenderer {
    fn resize(&mut self, width: u32, height: u32);

    /// Draw one frame. An error means the context is gone for good.
    fn render(&mut self, frame: &FrameInput<'_>) -> Result<Presented, RenderError>;
}

/// Something a scene can mount on.
pub trait RenderTarget {
    type Renderer: FrameRenderer;

    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Acquire a drawing context and upload `assets` to it.
    fn create_renderer(&self, assets: &SceneAssets) -> Result<Self::Renderer, GpuError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Unmounted,
    Mounting,
    Running,
}

/// Result of one call to [`Scene::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    Skipped,
    /// Not mounted; nothing to do.
    Idle,
    /// The context was lost during this frame and the scene was torn down.
    Degraded,
}

/// Why the scene is showing its fallback instead of rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// No drawing context could be created at mount.
    Unsupported(String),
    /// The configuration was rejected at mount.
    InvalidConfig(String),
    /// The context was lost while running.
    ContextLost(RenderError),
}

/// Sentinel bit pattern for "no progress reported".
const NO_PROGRESS: u32 = 0x7fc0_0000; // f32::NAN

#[derive(Debug)]
struct SharedInputs {
    progress: AtomicU32,
    reduced_motion: AtomicBool,
}

/// Thread-safe writer for a scene's external inputs.
///
/// Writes never block and the last write wins.
#[derive(Debug, Clone)]
pub struct SceneHandle {
    inner: Arc<SharedInputs>,
}

impl SceneHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new(SharedInputs {
                progress: AtomicU32::new(NO_PROGRESS),
                reduced_motion: AtomicBool::new(false),
            }),
        }
    }

    /// Report progress. Values are clamped to [0, 1]; NaN counts as 0.
    pub fn set_progress(&self, progress: f32) {
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        self.inner.progress.store(p.to_bits(), Ordering::Release);
    }

    /// Return to ambient idle mode.
    pub fn clear_progress(&self) {
        self.inner.progress.store(NO_PROGRESS, Ordering::Release);
    }

    pub fn progress(&self) -> Option<f32> {
        let p = f32::from_bits(self.inner.progress.load(Ordering::Acquire));
        (!p.is_nan()).then_some(p)
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.inner.reduced_motion.store(reduced, Ordering::Release);
    }

    pub fn reduced_motion(&self) -> bool {
        self.inner.reduced_motion.load(Ordering::Acquire)
    }
}

/// Point-in-time view of a scene, for status displays and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub state: SceneState,
    pub elapsed: f32,
    pub frames: u64,
    pub fps: f32,
    pub progress: Option<f32>,
    pub displayed_progress: Option<f32>,
    pub reduced_motion: bool,
    pub point_count: usize,
    pub seed_count: usize,
    pub camera_position: Vec3,
    pub fallback: Option<Fallback>,
}

/// Progress-linked point field bound to one render target at a time.
pub struct Scene<R: FrameRenderer> {
    particle_count: u32,
    config: FieldConfig,
    rng_seed: Option<u64>,
    state: SceneState,
    handle: SceneHandle,
    assets: Option<SceneAssets>,
    renderer: Option<R>,
    clock: Option<FrameClock>,
    camera: DriftCamera,
    displayed_progress: Option<f32>,
    fallback: Option<Fallback>,
}

impl<R: FrameRenderer> Scene<R> {
    /// Create an unmounted scene. `particle_count` is clamped to
    /// [`MAX_POINTS`].
    pub fn new(particle_count: u32, config: FieldConfig) -> Self {
        let camera = DriftCamera::new(config.camera.clone(), 1, 1);
        Self {
            particle_count: particle_count.min(MAX_POINTS),
            config,
            rng_seed: None,
            state: SceneState::Unmounted,
            handle: SceneHandle::new(),
            assets: None,
            renderer: None,
            clock: None,
            camera,
            displayed_progress: None,
            fallback: None,
        }
    }

    /// Generate geometry from a fixed seed instead of entropy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Generated data, while mounted.
    pub fn assets(&self) -> Option<&SceneAssets> {
        self.assets.as_ref()
    }

    /// Live renderer, while mounted.
    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    /// Mount on `target`. Mounting an already running scene does nothing.
    ///
    /// On failure the scene stays unmounted and [`Scene::fallback`] reports
    /// why.
    pub fn mount<T>(&mut self, target: &T) -> Result<(), SceneError>
    where
        T: RenderTarget<Renderer = R>,
    {
        if self.state == SceneState::Running {
            tracing::debug!("mount called on a running scene, ignoring");
            return Ok(());
        }
        self.fallback = None;
        if let Err(e) = self.config.validate() {
            tracing::warn!(error = %e, "invalid field config, falling back to placeholder");
            self.fallback = Some(Fallback::InvalidConfig(e.to_string()));
            return Err(SceneError::Config(e));
        }
        self.state = SceneState::Mounting;

        let mut rng = match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let assets = SceneAssets::generate(self.particle_count, self.config.clone(), &mut rng);

        let renderer = match target.create_renderer(&assets) {
            Ok(renderer) => renderer,
            Err(e) => {
                tracing::warn!(error = %e, "no drawing context, falling back to placeholder");
                self.fallback = Some(Fallback::Unsupported(e.to_string()));
                self.state = SceneState::Unmounted;
                return Err(SceneError::Unsupported(e));
            }
        };

        let (width, height) = target.size();
        self.camera = DriftCamera::new(self.config.camera.clone(), width, height);
        tracing::info!(
            points = assets.cloud.len(),
            seeds = assets.seeds.len(),
            width,
            height,
            "scene mounted"
        );

        self.assets = Some(assets);
        self.renderer = Some(renderer);
        self.clock = Some(FrameClock::new(Instant::now()));
        self.state = SceneState::Running;
        Ok(())
    }

    /// Advance to `now` and draw one frame.
    pub fn frame(&mut self, now: Instant) -> FrameOutcome {
        if self.state != SceneState::Running {
            return FrameOutcome::Idle;
        }
        let (Some(assets), Some(renderer), Some(clock)) =
            (&self.assets, &mut self.renderer, &mut self.clock)
        else {
            return FrameOutcome::Idle;
        };

        let (elapsed, delta) = clock.tick(now);
        let progress = self.handle.progress();
        let reduced_motion = self.handle.reduced_motion();

        let reveal = &assets.config.reveal;
        let displayed =
            ease_toward(self.displayed_progress, progress, delta, reveal.progress_ease_secs);
        self.displayed_progress = displayed;

        self.camera.update(elapsed, reduced_motion);
        let input = FrameInput {
            assets,
            elapsed,
            progress,
            displayed_progress: displayed,
            gates: StageGates::for_progress(displayed, reveal),
            camera: self.camera.pose(),
            reduced_motion,
        };

        match renderer.render(&input) {
            Ok(Presented::Drawn) => FrameOutcome::Rendered,
            Ok(Presented::Skipped) => FrameOutcome::Skipped,
            Err(e) => {
                tracing::warn!(error = %e, "drawing context lost, tearing scene down");
                self.teardown();
                self.fallback = Some(Fallback::ContextLost(e));
                FrameOutcome::Degraded
            }
        }
    }

    /// Resize the drawable. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_viewport(width, height);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(width, height);
            tracing::debug!(width, height, "scene resized");
        }
    }

    pub fn set_progress(&self, progress: f32) {
        self.handle.set_progress(progress);
    }

    pub fn clear_progress(&self) {
        self.handle.clear_progress();
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.handle.set_reduced_motion(reduced);
    }

    /// Writer for progress and reduced motion that can cross threads.
    pub fn handle(&self) -> SceneHandle {
        self.handle.clone()
    }

    /// Stop rendering and release the renderer and generated data. Safe to
    /// call at any time, any number of times.
    pub fn unmount(&mut self) {
        if self.state == SceneState::Unmounted && self.renderer.is_none() {
            return;
        }
        self.teardown();
        tracing::info!("scene unmounted");
    }

    /// Whether the host should keep scheduling frames.
    pub fn wants_frame(&self) -> bool {
        self.state == SceneState::Running
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        self.fallback.as_ref()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            state: self.state,
            elapsed: self.clock.as_ref().map_or(0.0, FrameClock::elapsed),
            frames: self.clock.as_ref().map_or(0, FrameClock::frame),
            fps: self.clock.as_ref().map_or(0.0, FrameClock::fps),
            progress: self.handle.progress(),
            displayed_progress: self.displayed_progress,
            reduced_motion: self.handle.reduced_motion(),
            point_count: self.assets.as_ref().map_or(0, |a| a.cloud.len()),
            seed_count: self.assets.as_ref().map_or(0, |a| a.seeds.len()),
            camera_position: self.camera.position(),
            fallback: self.fallback.clone(),
        }
    }

    fn teardown(&mut self) {
        self.renderer = None;
        self.assets = None;
        self.clock = None;
        self.displayed_progress = None;
        self.state = SceneState::Unmounted;
    }
}

/// Exponential approach of the displayed progress to the reported one, with
/// time constant `ease_secs`. The first report, a switch to ambient mode and
/// a zero time constant all take the target as is.
fn ease_toward(shown: Option<f32>, target: Option<f32>, dt: f32, ease_secs: f32) -> Option<f32> {
    match (shown, target) {
        (Some(from), Some(to)) if ease_secs > 0.0 => {
            let k = 1.0 - (-dt / ease_secs).exp();
            Some(from + (to - from) * k)
        }
        _ => target,
    }
}

impl<R: FrameRenderer> Drop for Scene<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct NullRenderer;

    impl FrameRenderer for NullRenderer {
        fn resize(&mut self, _width: u32, _height: u32) {}

        fn render(&mut self, _frame: &FrameInput<'_>) -> Result<Presented, RenderError> {
            Ok(Presented::Drawn)
        }
    }

    struct NullTarget {
        available: bool,
    }

    impl RenderTarget for NullTarget {
        type Renderer = NullRenderer;

        fn size(&self) -> (u32, u32) {
            (320, 200)
        }

        fn create_renderer(&self, _assets: &SceneAssets) -> Result<NullRenderer, GpuError> {
            if self.available {
                Ok(NullRenderer)
            } else {
                Err(GpuError::NoAdapter)
            }
        }
    }

    fn scene() -> Scene<NullRenderer> {
        Scene::new(500, FieldConfig::default()).with_seed(9)
    }

    #[test]
    fn test_particle_count_clamped() {
        let scene: Scene<NullRenderer> = Scene::new(MAX_POINTS * 2, FieldConfig::default());
        assert_eq!(scene.particle_count(), MAX_POINTS);
    }

    #[test]
    fn test_handle_clamps_progress() {
        let scene = scene();
        let handle = scene.handle();
        assert_eq!(handle.progress(), None);
        handle.set_progress(1.5);
        assert_eq!(handle.progress(), Some(1.0));
        handle.set_progress(-0.25);
        assert_eq!(handle.progress(), Some(0.0));
        handle.set_progress(f32::NAN);
        assert_eq!(handle.progress(), Some(0.0));
        handle.clear_progress();
        assert_eq!(handle.progress(), None);
    }

    #[test]
    fn test_mount_frame_unmount() {
        let mut scene = scene();
        let start = Instant::now();
        assert_eq!(scene.frame(start), FrameOutcome::Idle);

        scene.mount(&NullTarget { available: true }).unwrap();
        assert_eq!(scene.state(), SceneState::Running);
        assert!(scene.wants_frame());
        assert_eq!(scene.snapshot().point_count, 500);

        assert_eq!(scene.frame(start + Duration::from_millis(16)), FrameOutcome::Rendered);
        scene.unmount();
        scene.unmount();
        assert!(!scene.wants_frame());
        assert!(scene.assets().is_none());
        assert_eq!(scene.frame(start + Duration::from_millis(32)), FrameOutcome::Idle);
    }

    #[test]
    fn test_unmount_before_mount_is_safe() {
        let mut scene = scene();
        scene.unmount();
        assert_eq!(scene.state(), SceneState::Unmounted);
    }

    #[test]
    fn test_unsupported_mount_records_fallback() {
        let mut scene = scene();
        let err = scene.mount(&NullTarget { available: false }).unwrap_err();
        assert!(matches!(err, SceneError::Unsupported(GpuError::NoAdapter)));
        assert_eq!(scene.state(), SceneState::Unmounted);
        assert!(matches!(scene.fallback(), Some(Fallback::Unsupported(_))));
        assert_eq!(scene.frame(Instant::now()), FrameOutcome::Idle);
    }

    #[test]
    fn test_same_seed_same_assets() {
        let mut a = scene();
        let mut b = scene();
        a.mount(&NullTarget { available: true }).unwrap();
        b.mount(&NullTarget { available: true }).unwrap();
        let (a, b) = (a.assets().unwrap(), b.assets().unwrap());
        assert_eq!(a.cloud.positions(), b.cloud.positions());
        assert_eq!(a.seeds, b.seeds);
    }

    #[test]
    fn test_invalid_config_fails_mount() {
        let mut config = FieldConfig::default();
        config.volume.scale.y = 0.0;
        let mut scene: Scene<NullRenderer> = Scene::new(100, config);
        let err = scene.mount(&NullTarget { available: true }).unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
        assert!(matches!(scene.fallback(), Some(Fallback::InvalidConfig(_))));
        assert_eq!(scene.state(), SceneState::Unmounted);
        assert!(scene.assets().is_none());
    }

    #[test]
    fn test_ease_toward() {
        assert_eq!(ease_toward(None, Some(0.4), 0.016, 0.5), Some(0.4));
        assert_eq!(ease_toward(Some(0.4), None, 0.016, 0.5), None);
        assert_eq!(ease_toward(Some(0.1), Some(0.3), 0.016, 0.0), Some(0.3));
        assert_eq!(ease_toward(Some(0.3), Some(0.3), 0.016, 0.5), Some(0.3));

        let step = ease_toward(Some(0.1), Some(0.3), 0.016, 0.5).unwrap();
        assert!(step > 0.1 && step < 0.11, "step {}", step);
        let settled = ease_toward(Some(0.1), Some(0.3), 10.0, 0.5).unwrap();
        assert!((settled - 0.3).abs() < 1e-6);
    }
}
