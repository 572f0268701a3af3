//! # pulsefield
//!
//! A progress-linked "analysis in progress" animation: a GPU point cloud
//! shaped like an organic volume, lit by pulsing seed sources and revealed
//! step by step as an external progress value rises. A companion status line
//! types out what the analysis is doing.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pulsefield::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     Viewer::new()
//!         .with_particle_count(20_000)
//!         .with_progress_ramp(60.0)
//!         .run()
//! }
//! ```
//!
//! ## Embedding
//!
//! A host that owns its own event loop drives a [`Scene`] directly:
//!
//! ```ignore
//! let mut scene = pulsefield::create_scene(20_000);
//! scene.mount(&window)?;              // Arc<winit::window::Window>
//! let handle = scene.handle();        // give this to the poller thread
//!
//! // every animation frame
//! scene.frame(Instant::now());
//!
//! // when the operation completes or the view goes away
//! scene.unmount();
//! ```
//!
//! If `mount` fails the scene keeps a [`Fallback`] describing why; show a
//! static placeholder instead of the field.
//!
//! ## Progress stages
//!
//! | Progress | What appears |
//! |----------|--------------|
//! | 0 → 0.25 | The core fills outward toward the shell |
//! | 0 → 0.5 | Overall opacity ramps in |
//! | 0.2 → 0.9 | Seed pulses grow to full strength |
//! | 0.88 → 1 | Completion glow |
//!
//! With no progress reported the field idles fully revealed and pulsing.

pub mod activation;
pub mod camera;
pub mod config;
pub mod cpu;
pub mod error;
pub mod geometry;
mod gpu;
pub mod noise;
pub mod scene;
pub mod seeds;
pub mod shader;
pub mod status;
pub mod time;
pub mod uniforms;
pub mod viewer;

pub use glam::Vec3;

pub use activation::{ActivationModel, StageGates};
pub use config::FieldConfig;
pub use cpu::{CpuRenderer, Headless};
pub use error::{ConfigError, GpuError, RenderError, SceneError};
pub use geometry::{PointCloud, VolumeShape, MAX_POINTS};
pub use gpu::GpuRenderer;
pub use scene::{
    Fallback, FrameInput, FrameOutcome, FrameRenderer, RenderTarget, Scene, SceneHandle,
    SceneSnapshot, SceneState,
};
pub use seeds::{ActivationSeed, MAX_SEEDS};
pub use status::{StatusController, StatusMode, StatusPhase, StatusTiming, STATUS_MESSAGES};
pub use viewer::Viewer;

/// Unmounted GPU scene with the reference configuration.
pub fn create_scene(particle_count: u32) -> Scene<GpuRenderer> {
    Scene::new(particle_count, FieldConfig::default())
}

/// Status line in controlled mode for `Some(progress)`, free-running for
/// `None`.
pub fn create_status_controller(progress: Option<f32>) -> StatusController {
    StatusController::new(progress, StatusTiming::default())
}

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use pulsefield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::FieldConfig;
    pub use crate::cpu::Headless;
    pub use crate::error::SceneError;
    pub use crate::scene::{FrameOutcome, Scene, SceneHandle};
    pub use crate::status::{StatusController, StatusTiming};
    pub use crate::viewer::Viewer;
    pub use crate::{create_scene, create_status_controller};
    pub use crate::Vec3;
}
