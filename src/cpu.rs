//! Software renderer for headless runs and tests.
//!
//! Shades every point with the reference [`ActivationModel`](crate::activation::ActivationModel),
//! projects it with the frame's camera and splats it additively into a
//! linear RGB framebuffer. The result can be printed as ASCII art.

use glam::{Mat4, Vec3};

use crate::activation::PointShade;
use crate::error::{GpuError, RenderError};
use crate::scene::{FrameInput, FrameRenderer, Presented, RenderTarget, SceneAssets};

/// Brightness ramp used by [`CpuRenderer::to_ascii`], dark to light.
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

/// Off-screen target of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headless {
    pub width: u32,
    pub height: u32,
}

impl Headless {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl RenderTarget for Headless {
    type Renderer = CpuRenderer;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_renderer(&self, assets: &SceneAssets) -> Result<CpuRenderer, GpuError> {
        if self.width == 0 || self.height == 0 {
            return Err(GpuError::EmptySurface);
        }
        Ok(CpuRenderer::new(self.width, self.height, assets.config.palette.background))
    }
}

pub struct CpuRenderer {
    width: u32,
    height: u32,
    background: Vec3,
    pixels: Vec<Vec3>,
    shades: Vec<PointShade>,
    frames: u64,
}

impl CpuRenderer {
    pub fn new(width: u32, height: u32, background: Vec3) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background; (width * height) as usize],
            shades: Vec::new(),
            frames: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Per-point results of the last frame.
    pub fn shades(&self) -> &[PointShade] {
        &self.shades
    }

    /// Framebuffer of the last frame, row-major from the top-left.
    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sum of all point alphas in the last frame.
    pub fn total_alpha(&self) -> f32 {
        self.shades.iter().map(|s| s.alpha).sum()
    }

    /// Render the framebuffer as text, one character per pixel.
    pub fn to_ascii(&self) -> String {
        let floor = luminance(self.background);
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for row in self.pixels.chunks(self.width as usize) {
            for px in row {
                let level = ((luminance(*px) - floor) / (1.0 - floor).max(1e-3)).clamp(0.0, 1.0);
                let idx = (level * (ASCII_RAMP.len() - 1) as f32).round() as usize;
                out.push(ASCII_RAMP[idx] as char);
            }
            out.push('\n');
        }
        out
    }

    fn splat(&mut self, clip_from_model: &Mat4) {
        self.pixels.fill(self.background);
        let (w, h) = (self.width as f32, self.height as f32);
        for shade in &self.shades {
            if shade.alpha <= 0.0 {
                continue;
            }
            let clip = *clip_from_model * shade.position.extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
                continue;
            }
            let x = (((ndc.x + 1.0) * 0.5 * w) as u32).min(self.width - 1);
            let y = (((1.0 - ndc.y) * 0.5 * h) as u32).min(self.height - 1);
            let px = &mut self.pixels[(y * self.width + x) as usize];
            *px = (*px + shade.color * shade.alpha).min(Vec3::ONE);
        }
    }
}

impl FrameRenderer for CpuRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![self.background; (width * height) as usize];
    }

    fn render(&mut self, frame: &FrameInput<'_>) -> Result<Presented, RenderError> {
        let camera = frame.camera;
        frame.assets.model().shade_cloud(
            &frame.assets.cloud,
            frame.elapsed,
            &frame.gates,
            &mut self.shades,
            |p| camera.view_depth(p),
        );
        self.splat(&(camera.view_proj() * camera.model));
        self.frames += 1;
        Ok(Presented::Drawn)
    }
}

fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}
