//! Uniform block uploaded once per frame.
//!
//! Layout mirrors the `FieldUniforms` struct emitted by
//! [`crate::shader::render_shader`]; every member is a `mat4x4` or a `vec4`,
//! so the `repr(C)` struct and the WGSL struct share offsets without manual
//! padding.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::scene::FrameInput;
use crate::seeds::MAX_SEEDS;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FieldUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// time, unused, seed count, point size
    pub frame: [f32; 4],
    /// surface threshold, base ramp, activation strength, glow
    pub gates: [f32; 4],
    /// amplitude, frequency, rate, surface softness
    pub drift: [f32; 4],
    /// base, activation, glow, max alpha
    pub weights: [f32; 4],
    /// near, far, min dim
    pub depth: [f32; 4],
    pub base_color: [f32; 4],
    pub active_color: [f32; 4],
    pub warm_color: [f32; 4],
    pub seed_pos: [[f32; 4]; MAX_SEEDS],
    pub seed_wave: [[f32; 4]; MAX_SEEDS],
}

fn rgb1(c: Vec3) -> [f32; 4] {
    c.extend(1.0).to_array()
}

impl FieldUniforms {
    pub fn from_frame(frame: &FrameInput<'_>) -> Self {
        let config = &frame.assets.config;
        let drift = &config.drift;
        let shading = &config.shading;
        let palette = &config.palette;
        let g = &frame.gates;

        let mut uniforms = Self {
            view: frame.camera.view.to_cols_array_2d(),
            proj: frame.camera.proj.to_cols_array_2d(),
            model: frame.camera.model.to_cols_array_2d(),
            frame: [
                frame.elapsed,
                0.0,
                0.0,
                shading.point_size,
            ],
            gates: [g.surface_threshold, g.base_ramp, g.activation_strength, g.glow],
            drift: [
                drift.amplitude,
                drift.frequency,
                drift.rate,
                config.reveal.surface_softness,
            ],
            weights: [
                shading.base_weight,
                shading.activation_weight,
                shading.glow_weight,
                shading.max_alpha,
            ],
            depth: [shading.depth_near, shading.depth_far, shading.depth_min_dim, 0.0],
            base_color: rgb1(palette.base),
            active_color: rgb1(palette.active),
            warm_color: rgb1(palette.warm),
            seed_pos: [[0.0; 4]; MAX_SEEDS],
            seed_wave: [[0.0; 4]; MAX_SEEDS],
        };

        let seeds = &frame.assets.seeds[..frame.assets.seeds.len().min(MAX_SEEDS)];
        for (i, seed) in seeds.iter().enumerate() {
            uniforms.seed_pos[i] = seed.position.extend(seed.radius).to_array();
            uniforms.seed_wave[i] = [seed.phase, seed.speed, 0.0, 0.0];
        }
        uniforms.frame[2] = seeds.len() as f32;
        uniforms
    }
}
