//! Activation seeds: pulsing influence sources scattered through the volume.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::VolumeShape;

/// Upper bound on seeds per scene. Every point tests every seed every frame,
/// and the shader's uniform block is sized for exactly this many.
pub const MAX_SEEDS: usize = 24;

/// One pulsing influence source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationSeed {
    pub position: Vec3,
    /// Oscillation offset in [0, 2π).
    pub phase: f32,
    /// Angular rate of the oscillation.
    pub speed: f32,
    /// Radius beyond which the seed has no influence.
    pub radius: f32,
}

/// Sampling ranges for seed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedParams {
    /// Seeds generated per mount (clamped to [`MAX_SEEDS`]).
    pub count: u32,
    /// Radius of the sphere seeds are drawn from, before flattening.
    pub volume_radius: f32,
    /// Exponent `k` in `r = U^k`; above 1 pulls seeds toward the centre.
    pub center_bias: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub radius_min: f32,
    pub radius_max: f32,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            count: 18,
            volume_radius: 0.7,
            center_bias: 1.6,
            speed_min: 0.3,
            speed_max: 0.9,
            radius_min: 0.15,
            radius_max: 0.35,
        }
    }
}

fn sample_range<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Generate up to [`MAX_SEEDS`] seeds inside the same flattened volume the
/// point cloud uses.
pub fn generate_seeds<R: Rng>(
    count: u32,
    params: &SeedParams,
    shape: &VolumeShape,
    rng: &mut R,
) -> Vec<ActivationSeed> {
    let count = (count as usize).min(MAX_SEEDS);
    // Flatten relative to the widest axis so seeds never leave the volume.
    let widest = shape.scale.abs().max_element().max(f32::EPSILON);
    let flatten = shape.scale.abs() / widest;

    (0..count)
        .map(|_| {
            let theta = rng.gen_range(0.0..TAU);
            let cos_phi: f32 = rng.gen_range(-1.0..=1.0);
            let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
            let dir = Vec3::new(sin_phi * theta.cos(), cos_phi, sin_phi * theta.sin());

            let r = rng.gen::<f32>().powf(params.center_bias) * params.volume_radius;

            ActivationSeed {
                position: dir * r * flatten,
                phase: rng.gen_range(0.0..TAU),
                speed: sample_range(rng, params.speed_min, params.speed_max),
                radius: sample_range(rng, params.radius_min, params.radius_max),
            }
        })
        .collect()
}
