//! Per-point activation and shading model.
//!
//! This is the CPU reference for the vertex/fragment program generated in
//! [`crate::shader`]. Both evaluate the same pure function of
//! `(point, seeds, elapsed, progress)`:
//!
//! 1. **Drift** - a small simplex-noise offset added to the static position.
//! 2. **Activation** - the strongest seed pulse reaching the point:
//!    `max_s falloff(d, r)^2 * pulse(t, phase, speed)`.
//! 3. **Progress gates** - surface reveal, base ramp, activation strength and
//!    a terminal glow, each a smoothstep of progress ([`StageGates`]).
//! 4. **Depth dimming** - farther points are dimmer.
//!
//! Nothing here keeps state between calls; evaluating twice with the same
//! inputs gives the same result.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::PointCloud;
use crate::noise::noise3_vec;
use crate::seeds::ActivationSeed;

/// Hermite interpolation between `edge0` and `edge1`, same as WGSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear falloff, zero at and beyond `radius`.
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).max(0.0)
}

/// Unit-range oscillation for a seed.
#[inline]
pub fn pulse(time: f32, phase: f32, speed: f32) -> f32 {
    0.5 + 0.5 * (time * speed + phase).sin()
}

/// Strongest seed contribution at `position`. Zero outside every seed radius.
pub fn max_activation(position: Vec3, seeds: &[ActivationSeed], time: f32) -> f32 {
    seeds.iter().fold(0.0_f32, |acc, seed| {
        let f = falloff(position.distance(seed.position), seed.radius);
        acc.max(f * f * pulse(time, seed.phase, seed.speed))
    })
}

/// Organic positional drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftParams {
    /// Offset magnitude in volume units.
    pub amplitude: f32,
    /// Spatial frequency of the noise field.
    pub frequency: f32,
    /// How fast the field scrolls with time.
    pub rate: f32,
}

impl Default for DriftParams {
    fn default() -> Self {
        Self {
            amplitude: 0.03,
            frequency: 2.0,
            rate: 0.15,
        }
    }
}

/// Progress ranges over which each visual stage ramps in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealStages {
    /// Surface threshold at progress 0.
    pub surface_threshold_start: f32,
    /// Progress at which the surface threshold reaches 1.
    pub surface_reveal_end: f32,
    /// Width of the soft edge of the surface gate.
    pub surface_softness: f32,
    /// Progress at which the base opacity ramp completes.
    pub base_ramp_end: f32,
    pub activation_start: f32,
    pub activation_end: f32,
    pub glow_start: f32,
    pub glow_end: f32,
    /// Time constant, in seconds, with which the displayed progress follows
    /// reported progress. Zero disables easing.
    pub progress_ease_secs: f32,
}

impl Default for RevealStages {
    fn default() -> Self {
        Self {
            surface_threshold_start: 0.4,
            surface_reveal_end: 0.25,
            surface_softness: 0.08,
            base_ramp_end: 0.5,
            activation_start: 0.2,
            activation_end: 0.9,
            glow_start: 0.88,
            glow_end: 1.0,
            progress_ease_secs: 0.5,
        }
    }
}

/// Progress-derived scalars, computed once per frame and shared by every
/// point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageGates {
    pub surface_threshold: f32,
    pub base_ramp: f32,
    pub activation_strength: f32,
    pub glow: f32,
}

impl StageGates {
    /// Gates for a caller-reported progress. `progress` is clamped to [0, 1].
    pub fn at(progress: f32, stages: &RevealStages) -> Self {
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        Self {
            surface_threshold: mix(
                stages.surface_threshold_start,
                1.0,
                smoothstep(0.0, stages.surface_reveal_end, p),
            ),
            base_ramp: smoothstep(0.0, stages.base_ramp_end, p),
            activation_strength: smoothstep(stages.activation_start, stages.activation_end, p),
            glow: smoothstep(stages.glow_start, stages.glow_end, p),
        }
    }

    /// Gates for ambient idle mode (no progress reported): the whole field is
    /// visible and pulsing, without the completion glow.
    pub fn ambient() -> Self {
        Self {
            surface_threshold: 1.0,
            base_ramp: 1.0,
            activation_strength: 1.0,
            glow: 0.0,
        }
    }

    pub fn for_progress(progress: Option<f32>, stages: &RevealStages) -> Self {
        match progress {
            Some(p) => Self::at(p, stages),
            None => Self::ambient(),
        }
    }
}

/// Weights of the alpha terms and depth attenuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingParams {
    pub base_weight: f32,
    pub activation_weight: f32,
    pub glow_weight: f32,
    pub max_alpha: f32,
    /// View depth at which dimming starts.
    pub depth_near: f32,
    /// View depth at which dimming reaches `depth_min_dim`.
    pub depth_far: f32,
    pub depth_min_dim: f32,
    /// World-space radius of a point sprite.
    pub point_size: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            base_weight: 0.35,
            activation_weight: 0.65,
            glow_weight: 0.25,
            max_alpha: 1.0,
            depth_near: 2.4,
            depth_far: 4.0,
            depth_min_dim: 0.45,
            point_size: 0.006,
        }
    }
}

/// Color stops: neutral base, cool active tone and a warm tint reserved for
/// high activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPalette {
    pub background: Vec3,
    pub base: Vec3,
    pub active: Vec3,
    pub warm: Vec3,
}

impl Default for FieldPalette {
    fn default() -> Self {
        Self {
            background: Vec3::new(0.043, 0.051, 0.063),
            base: Vec3::new(0.784, 0.804, 0.827),
            active: Vec3::new(0.420, 0.608, 0.765),
            warm: Vec3::new(0.788, 0.663, 0.431),
        }
    }
}

/// Result of shading one point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointShade {
    /// Drifted position, before camera transforms.
    pub position: Vec3,
    /// Seed activation in [0, 1].
    pub activation: f32,
    /// Final opacity.
    pub alpha: f32,
    pub color: Vec3,
}

/// Borrowed parameters needed to shade a point.
#[derive(Debug, Clone, Copy)]
pub struct ActivationModel<'a> {
    pub seeds: &'a [ActivationSeed],
    pub drift: &'a DriftParams,
    pub shading: &'a ShadingParams,
    pub palette: &'a FieldPalette,
    pub stages: &'a RevealStages,
}

impl<'a> ActivationModel<'a> {
    /// Drift offset for a static position at `time`.
    pub fn drift_offset(&self, position: Vec3, time: f32) -> Vec3 {
        let sample = position * self.drift.frequency + Vec3::splat(time * self.drift.rate);
        noise3_vec(sample) * self.drift.amplitude
    }

    /// Soft gate hiding points whose surface factor is above the threshold.
    #[inline]
    pub fn surface_gate(&self, surface_factor: f32, gates: &StageGates) -> f32 {
        1.0 - smoothstep(
            gates.surface_threshold,
            gates.surface_threshold + self.stages.surface_softness,
            surface_factor,
        )
    }

    #[inline]
    pub fn depth_dim(&self, view_depth: f32) -> f32 {
        mix(
            1.0,
            self.shading.depth_min_dim,
            smoothstep(self.shading.depth_near, self.shading.depth_far, view_depth),
        )
    }

    /// Final alpha from precomputed activation and gates.
    pub fn alpha(
        &self,
        base_alpha: f32,
        surface_factor: f32,
        activation: f32,
        gates: &StageGates,
        view_depth: f32,
    ) -> f32 {
        let gate = self.surface_gate(surface_factor, gates);
        let s = self.shading;
        let body = base_alpha * s.base_weight * gate * gates.base_ramp;
        let pulse = activation * gates.activation_strength * s.activation_weight * gate;
        let glow = gates.glow * s.glow_weight * base_alpha * gate;
        ((body + pulse + glow) * self.depth_dim(view_depth)).clamp(0.0, s.max_alpha)
    }

    pub fn color(&self, activation: f32) -> Vec3 {
        let p = self.palette;
        let cool = p.base.lerp(p.active, smoothstep(0.0, 0.6, activation));
        cool.lerp(p.warm, smoothstep(0.6, 1.0, activation) * 0.3)
    }

    /// Shade one point. `view_depth` is its distance along the camera axis.
    pub fn shade(
        &self,
        position: Vec3,
        base_alpha: f32,
        surface_factor: f32,
        time: f32,
        gates: &StageGates,
        view_depth: f32,
    ) -> PointShade {
        let activation = max_activation(position, self.seeds, time);
        PointShade {
            position: position + self.drift_offset(position, time),
            activation,
            alpha: self.alpha(base_alpha, surface_factor, activation, gates, view_depth),
            color: self.color(activation),
        }
    }

    /// Shade every point of `cloud` into `out`, using `depth_of` to find each
    /// drifted point's view depth.
    pub fn shade_cloud<F>(
        &self,
        cloud: &PointCloud,
        time: f32,
        gates: &StageGates,
        out: &mut Vec<PointShade>,
        depth_of: F,
    ) where
        F: Fn(Vec3) -> f32,
    {
        out.clear();
        out.reserve(cloud.len());
        let attrs = cloud.base_alpha().iter().zip(cloud.surface_factor());
        for (&p, (&a, &s)) in cloud.positions().iter().zip(attrs) {
            let activation = max_activation(p, self.seeds, time);
            let drifted = p + self.drift_offset(p, time);
            out.push(PointShade {
                position: drifted,
                activation,
                alpha: self.alpha(a, s, activation, gates, depth_of(drifted)),
                color: self.color(activation),
            });
        }
    }
}
