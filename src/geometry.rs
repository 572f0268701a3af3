//! Point-cloud generation inside an organic superellipsoid volume.
//!
//! Points are rejection-sampled from the box bounding the volume and kept only
//! if they fall inside the implicit surface `Σ|axis / scale|^p ≤ 1`. A few
//! carving and density rules break up the silhouette: a groove along the top,
//! a thinned underside, a slightly fuller front and a shell-biased density.
//!
//! # Example
//!
//! ```ignore
//! use pulsefield::geometry::{generate_points, VolumeShape};
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let cloud = generate_points(20_000, &VolumeShape::default(), &mut rng);
//! assert_eq!(cloud.len(), 20_000);
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::smoothstep;

/// Largest point cloud a scene will generate. Larger requests are clamped.
pub const MAX_POINTS: u32 = 50_000;

/// Rejected candidates allowed per requested point before shaping rules are
/// switched off.
const MAX_ATTEMPTS_PER_POINT: u64 = 400;

/// Shape of the implicit volume and its carving rules.
///
/// Only the structural contract matters (non-spherical, shell-structured);
/// every constant here is a tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeShape {
    /// Per-axis half extents. Keeping them unequal flattens the sphere.
    pub scale: Vec3,
    /// Superellipsoid exponent. 2.0 is an ellipsoid, larger is boxier.
    pub exponent: f32,
    /// Peak depth of the groove carved along the top.
    pub fissure_depth: f32,
    /// Half width of the band in which the groove is carved.
    pub fissure_width: f32,
    /// The groove only exists above this height.
    pub fissure_start: f32,
    /// Height of the groove's deepest point.
    pub fissure_center: f32,
    /// Vertical spread of the groove profile.
    pub fissure_spread: f32,
    /// Points below this height are thinned out.
    pub floor_y: f32,
    /// Probability of keeping a point below `floor_y`.
    pub floor_keep: f32,
    /// Probability of keeping a point in the back half (z < 0).
    pub back_keep: f32,
    /// Relative density deep inside the volume (1.0 = uniform).
    pub interior_density: f32,
    /// Surface factor at which density starts rising toward the shell.
    pub shell_start: f32,
    /// Range of the per-point base alpha.
    pub base_alpha_min: f32,
    pub base_alpha_max: f32,
}

impl Default for VolumeShape {
    fn default() -> Self {
        Self {
            scale: Vec3::new(1.0, 0.75, 0.85),
            exponent: 2.4,
            fissure_depth: 0.08,
            fissure_width: 0.06,
            fissure_start: 0.1,
            fissure_center: 0.4,
            fissure_spread: 0.3,
            floor_y: -0.55,
            floor_keep: 0.3,
            back_keep: 0.95,
            interior_density: 0.35,
            shell_start: 0.55,
            base_alpha_min: 0.2,
            base_alpha_max: 1.0,
        }
    }
}

impl VolumeShape {
    /// Value of the implicit function at `p`. Inside the volume when `<= 1`.
    #[inline]
    pub fn implicit(&self, p: Vec3) -> f32 {
        let n = (p / self.scale).abs();
        n.x.powf(self.exponent) + n.y.powf(self.exponent) + n.z.powf(self.exponent)
    }

    /// Volume membership test used to accept candidates.
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        self.implicit(p) <= 1.0
    }

    /// Normalised superellipsoid radius: 0 at the centre, 1 on the shell.
    #[inline]
    pub fn surface_factor(&self, p: Vec3) -> f32 {
        self.implicit(p).powf(1.0 / self.exponent).clamp(0.0, 1.0)
    }

    /// Whether the groove along the top removes `p`.
    fn in_fissure(&self, p: Vec3) -> bool {
        if p.x.abs() >= self.fissure_width || p.y <= self.fissure_start {
            return false;
        }
        let t = (p.y - self.fissure_center) / self.fissure_spread;
        let groove = self.fissure_depth * (-t * t).exp();
        p.x.abs() < groove
    }

    /// Acceptance probability from the density-shaping rules.
    fn keep_probability(&self, p: Vec3, surface_factor: f32) -> f32 {
        let mut keep = self.interior_density
            + (1.0 - self.interior_density) * smoothstep(self.shell_start, 1.0, surface_factor);
        if p.y < self.floor_y {
            keep *= self.floor_keep;
        }
        if p.z < 0.0 {
            keep *= self.back_keep;
        }
        keep
    }
}

/// GPU vertex layout for one point. Matches the render pipeline's
/// per-instance attributes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub base_alpha: f32,
    pub surface_factor: f32,
    pub _pad: [f32; 3],
}

/// Static point cloud: positions plus per-point scalar attributes.
///
/// All three arrays have the same length and never change after generation.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    positions: Vec<Vec3>,
    base_alpha: Vec<f32>,
    surface_factor: Vec<f32>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn base_alpha(&self) -> &[f32] {
        &self.base_alpha
    }

    pub fn surface_factor(&self) -> &[f32] {
        &self.surface_factor
    }

    /// Pack the cloud into the vertex layout uploaded to the GPU.
    pub fn to_vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(&self.base_alpha)
            .zip(&self.surface_factor)
            .map(|((p, &a), &s)| PointVertex {
                position: p.to_array(),
                base_alpha: a,
                surface_factor: s,
                _pad: [0.0; 3],
            })
            .collect()
    }
}

/// Rejection-sample exactly `count` points (clamped to [`MAX_POINTS`]).
///
/// Every returned point passes [`VolumeShape::contains`]. If the carving and
/// density rules reject so much that the attempt budget runs out, they are
/// dropped for the remaining points; the volume test never is. A degenerate
/// shape (zero or non-finite scale) that accepts nothing gets a second
/// budget and then yields a partial cloud instead of looping forever.
pub fn generate_points<R: Rng>(count: u32, shape: &VolumeShape, rng: &mut R) -> PointCloud {
    let count = count.min(MAX_POINTS) as usize;
    let mut cloud = PointCloud {
        positions: Vec::with_capacity(count),
        base_alpha: Vec::with_capacity(count),
        surface_factor: Vec::with_capacity(count),
    };

    let half = shape.scale.abs();
    let alpha_lo = shape.base_alpha_min.min(shape.base_alpha_max);
    let alpha_hi = shape.base_alpha_max.max(shape.base_alpha_min);
    let budget = (count as u64).saturating_mul(MAX_ATTEMPTS_PER_POINT);
    let mut attempts: u64 = 0;
    let mut shaping = true;

    while cloud.positions.len() < count {
        attempts += 1;
        if attempts > budget.saturating_mul(2) {
            tracing::warn!(
                accepted = cloud.positions.len(),
                requested = count,
                "volume accepts no candidates, returning a partial cloud"
            );
            break;
        }
        if shaping && attempts > budget {
            shaping = false;
            tracing::warn!(
                accepted = cloud.positions.len(),
                requested = count,
                "point generator exhausted its attempt budget, disabling shaping rules"
            );
        }

        let p = Vec3::new(
            rng.gen_range(-1.0..=1.0) * half.x,
            rng.gen_range(-1.0..=1.0) * half.y,
            rng.gen_range(-1.0..=1.0) * half.z,
        );

        if !shape.contains(p) {
            continue;
        }
        let surface = shape.surface_factor(p);

        if shaping {
            if shape.in_fissure(p) {
                continue;
            }
            if rng.gen::<f32>() >= shape.keep_probability(p, surface) {
                continue;
            }
        }

        let alpha = if alpha_hi > alpha_lo {
            rng.gen_range(alpha_lo..alpha_hi)
        } else {
            alpha_lo
        };

        cloud.positions.push(p);
        cloud.base_alpha.push(alpha);
        cloud.surface_factor.push(surface);
    }

    tracing::debug!(points = count, attempts, "generated point cloud");
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn test_exact_count() {
        let shape = VolumeShape::default();
        for &n in &[0u32, 1, 17, 2_000] {
            let cloud = generate_points(n, &shape, &mut rng());
            assert_eq!(cloud.len(), n as usize);
            assert_eq!(cloud.base_alpha().len(), n as usize);
            assert_eq!(cloud.surface_factor().len(), n as usize);
        }
    }

    #[test]
    fn test_count_is_clamped() {
        let cloud = generate_points(MAX_POINTS + 10, &VolumeShape::default(), &mut rng());
        assert_eq!(cloud.len(), MAX_POINTS as usize);
    }

    #[test]
    fn test_points_inside_volume() {
        let shape = VolumeShape::default();
        let cloud = generate_points(5_000, &shape, &mut rng());
        for p in cloud.positions() {
            assert!(shape.contains(*p), "point {:?} outside volume", p);
        }
    }

    #[test]
    fn test_attribute_ranges() {
        let shape = VolumeShape::default();
        let cloud = generate_points(5_000, &shape, &mut rng());
        for (&a, &s) in cloud.base_alpha().iter().zip(cloud.surface_factor()) {
            assert!((0.2..1.0).contains(&a));
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_surface_factor_is_radial() {
        let shape = VolumeShape::default();
        assert_eq!(shape.surface_factor(Vec3::ZERO), 0.0);
        let inner = shape.surface_factor(Vec3::new(0.2, 0.0, 0.0));
        let outer = shape.surface_factor(Vec3::new(0.8, 0.0, 0.0));
        assert!(inner < outer);
        assert!((shape.surface_factor(Vec3::new(1.0, 0.0, 0.0)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_density_is_shell_biased() {
        let shape = VolumeShape::default();
        let cloud = generate_points(10_000, &shape, &mut rng());
        let outer = cloud.surface_factor().iter().filter(|&&s| s > 0.8).count();
        let inner = cloud.surface_factor().iter().filter(|&&s| s < 0.5).count();
        assert!(outer > inner, "outer {} inner {}", outer, inner);
    }

    #[test]
    fn test_fissure_is_carved() {
        let shape = VolumeShape::default();
        let cloud = generate_points(20_000, &shape, &mut rng());
        let in_groove = cloud
            .positions()
            .iter()
            .filter(|p| shape.in_fissure(**p))
            .count();
        assert_eq!(in_groove, 0);
    }

    #[test]
    fn test_terminates_with_hostile_shaping() {
        let shape = VolumeShape {
            interior_density: 0.0,
            shell_start: 0.999,
            floor_keep: 0.0,
            ..Default::default()
        };
        let cloud = generate_points(300, &shape, &mut rng());
        assert_eq!(cloud.len(), 300);
        assert!(cloud.positions().iter().all(|p| shape.contains(*p)));
    }

    #[test]
    fn test_degenerate_shape_terminates() {
        let shape = VolumeShape {
            scale: Vec3::new(1.0, 0.0, 0.85),
            ..Default::default()
        };
        let cloud = generate_points(100, &shape, &mut rng());
        assert!(cloud.len() < 100);
        assert!(cloud.positions().iter().all(|p| shape.contains(*p)));
    }

    #[test]
    fn test_vertices_match_cloud() {
        let cloud = generate_points(64, &VolumeShape::default(), &mut rng());
        let verts = cloud.to_vertices();
        assert_eq!(verts.len(), 64);
        assert_eq!(std::mem::size_of::<PointVertex>(), 32);
        assert_eq!(verts[3].position, cloud.positions()[3].to_array());
        assert_eq!(verts[3].surface_factor, cloud.surface_factor()[3]);
    }
}
