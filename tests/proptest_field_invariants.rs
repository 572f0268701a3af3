//! Property-based invariant tests for the field model and status line.
//!
//! Verifies:
//! 1. Point generation returns exactly the (clamped) count, all inside the volume
//! 2. Point attributes stay in range
//! 3. Seed generation clamps to MAX_SEEDS and keeps parameters in range
//! 4. Activation never increases as a point moves away from a lone seed
//! 5. Stage gates are monotone in progress and clamp out-of-range input
//! 6. Shading is idempotent
//! 7. Status bands are monotone in progress

use glam::Vec3;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use pulsefield::activation::{max_activation, RevealStages, StageGates};
use pulsefield::geometry::generate_points;
use pulsefield::scene::SceneAssets;
use pulsefield::seeds::{generate_seeds, ActivationSeed, SeedParams};
use pulsefield::status::message_index_for;
use pulsefield::{FieldConfig, VolumeShape, MAX_SEEDS};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_unit_vec() -> impl Strategy<Value = Vec3> {
    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
        .prop_filter("non-zero", |(x, y, z)| x * x + y * y + z * z > 1e-4)
        .prop_map(|(x, y, z)| Vec3::new(x, y, z).normalize())
}

fn arb_progress() -> impl Strategy<Value = f32> {
    prop_oneof![-2.0f32..3.0, Just(0.0), Just(1.0), Just(0.25), Just(0.92)]
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn points_exact_count_and_inside(count in 0u32..3_000, seed in any::<u64>()) {
        let shape = VolumeShape::default();
        let cloud = generate_points(count, &shape, &mut SmallRng::seed_from_u64(seed));
        prop_assert_eq!(cloud.len(), count as usize);
        for p in cloud.positions() {
            prop_assert!(shape.contains(*p));
        }
    }

    #[test]
    fn point_attributes_in_range(seed in any::<u64>()) {
        let cloud = generate_points(500, &VolumeShape::default(), &mut SmallRng::seed_from_u64(seed));
        for (&a, &s) in cloud.base_alpha().iter().zip(cloud.surface_factor()) {
            prop_assert!((0.2..1.0).contains(&a));
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn seeds_clamped_and_in_range(count in 0u32..200, seed in any::<u64>()) {
        let params = SeedParams::default();
        let seeds = generate_seeds(count, &params, &VolumeShape::default(), &mut SmallRng::seed_from_u64(seed));
        prop_assert_eq!(seeds.len(), (count as usize).min(MAX_SEEDS));
        for s in &seeds {
            prop_assert!(s.phase >= 0.0 && s.phase < std::f32::consts::TAU);
            prop_assert!(s.speed >= params.speed_min && s.speed < params.speed_max);
            prop_assert!(s.radius >= params.radius_min && s.radius < params.radius_max);
        }
    }

    #[test]
    fn activation_monotone_in_closeness(
        dir in arb_unit_vec(),
        near in 0.0f32..0.5,
        extra in 0.0f32..0.5,
        radius in 0.05f32..0.5,
        phase in 0.0f32..6.28,
        t in 0.0f32..100.0,
    ) {
        let seeds = [ActivationSeed { position: Vec3::ZERO, phase, speed: 0.6, radius }];
        let a_near = max_activation(dir * near, &seeds, t);
        let a_far = max_activation(dir * (near + extra), &seeds, t);
        prop_assert!(a_near >= a_far);
        prop_assert!((0.0..=1.0).contains(&a_near));
    }

    #[test]
    fn gates_monotone_and_clamped(a in arb_progress(), b in arb_progress()) {
        let stages = RevealStages::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let g_lo = StageGates::at(lo, &stages);
        let g_hi = StageGates::at(hi, &stages);
        prop_assert!(g_lo.surface_threshold <= g_hi.surface_threshold);
        prop_assert!(g_lo.base_ramp <= g_hi.base_ramp);
        prop_assert!(g_lo.activation_strength <= g_hi.activation_strength);
        prop_assert!(g_lo.glow <= g_hi.glow);
        prop_assert_eq!(StageGates::at(a, &stages), StageGates::at(a.clamp(0.0, 1.0), &stages));
    }

    #[test]
    fn shading_is_idempotent(index in 0usize..400, t in 0.0f32..500.0, progress in 0.0f32..1.0) {
        let assets = SceneAssets::generate(400, FieldConfig::default(), &mut SmallRng::seed_from_u64(5));
        let model = assets.model();
        let gates = StageGates::at(progress, &assets.config.reveal);
        let cloud = &assets.cloud;
        let p = cloud.positions()[index];
        let once = model.shade(p, cloud.base_alpha()[index], cloud.surface_factor()[index], t, &gates, 3.0);
        let twice = model.shade(p, cloud.base_alpha()[index], cloud.surface_factor()[index], t, &gates, 3.0);
        prop_assert_eq!(once, twice);
        prop_assert!(once.alpha >= 0.0 && once.alpha <= assets.config.shading.max_alpha);
    }

    #[test]
    fn status_bands_monotone(a in -1.0f32..2.0, b in -1.0f32..2.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(message_index_for(lo) <= message_index_for(hi));
    }
}
