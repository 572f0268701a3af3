//! CPU port of the 3D simplex noise used for point drift.
//!
//! Mirrors `noise3` in the WGSL prelude ([`crate::shader::NOISE_WGSL`]) line
//! for line so the CPU renderer and the GPU program agree on where each point
//! wanders. Output is roughly in [-1, 1] and continuous everywhere.

use glam::{Vec3, Vec4};

#[inline]
fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute4(x: Vec4) -> Vec4 {
    mod289_4(((x * 34.0) + Vec4::ONE) * x)
}

#[inline]
fn taylor_inv_sqrt4(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - r * 0.853_734_7
}

/// WGSL `step(edge, x)`.
#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x >= edge {
        1.0
    } else {
        0.0
    }
}

/// 3D simplex noise.
pub fn noise3(v: Vec3) -> f32 {
    const CX: f32 = 1.0 / 6.0;
    const CY: f32 = 1.0 / 3.0;

    // First corner
    let mut i = (v + Vec3::splat(v.dot(Vec3::splat(CY)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(CX)));

    // Other corners
    let g = Vec3::new(step(x0.y, x0.x), step(x0.z, x0.y), step(x0.x, x0.z));
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let x1 = x0 - i1 + Vec3::splat(CX);
    let x2 = x0 - i2 + Vec3::splat(CY);
    let x3 = x0 - Vec3::splat(0.5);

    // Permutations
    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients: 7x7 points over a square, mapped onto an octahedron
    let n_ = 0.142_857_15_f32;
    let ns = Vec3::new(n_ * 2.0, n_ * 0.5 - 1.0, n_);

    let j = p - (p * ns.z * ns.z).floor() * 49.0;

    let x_ = (j * ns.z).floor();
    let y_ = (j - x_ * 7.0).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + Vec4::ONE;
    let s1 = b1.floor() * 2.0 + Vec4::ONE;
    let sh = Vec4::new(
        -step(h.x, 0.0),
        -step(h.y, 0.0),
        -step(h.z, 0.0),
        -step(h.w, 0.0),
    );

    let a0 = Vec4::new(b0.x, b0.z, b0.y, b0.w) + Vec4::new(s0.x, s0.z, s0.y, s0.w) * Vec4::new(sh.x, sh.x, sh.y, sh.y);
    let a1 = Vec4::new(b1.x, b1.z, b1.y, b1.w) + Vec4::new(s1.x, s1.z, s1.y, s1.w) * Vec4::new(sh.z, sh.z, sh.w, sh.w);

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    // Normalise gradients
    let norm = taylor_inv_sqrt4(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix final noise value
    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3))).max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Three decorrelated noise channels sampled around `p`.
///
/// The channel offsets match the drift code in the vertex shader.
pub fn noise3_vec(p: Vec3) -> Vec3 {
    Vec3::new(
        noise3(p),
        noise3(p + Vec3::splat(100.0)),
        noise3(p + Vec3::splat(200.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_bounded() {
        for i in 0..2000 {
            let t = i as f32 * 0.137;
            let p = Vec3::new(t.sin() * 7.0, t * 0.31, (t * 1.7).cos() * 3.0);
            let n = noise3(p);
            assert!(n.is_finite());
            assert!(n.abs() <= 1.05, "noise out of range: {}", n);
        }
    }

    #[test]
    fn test_noise_is_deterministic() {
        let p = Vec3::new(0.3, -1.2, 4.5);
        assert_eq!(noise3(p), noise3(p));
    }

    #[test]
    fn test_noise_is_continuous() {
        let p = Vec3::new(1.25, 0.5, -0.75);
        let a = noise3(p);
        let b = noise3(p + Vec3::splat(1e-4));
        assert!((a - b).abs() < 0.01);
    }

    #[test]
    fn test_noise_varies() {
        let a = noise3(Vec3::new(0.1, 0.2, 0.3));
        let b = noise3(Vec3::new(3.7, -2.1, 0.9));
        assert!((a - b).abs() > 1e-4);
    }
}
