//! WGSL program for the point field.
//!
//! The vertex stage evaluates the activation model from
//! [`crate::activation`] per point instance and expands each point into a
//! camera-facing quad; the fragment stage turns the quad into a soft dot.
//! Progress gates arrive precomputed in the uniform block, so the shader only
//! does the per-point work.

use crate::seeds::MAX_SEEDS;

/// 3D simplex noise, shared with [`crate::noise::noise3`].
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, vec3<f32>(C.y)));
    let x0 = v - i + dot(i, vec3<f32>(C.x));

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 = p0 * norm.x;
    p1 = p1 * norm.y;
    p2 = p2 * norm.z;
    p3 = p3 * norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}
"#;

/// Uniform block layout. Must match [`crate::uniforms::FieldUniforms`].
fn uniforms_wgsl() -> String {
    format!(
        r#"
const MAX_SEEDS: u32 = {max_seeds}u;

struct FieldUniforms {{
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    model: mat4x4<f32>,
    // time, unused, seed count, point size
    frame: vec4<f32>,
    // surface threshold, base ramp, activation strength, glow
    gates: vec4<f32>,
    // amplitude, frequency, rate, surface softness
    drift: vec4<f32>,
    // base, activation, glow, max alpha
    weights: vec4<f32>,
    // near, far, min dim, unused
    depth: vec4<f32>,
    base_color: vec4<f32>,
    active_color: vec4<f32>,
    warm_color: vec4<f32>,
    // xyz position, w radius
    seed_pos: array<vec4<f32>, {max_seeds}>,
    // x phase, y speed
    seed_wave: array<vec4<f32>, {max_seeds}>,
}};

@group(0) @binding(0)
var<uniform> uniforms: FieldUniforms;
"#,
        max_seeds = MAX_SEEDS
    )
}

const FIELD_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) alpha: f32,
    @location(2) uv: vec2<f32>,
};

fn falloff(d: f32, r: f32) -> f32 {
    return max(0.0, 1.0 - d / r);
}

fn pulse(t: f32, phase: f32, speed: f32) -> f32 {
    return 0.5 + 0.5 * sin(t * speed + phase);
}

fn max_activation(p: vec3<f32>, t: f32) -> f32 {
    var best = 0.0;
    let count = min(u32(uniforms.frame.z), MAX_SEEDS);
    for (var i = 0u; i < count; i++) {
        let s = uniforms.seed_pos[i];
        let w = uniforms.seed_wave[i];
        let f = falloff(distance(p, s.xyz), s.w);
        best = max(best, f * f * pulse(t, w.x, w.y));
    }
    return best;
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) base_alpha: f32,
    @location(2) surface_factor: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index];
    let t = uniforms.frame.x;

    // Organic drift
    let drift_at = position * uniforms.drift.y + vec3<f32>(t * uniforms.drift.z);
    let offset = vec3<f32>(
        noise3(drift_at),
        noise3(drift_at + vec3<f32>(100.0)),
        noise3(drift_at + vec3<f32>(200.0)),
    ) * uniforms.drift.x;

    let view_pos = uniforms.view * uniforms.model * vec4<f32>(position + offset, 1.0);
    let depth = -view_pos.z;

    let activation = max_activation(position, t);
    let gate = 1.0 - smoothstep(uniforms.gates.x, uniforms.gates.x + uniforms.drift.w, surface_factor);

    let body = base_alpha * uniforms.weights.x * gate * uniforms.gates.y;
    let pulse_term = activation * uniforms.gates.z * uniforms.weights.y * gate;
    let glow = uniforms.gates.w * uniforms.weights.z * base_alpha * gate;
    let dim = mix(1.0, uniforms.depth.z, smoothstep(uniforms.depth.x, uniforms.depth.y, depth));
    let alpha = clamp((body + pulse_term + glow) * dim, 0.0, uniforms.weights.w);

    var color = mix(uniforms.base_color.rgb, uniforms.active_color.rgb, smoothstep(0.0, 0.6, activation));
    color = mix(color, uniforms.warm_color.rgb, smoothstep(0.6, 1.0, activation) * 0.3);

    let size = uniforms.frame.w * (0.6 + base_alpha * 0.4);
    let billboard = view_pos + vec4<f32>(corner * size, 0.0, 0.0);

    var out: VertexOutput;
    out.clip_position = uniforms.proj * billboard;
    out.color = color;
    out.alpha = alpha;
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if dist > 1.0 {
        discard;
    }
    let strength = pow(1.0 - smoothstep(0.0, 1.0, dist), 1.5);
    return vec4<f32>(in.color, strength * in.alpha);
}
"#;

/// Full render shader source: uniform block, noise prelude and field program.
pub fn render_shader() -> String {
    let mut src = uniforms_wgsl();
    src.push_str(NOISE_WGSL);
    src.push_str(FIELD_WGSL);
    src
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_has_entry_points() {
        let src = render_shader();
        assert!(src.contains("fn vs_main("));
        assert!(src.contains("fn fs_main("));
    }

    #[test]
    fn test_seed_arrays_sized_to_max() {
        let src = render_shader();
        let decl = format!("array<vec4<f32>, {}>", MAX_SEEDS);
        assert_eq!(src.matches(&decl).count(), 2);
    }
}
