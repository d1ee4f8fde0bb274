//! Built-in WGSL helpers shared by the update and draw programs.
//!
//! Prepended to every composed update program, so user programs can call
//! them directly.
//!
//! # Available Functions
//!
//! - `hash(n: u32) -> u32` - integer hash
//! - `rand(seed: u32) -> f32` - pseudo-random float in [0, 1)
//! - `noise3(p: vec3<f32>) -> f32` - 3D simplex noise in roughly [-1, 1]
//! - `flow3(p: vec3<f32>, t: f32) -> vec3<f32>` - unit flow direction from
//!   three decorrelated noise lookups

/// WGSL code for random/hash functions.
pub const RANDOM_WGSL: &str = r#"
fn hash(n: u32) -> u32 {
    var x = n;
    x = x ^ (x >> 17u);
    x = x * 0xed5ad4bbu;
    x = x ^ (x >> 11u);
    x = x * 0xac4c1b51u;
    x = x ^ (x >> 15u);
    x = x * 0x31848babu;
    x = x ^ (x >> 14u);
    return x;
}

fn rand(seed: u32) -> f32 {
    return f32(hash(seed)) / 4294967295.0;
}
"#;

/// WGSL code for simplex noise and the derived flow field.
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
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}

fn flow3(p: vec3<f32>, t: f32) -> vec3<f32> {
    let dir = vec3<f32>(
        noise3(p + vec3<f32>(0.0, t, 0.0)),
        noise3(p + vec3<f32>(31.4, t, 0.0)),
        noise3(p + vec3<f32>(0.0, t, 57.2))
    );
    let len = length(dir);
    if len < 0.0001 {
        return vec3<f32>(0.0, 1.0, 0.0);
    }
    return dir / len;
}
"#;

/// All helpers combined, in dependency order.
pub fn all_utils_wgsl() -> String {
    format!("// Built-in utility functions\n{}\n{}\n", RANDOM_WGSL, NOISE_WGSL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utils_contain_entry_points() {
        let code = all_utils_wgsl();
        for f in ["fn hash(", "fn rand(", "fn noise3(", "fn flow3("] {
            assert!(code.contains(f), "missing {f}");
        }
    }
}
