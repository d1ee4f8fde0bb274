//! Update program composition and validation.
//!
//! An update program is WGSL source defining
//!
//! ```wgsl
//! fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32>
//! ```
//!
//! which returns the next state of the texel at `coord`. The composed
//! compute shader surrounds it with:
//!
//! - `params`: the uniform block (`time`, `delta_time`, `grid_size`,
//!   `particle_count` and every named control parameter)
//! - `read_base(coord)`: the variable's original, never-written seed texture
//! - `read_<name>(coord)`: previous generation of each declared dependency
//! - the helpers from [`crate::shader_utils`]
//!
//! Reads clamp `coord` into the grid, so neighbour lookups at the border are
//! safe. `update` only runs for texels below `params.particle_count`; the
//! padding at the end of the grid is never written.

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::SetupError;
use crate::shader_utils;
use crate::uniforms::ControlParams;

/// Workgroup edge length of the update kernel.
pub const WORKGROUP_SIZE: u32 = 8;

/// The flow-field particle program.
///
/// Expects a self-dependent variable named `particles` and the control
/// parameters `influence`, `strength` and `frequency`.
pub const FLOW_FIELD_PROGRAM: &str = include_str!("shaders/flow_update.wgsl");

/// Compose the complete compute shader for one variable.
pub fn compose_update_shader(
    program: &str,
    dependencies: &[String],
    params: &ControlParams,
    lock_seed_channel: bool,
) -> String {
    let mut code = params.to_wgsl_struct();
    code.push_str(
        r#"
@group(0) @binding(0)
var<uniform> params: SimParams;

@group(0) @binding(1)
var next_state: texture_storage_2d<rgba32float, write>;

@group(0) @binding(2)
var base_state: texture_2d<f32>;
"#,
    );

    for (i, dep) in dependencies.iter().enumerate() {
        code.push_str(&format!(
            "\n@group(0) @binding({})\nvar state_{dep}: texture_2d<f32>;\n",
            3 + i
        ));
    }

    code.push_str(
        r#"
fn clamp_coord(coord: vec2<i32>) -> vec2<i32> {
    let last = i32(params.grid_size) - 1;
    return clamp(coord, vec2<i32>(0), vec2<i32>(last));
}

fn read_base(coord: vec2<i32>) -> vec4<f32> {
    return textureLoad(base_state, clamp_coord(coord), 0);
}
"#,
    );

    for dep in dependencies {
        code.push_str(&format!(
            "\nfn read_{dep}(coord: vec2<i32>) -> vec4<f32> {{\n    return textureLoad(state_{dep}, clamp_coord(coord), 0);\n}}\n"
        ));
    }

    code.push('\n');
    code.push_str(&shader_utils::all_utils_wgsl());
    code.push('\n');
    code.push_str(program);

    let store = if lock_seed_channel {
        "vec4<f32>(state.xyz, read_base(coord).w)"
    } else {
        "state"
    };

    code.push_str(&format!(
        r#"

@compute @workgroup_size({WORKGROUP_SIZE}, {WORKGROUP_SIZE})
fn main(@builtin(global_invocation_id) id: vec3<u32>) {{
    if id.x >= params.grid_size || id.y >= params.grid_size {{
        return;
    }}
    // Padding texels keep their seeded value
    if id.y * params.grid_size + id.x >= params.particle_count {{
        return;
    }}
    let coord = vec2<i32>(id.xy);
    let uv = (vec2<f32>(id.xy) + 0.5) / f32(params.grid_size);
    let state = update(coord, uv);
    textureStore(next_state, coord, {store});
}}
"#
    ));

    code
}

/// Parse and validate WGSL, returning the error text on failure.
pub fn validate_wgsl(source: &str, label: &str) -> Result<(), SetupError> {
    let module = wgsl::parse_str(source).map_err(|err| SetupError::ShaderCompile {
        label: label.to_string(),
        message: err.emit_to_string(source),
    })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|err| SetupError::ShaderCompile {
            label: label.to_string(),
            message: format!("{}", err),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_params() -> ControlParams {
        ControlParams::new()
            .with("influence", 0.2f32)
            .with("strength", 4.0f32)
            .with("frequency", 0.5f32)
    }

    #[test]
    fn test_flow_program_composes_and_validates() {
        let code = compose_update_shader(FLOW_FIELD_PROGRAM, &["particles".to_string()], &flow_params(), true);
        assert!(code.contains("fn read_particles("));
        assert!(code.contains("read_base(coord).w"));
        validate_wgsl(&code, "flow").unwrap();
    }

    #[test]
    fn test_missing_parameter_fails_validation() {
        let params = ControlParams::new().with("influence", 0.2f32);
        let code = compose_update_shader(FLOW_FIELD_PROGRAM, &["particles".to_string()], &params, true);
        let err = validate_wgsl(&code, "flow").unwrap_err();
        assert!(matches!(err, SetupError::ShaderCompile { .. }));
    }

    #[test]
    fn test_garbage_program_fails() {
        let code = compose_update_shader("fn update(", &[], &ControlParams::new(), false);
        assert!(validate_wgsl(&code, "garbage").is_err());
    }

    #[test]
    fn test_unlocked_program_stores_state_directly() {
        let program = r#"
fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> {
    return vec4<f32>(uv, params.time, 1.0);
}
"#;
        let code = compose_update_shader(program, &[], &ControlParams::new(), false);
        assert!(code.contains("textureStore(next_state, coord, state);"));
        validate_wgsl(&code, "uv").unwrap();
    }
}
