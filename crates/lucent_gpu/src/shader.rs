//! WGSL source for the lens pipeline
//!
//! One full-target quad per draw. The fragment stage works in pixel space of
//! the background bitmap:
//!
//! 1. signed distance to the lens shape (circle or rounded rect)
//! 2. 1px anti-aliased inside mask
//! 3. edge weight that is ~0 at the centre and rises sharply near the rim
//! 4. per-channel refraction offsets for chromatic fringing at the edge
//! 5. rim highlight and a faint 1px border stroke

/// Lens shader (vertex `vs_main`, fragment `fs_main`)
pub const LENS_SHADER: &str = r#"
struct LensUniforms {
    size: vec2<f32>,
    center: vec2<f32>,
    refraction: f32,
    chroma: f32,
    rim_thickness: f32,
    rim_strength: f32,
    alpha: f32,
    brightness_boost: f32,
    shape_type: u32,
    corner_radius: f32,
    edge_start: f32,
    edge_exponent: f32,
    _pad: vec2<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: LensUniforms;
@group(0) @binding(1) var background: texture_2d<f32>;
@group(0) @binding(2) var background_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var quad = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let uv = quad[vertex_index];

    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

// Rounded box SDF; radius is clamped so the shape degrades to a capsule
fn sd_rounded_rect(p: vec2<f32>, half_size: vec2<f32>, radius: f32) -> f32 {
    let r = min(radius, min(half_size.x, half_size.y));
    let q = abs(p) - half_size + vec2<f32>(r);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - r;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let size = uniforms.size;
    let p = in.uv * size;
    let to_center = p - uniforms.center * size;

    // Edge weight: ~0 in the middle, rising steeply toward the rim
    let falloff_radius = max(min(size.x, size.y) * 0.5, 1.0);
    let nd = clamp(length(to_center) / falloff_radius, 0.0, 1.0);
    let edge = pow(smoothstep(uniforms.edge_start, 1.0, nd), uniforms.edge_exponent);

    let dir = normalize(to_center + vec2<f32>(1e-5));
    let offset_g = dir * (edge * uniforms.refraction * falloff_radius);
    let chroma_k = edge * uniforms.chroma;
    let offset_r = offset_g * (1.0 + chroma_k);
    let offset_b = offset_g * (1.0 - chroma_k);

    let sample_g = textureSample(background, background_sampler, (p + offset_g) / size);
    let sample_r = textureSample(background, background_sampler, (p + offset_r) / size);
    let sample_b = textureSample(background, background_sampler, (p + offset_b) / size);

    var dist: f32;
    if (uniforms.shape_type == 0u) {
        dist = length(to_center) - min(size.x, size.y) * 0.5;
    } else {
        let half_size = max(size * 0.5 - vec2<f32>(1.0), vec2<f32>(0.0));
        dist = sd_rounded_rect(to_center, half_size, uniforms.corner_radius);
    }

    let inside = 1.0 - smoothstep(-1.0, 0.0, dist);

    var rgb = vec3<f32>(sample_r.r, sample_g.g, sample_b.b);

    // Milky lift, stronger while the lens is moving fast
    let lift = clamp(0.04 + uniforms.brightness_boost * 0.35, 0.0, 0.145);
    rgb = rgb + (vec3<f32>(1.0) - rgb) * lift;

    rgb = rgb * inside;
    var alpha = inside * uniforms.alpha;

    let edge_abs = abs(dist);
    let rim = (1.0 - smoothstep(0.0, max(uniforms.rim_thickness, 1e-4), edge_abs)) * uniforms.rim_strength;
    rgb = rgb + vec3<f32>(1.05, 1.05, 1.10) * rim * inside;

    let border = 1.0 - smoothstep(0.0, 1.0, edge_abs);
    let border_mix = 0.10 * border * uniforms.alpha;
    rgb = mix(rgb, vec3<f32>(0.92, 0.96, 1.0), vec3<f32>(border_mix));
    alpha = max(alpha, border_mix);

    if (alpha <= 0.001) {
        return vec4<f32>(0.0);
    }
    return vec4<f32>(rgb, alpha);
}
"#;

/// Parse and validate [`LENS_SHADER`] with naga.
///
/// Surfaces WGSL mistakes as readable messages before the source reaches the
/// device, where they would only show up as an uncaptured validation error.
pub fn validate_lens_shader() -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(LENS_SHADER)
        .map_err(|e| e.emit_to_string(LENS_SHADER))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| format!("{e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lens_shader_validates() {
        if let Err(e) = validate_lens_shader() {
            panic!("lens shader failed validation:\n{e}");
        }
    }

    #[test]
    fn lens_shader_declares_expected_entry_points() {
        let module = naga::front::wgsl::parse_str(LENS_SHADER).expect("parse");
        let names: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"vs_main"));
        assert!(names.contains(&"fs_main"));
    }

    #[test]
    fn uniform_struct_size_matches_rust_layout() {
        let module = naga::front::wgsl::parse_str(LENS_SHADER).expect("parse");
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, t)| t.name.as_deref() == Some("LensUniforms"))
            .expect("LensUniforms type");
        match &ty.inner {
            naga::TypeInner::Struct { span, .. } => {
                assert_eq!(*span as usize, std::mem::size_of::<crate::LensUniforms>());
            }
            other => panic!("unexpected type {other:?}"),
        }
    }
}
