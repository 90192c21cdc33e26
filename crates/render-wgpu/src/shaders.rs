/// WGSL shader for lit, optionally textured meshes.
///
/// Group 0 holds per-frame camera and light data, group 1 the material.
/// Every map is always bound (1x1 defaults stand in for missing ones), and
/// all samples happen in uniform control flow.
pub const MESH_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    light_direction: vec4<f32>,
    light_radiance: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct MaterialUniforms {
    color: vec4<f32>,
    // x: roughness, y: metalness, z: normal map bound, w: alpha map bound
    params: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> material: MaterialUniforms;
@group(1) @binding(1)
var material_sampler: sampler;
@group(1) @binding(2)
var color_map: texture_2d<f32>;
@group(1) @binding(3)
var normal_map: texture_2d<f32>;
@group(1) @binding(4)
var ao_map: texture_2d<f32>;
@group(1) @binding(5)
var roughness_map: texture_2d<f32>;
@group(1) @binding(6)
var alpha_map: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

// Tangent frame from screen-space derivatives, so meshes need no tangents.
fn perturb_normal(n: vec3<f32>, p: vec3<f32>, uv: vec2<f32>, map: vec3<f32>) -> vec3<f32> {
    let dp1 = dpdx(p);
    let dp2 = dpdy(p);
    let duv1 = dpdx(uv);
    let duv2 = dpdy(uv);
    let dp2perp = cross(dp2, n);
    let dp1perp = cross(n, dp1);
    let t = dp2perp * duv1.x + dp1perp * duv2.x;
    let b = dp2perp * duv1.y + dp1perp * duv2.y;
    let scale = inverseSqrt(max(max(dot(t, t), dot(b, b)), 1e-12));
    let tbn = mat3x3<f32>(t * scale, b * scale, n);
    return normalize(tbn * (map * 2.0 - 1.0));
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    // Mesh UVs have v pointing up; texture rows start at the top.
    let st = vec2<f32>(in.uv.x, 1.0 - in.uv.y);
    let base = textureSample(color_map, material_sampler, st) * material.color;
    let ao = textureSample(ao_map, material_sampler, st).r;
    let rough_sample = textureSample(roughness_map, material_sampler, st).g;
    let alpha_sample = textureSample(alpha_map, material_sampler, st).g;
    let normal_sample = textureSample(normal_map, material_sampler, st).xyz;

    let geometric = select(-normalize(in.world_normal), normalize(in.world_normal), front);
    let mapped = perturb_normal(geometric, in.world_position, in.uv, normal_sample);
    let n = select(geometric, mapped, material.params.z > 0.5);

    let roughness = clamp(material.params.x * rough_sample, 0.04, 1.0);
    let l = -normalize(frame.light_direction.xyz);
    let v = normalize(frame.camera_position.xyz - in.world_position);
    let h = normalize(l + v);
    let n_dot_l = max(dot(n, l), 0.0);
    let r4 = roughness * roughness * roughness * roughness;
    let shininess = max(2.0 / r4 - 2.0, 1.0);
    let specular = pow(max(dot(n, h), 0.0), shininess) * (1.0 - roughness) * n_dot_l;

    let diffuse = base.rgb * (1.0 - material.params.y);
    let lit = diffuse * (frame.ambient.rgb * ao + frame.light_radiance.rgb * n_dot_l)
        + frame.light_radiance.rgb * specular;
    let alpha = base.a * select(1.0, alpha_sample, material.params.w > 0.5);
    return vec4<f32>(lit, alpha);
}
"#;

/// WGSL shader that copies the offscreen scene target onto the window
/// surface with a single fullscreen triangle.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var source: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitOutput;
    out.clip_position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(source, source_sampler, in.uv);
}
"#;
