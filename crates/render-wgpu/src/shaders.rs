/// WGSL shader for the car parts and ground plane.
///
/// Group 0 holds per-frame globals, group 1 the per-draw block selected with a
/// dynamic offset. `mode.x == 1u` picks the point light.
pub const SCENE_SHADER: &str = r#"
struct Globals {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    light_color: vec4<f32>,
    light_direction: vec4<f32>,
    light_position: vec4<f32>,
    ambient: vec4<f32>,
};

struct Draw {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    mode: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> draw: Draw;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = draw.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.proj * globals.view * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = (draw.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    var light_dir: vec3<f32>;
    if (draw.mode.x == 1u) {
        light_dir = normalize(globals.light_position.xyz - in.world_position);
    } else {
        light_dir = globals.light_direction.xyz;
    }
    let diffuse = max(dot(n, light_dir), 0.0);
    let lighting = globals.light_color.rgb * diffuse + globals.ambient.rgb;
    return vec4<f32>(draw.color.rgb * lighting, 1.0);
}
"#;
