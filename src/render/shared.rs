/// Lit emblem shader: one directional key light plus an ambient floor. The
/// tint alpha carries the reveal fade.
pub(crate) const EMBLEM_SHADER: &str = r#"
struct EmblemUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    light: vec4<f32>,
    tint: vec4<f32>,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> emblem: EmblemUniform;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world_pos = emblem.model * vec4<f32>(input.position, 1.0);
    output.position = emblem.view_proj * world_pos;
    let basis = mat3x3<f32>(
        emblem.normal[0].xyz,
        emblem.normal[1].xyz,
        emblem.normal[2].xyz,
    );
    output.normal = normalize(basis * input.normal);
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(emblem.light.xyz);
    let normal = normalize(input.normal);
    let diffuse = max(dot(normal, light_dir), 0.0);
    let ambient = 0.2;
    let intensity = emblem.light.w;
    let lit = (ambient + diffuse * intensity) * emblem.tint.rgb;
    return vec4<f32>(lit, emblem.tint.a);
}
"#;

/// Particle billboard shader. Each instance is one particle; the corner
/// attribute expands it to a camera-facing quad in view space, so quad size
/// is fixed in world units and shrinks with distance like a sized point.
/// Layers fade by alpha cut plus additive blending, never the depth buffer.
pub(crate) const SKY_SHADER: &str = r#"
struct SkyGlobals {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    reveal: vec4<f32>,
}

struct LayerUniform {
    orientation: mat4x4<f32>,
    tuning: vec4<f32>,
}

struct VertexInput {
    @location(0) corner: vec2<f32>,
    @location(1) center: vec3<f32>,
    @location(2) color: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> sky: SkyGlobals;
@group(0) @binding(1)
var sprite_texture: texture_2d<f32>;
@group(0) @binding(2)
var sprite_sampler: sampler;

@group(1) @binding(0)
var<uniform> layer: LayerUniform;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    var view_pos = sky.view * layer.orientation * vec4<f32>(input.center, 1.0);
    let half_size = layer.tuning.x * 0.5;
    view_pos = vec4<f32>(view_pos.xy + input.corner * half_size, view_pos.zw);
    output.position = sky.proj * view_pos;
    output.uv = input.corner * 0.5 + vec2<f32>(0.5, 0.5);
    output.color = input.color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let sample = textureSample(sprite_texture, sprite_sampler, input.uv);
    let alpha = sample.a * layer.tuning.y;
    if (alpha < layer.tuning.z) {
        discard;
    }
    return vec4<f32>(input.color * sample.rgb, alpha * sky.reveal.x);
}
"#;

/// Two-triangle billboard in corner space, counter-clockwise.
pub(crate) const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];
