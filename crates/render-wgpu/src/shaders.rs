/// WGSL source for every range pipeline.
///
/// `Draw` must stay in sync with `DrawUniforms`. Entry points:
/// `vs_model`/`vs_instanced` + `fs_lit` for lit geometry, `vs_flat` + `fs_flat`
/// for screen-space overlays.
pub const RANGE_SHADER: &str = r#"
struct Draw {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    view_pos: vec4<f32>,
    color: vec4<f32>,
    material: vec4<f32>,
    dir_direction: vec4<f32>,
    dir_ambient: vec4<f32>,
    dir_diffuse: vec4<f32>,
    dir_specular: vec4<f32>,
    fill_direction: vec4<f32>,
    fill_ambient: vec4<f32>,
    fill_diffuse: vec4<f32>,
    fill_specular: vec4<f32>,
    spot_position: vec4<f32>,
    spot_direction: vec4<f32>,
    spot_ambient: vec4<f32>,
    spot_diffuse: vec4<f32>,
    spot_specular: vec4<f32>,
    spot_cone: vec4<f32>,
    spot_attenuation: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Draw;

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

struct LitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

fn lit_vertex(model: mat4x4<f32>, normal_matrix: mat3x3<f32>, vertex: VertexInput) -> LitOutput {
    let world = model * vec4<f32>(vertex.position, 1.0);
    var out: LitOutput;
    out.clip_position = uniforms.projection * uniforms.view * world;
    out.frag_pos = world.xyz;
    out.normal = normal_matrix * vertex.normal;
    out.uv = vertex.uv;
    return out;
}

@vertex
fn vs_model(vertex: VertexInput) -> LitOutput {
    let n = mat3x3<f32>(uniforms.normal[0].xyz, uniforms.normal[1].xyz, uniforms.normal[2].xyz);
    return lit_vertex(uniforms.model, n, vertex);
}

@vertex
fn vs_instanced(vertex: VertexInput, instance: InstanceInput) -> LitOutput {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    let n = mat3x3<f32>(model[0].xyz, model[1].xyz, model[2].xyz);
    return lit_vertex(model, n, vertex);
}

fn directional(direction: vec3<f32>, ambient: vec3<f32>, diffuse: vec3<f32>, specular: vec3<f32>,
               normal: vec3<f32>, view_dir: vec3<f32>, base: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(-direction);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), max(uniforms.material.x, 1.0));
    return ambient * base + diffuse * diff * base + specular * spec * 0.5;
}

fn spotlight(normal: vec3<f32>, frag_pos: vec3<f32>, view_dir: vec3<f32>, base: vec3<f32>) -> vec3<f32> {
    let to_light = uniforms.spot_position.xyz - frag_pos;
    let light_dir = normalize(to_light);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), max(uniforms.material.x, 1.0));
    let distance = length(to_light);
    let att = uniforms.spot_attenuation;
    let attenuation = 1.0 / (att.x + att.y * distance + att.z * distance * distance);
    let theta = dot(light_dir, normalize(-uniforms.spot_direction.xyz));
    let epsilon = uniforms.spot_cone.x - uniforms.spot_cone.y;
    let intensity = clamp((theta - uniforms.spot_cone.y) / epsilon, 0.0, 1.0);
    let lit = uniforms.spot_diffuse.xyz * diff * base + uniforms.spot_specular.xyz * spec * 0.5;
    return (uniforms.spot_ambient.xyz * base + lit * intensity) * attenuation;
}

@fragment
fn fs_lit(in: LitOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let view_dir = normalize(uniforms.view_pos.xyz - in.frag_pos);
    var base = uniforms.color.rgb;
    if (uniforms.material.y > 0.5) {
        let checker = (i32(floor(in.uv.x * 4.0)) + i32(floor(in.uv.y * 4.0))) % 2;
        base = select(vec3<f32>(0.18, 0.42, 0.12), vec3<f32>(0.22, 0.48, 0.15), checker == 0);
    }
    var color = directional(uniforms.dir_direction.xyz, uniforms.dir_ambient.xyz, uniforms.dir_diffuse.xyz,
                            uniforms.dir_specular.xyz, normal, view_dir, base);
    if (uniforms.material.z > 0.5) {
        color += directional(uniforms.fill_direction.xyz, uniforms.fill_ambient.xyz, uniforms.fill_diffuse.xyz,
                             uniforms.fill_specular.xyz, normal, view_dir, base);
    } else if (uniforms.spot_cone.z > 0.5) {
        color += spotlight(normal, in.frag_pos, view_dir, base);
    }
    return vec4<f32>(color, 1.0);
}

@vertex
fn vs_flat(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_flat() -> @location(0) vec4<f32> {
    return uniforms.color;
}
"#;
