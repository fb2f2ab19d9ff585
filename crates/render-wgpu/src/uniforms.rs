use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use range_render::{ShaderBinding, UniformValue};

/// Per-draw uniform block, laid out to match `Draw` in the WGSL source.
///
/// Every named uniform a [`ShaderBinding`] can carry maps onto one field here.
/// Names the scene never sets are ignored.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    pub color: [f32; 4],
    /// x: shininess, y: textured, z: held item lighting.
    pub material: [f32; 4],
    pub dir_direction: [f32; 4],
    pub dir_ambient: [f32; 4],
    pub dir_diffuse: [f32; 4],
    pub dir_specular: [f32; 4],
    pub fill_direction: [f32; 4],
    pub fill_ambient: [f32; 4],
    pub fill_diffuse: [f32; 4],
    pub fill_specular: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    pub spot_ambient: [f32; 4],
    pub spot_diffuse: [f32; 4],
    pub spot_specular: [f32; 4],
    /// x: inner cosine, y: outer cosine, z: lamp on.
    pub spot_cone: [f32; 4],
    /// x: constant, y: linear, z: quadratic.
    pub spot_attenuation: [f32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            projection: identity,
            view: identity,
            model: identity,
            normal: identity,
            color: [1.0; 4],
            ..Self::zeroed()
        }
    }
}

impl DrawUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_binding(binding: &ShaderBinding) -> Self {
        let mut out = Self::default();
        for (name, value) in binding.uniforms() {
            out.assign(name, *value);
        }
        if binding.texture().is_some() {
            out.material[1] = 1.0;
        }
        out
    }

    fn assign(&mut self, name: &str, value: UniformValue) {
        match (name.split_once('.'), value) {
            (None, UniformValue::Mat4(m)) => match name {
                "projection" => self.projection = m.to_cols_array_2d(),
                "view" => self.view = m.to_cols_array_2d(),
                "model" => self.model = m.to_cols_array_2d(),
                _ => {}
            },
            (None, UniformValue::Mat3(m)) if name == "invNormal" => {
                self.normal = Mat4::from_mat3(m).to_cols_array_2d();
            }
            (None, UniformValue::Vec3(v)) => match name {
                "viewPos" => self.view_pos = vec4(v),
                "color" => self.color = [v.x, v.y, v.z, 1.0],
                _ => {}
            },
            (None, UniformValue::Float(f)) if name == "shininess" => self.material[0] = f,
            (Some(("dirlight" | "scene_dirlight", field)), UniformValue::Vec3(v)) => match field {
                "direction" => self.dir_direction = vec4(v),
                "ambient" => self.dir_ambient = vec4(v),
                "diffuse" => self.dir_diffuse = vec4(v),
                "specular" => self.dir_specular = vec4(v),
                _ => {}
            },
            (Some(("rifle_dirlight", field)), UniformValue::Vec3(v)) => {
                self.material[2] = 1.0;
                match field {
                    "direction" => self.fill_direction = vec4(v),
                    "ambient" => self.fill_ambient = vec4(v),
                    "diffuse" => self.fill_diffuse = vec4(v),
                    "specular" => self.fill_specular = vec4(v),
                    _ => {}
                }
            }
            (Some(("spotlight", field)), value) => self.assign_spotlight(field, value),
            _ => {}
        }
    }

    fn assign_spotlight(&mut self, field: &str, value: UniformValue) {
        match (field, value) {
            ("position", UniformValue::Vec3(v)) => self.spot_position = vec4(v),
            ("direction", UniformValue::Vec3(v)) => self.spot_direction = vec4(v),
            ("ambient", UniformValue::Vec3(v)) => self.spot_ambient = vec4(v),
            ("diffuse", UniformValue::Vec3(v)) => self.spot_diffuse = vec4(v),
            ("specular", UniformValue::Vec3(v)) => self.spot_specular = vec4(v),
            ("inner_cut_off", UniformValue::Float(f)) => self.spot_cone[0] = f,
            ("outer_cut_off", UniformValue::Float(f)) => self.spot_cone[1] = f,
            ("lamp_on", UniformValue::Int(i)) => self.spot_cone[2] = if i != 0 { 1.0 } else { 0.0 },
            ("constant", UniformValue::Float(f)) => self.spot_attenuation[0] = f,
            ("linear", UniformValue::Float(f)) => self.spot_attenuation[1] = f,
            ("quadratic", UniformValue::Float(f)) => self.spot_attenuation[2] = f,
            _ => {}
        }
    }
}

fn vec4(v: Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

/// Round `size` up to a multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}
