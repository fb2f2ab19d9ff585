use std::collections::BTreeMap;

use glam::{Mat3, Mat4, Vec3};
use range_assets::{ShaderHandle, TextureHandle};
use range_common::{DirectionalLight, SpotLight};

/// A value assignable to a named shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat3(Mat3),
    Vec3(Vec3),
    Int(i32),
    Float(f32),
}

/// A shader plus the uniform values and texture for one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderBinding {
    shader: ShaderHandle,
    uniforms: BTreeMap<String, UniformValue>,
    texture: Option<TextureHandle>,
}

impl ShaderBinding {
    pub fn new(shader: ShaderHandle) -> Self {
        Self {
            shader,
            uniforms: BTreeMap::new(),
            texture: None,
        }
    }

    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    pub fn set(&mut self, name: impl Into<String>, value: UniformValue) -> &mut Self {
        self.uniforms.insert(name.into(), value);
        self
    }

    pub fn set_mat4(&mut self, name: impl Into<String>, value: Mat4) -> &mut Self {
        self.set(name, UniformValue::Mat4(value))
    }

    pub fn set_mat3(&mut self, name: impl Into<String>, value: Mat3) -> &mut Self {
        self.set(name, UniformValue::Mat3(value))
    }

    pub fn set_vec3(&mut self, name: impl Into<String>, value: Vec3) -> &mut Self {
        self.set(name, UniformValue::Vec3(value))
    }

    pub fn set_int(&mut self, name: impl Into<String>, value: i32) -> &mut Self {
        self.set(name, UniformValue::Int(value))
    }

    pub fn set_float(&mut self, name: impl Into<String>, value: f32) -> &mut Self {
        self.set(name, UniformValue::Float(value))
    }

    pub fn bind_texture(&mut self, texture: TextureHandle) -> &mut Self {
        self.texture = Some(texture);
        self
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        match self.get(name)? {
            UniformValue::Mat4(m) => Some(m),
            _ => None,
        }
    }

    pub fn mat3(&self, name: &str) -> Option<Mat3> {
        match self.get(name)? {
            UniformValue::Mat3(m) => Some(m),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            UniformValue::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Iterate uniforms in name order.
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A struct uploaded as a group of uniforms named `"{prefix}.{field}"`.
pub trait UniformBlock {
    fn apply(&self, binding: &mut ShaderBinding, prefix: &str);
}

impl UniformBlock for DirectionalLight {
    fn apply(&self, binding: &mut ShaderBinding, prefix: &str) {
        binding
            .set_vec3(format!("{prefix}.direction"), self.direction)
            .set_vec3(format!("{prefix}.ambient"), self.ambient)
            .set_vec3(format!("{prefix}.diffuse"), self.diffuse)
            .set_vec3(format!("{prefix}.specular"), self.specular);
    }
}

impl UniformBlock for SpotLight {
    fn apply(&self, binding: &mut ShaderBinding, prefix: &str) {
        binding
            .set_vec3(format!("{prefix}.position"), self.position)
            .set_vec3(format!("{prefix}.direction"), self.direction)
            .set_vec3(format!("{prefix}.ambient"), self.ambient)
            .set_vec3(format!("{prefix}.diffuse"), self.diffuse)
            .set_vec3(format!("{prefix}.specular"), self.specular)
            .set_float(format!("{prefix}.inner_cut_off"), self.inner_cut_off)
            .set_float(format!("{prefix}.outer_cut_off"), self.outer_cut_off)
            .set_float(format!("{prefix}.constant"), self.constant)
            .set_float(format!("{prefix}.linear"), self.linear)
            .set_float(format!("{prefix}.quadratic"), self.quadratic)
            .set_int(format!("{prefix}.lamp_on"), i32::from(self.lamp_on));
    }
}
