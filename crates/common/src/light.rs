use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Directional (sun/moon) light parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirectionalLight {
    /// Dim night light over the whole range.
    pub fn scene() -> Self {
        Self {
            direction: Vec3::new(-0.5, -2.5, -5.0),
            ambient: Vec3::splat(0.08),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(0.5),
        }
    }

    /// Fill light used only for the first-person rifle.
    pub fn rifle() -> Self {
        Self {
            direction: Vec3::new(0.5, -0.7, -0.3),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.55),
            specular: Vec3::splat(0.5),
        }
    }
}

/// Spotlight intensity presets selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotlightPreset {
    Soft,
    Bright,
}

/// Flashlight attached to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Cosine of the inner cone angle.
    pub inner_cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub lamp_on: bool,
}

impl Default for SpotLight {
    fn default() -> Self {
        let mut light = Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            inner_cut_off: 10.5_f32.to_radians().cos(),
            outer_cut_off: 12.0_f32.to_radians().cos(),
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
            lamp_on: false,
        };
        light.apply_preset(SpotlightPreset::Soft);
        light
    }
}

impl SpotLight {
    pub fn apply_preset(&mut self, preset: SpotlightPreset) {
        let (intensity, linear, quadratic) = match preset {
            SpotlightPreset::Soft => (0.6, 0.22, 0.20),
            SpotlightPreset::Bright => (1.0, 0.09, 0.032),
        };
        self.diffuse = Vec3::splat(intensity);
        self.specular = Vec3::splat(intensity);
        self.linear = linear;
        self.quadratic = quadratic;
    }

    /// Place the light at `position` shining along `direction`.
    pub fn follow(&mut self, position: Vec3, direction: Vec3) {
        self.position = position;
        self.direction = direction;
    }

    pub fn toggle(&mut self) -> bool {
        self.lamp_on = !self.lamp_on;
        self.lamp_on
    }
}
