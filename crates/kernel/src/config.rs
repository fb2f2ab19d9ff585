//! Range configuration, loaded from YAML.
//!
//! `RangeConfig::default()` is the reference scenario: camera at (0, 0, 5),
//! five targets on the ground line and a grove of 34 trees.

use std::path::Path;

use glam::Vec3;
use range_assets::names;
use range_camera::{CameraConfig, ProjectionConfig};
use range_input::ActionMap;
use serde::{Deserialize, Serialize};

use crate::targets::HitPolicy;

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Mesh name shared by every target.
    pub model: String,
    pub positions: Vec<Vec3>,
    pub scale: f32,
    /// Seconds until a hit target comes back on its own. `None` waits for
    /// the awaken command.
    pub respawn_after: Option<f32>,
    pub hit_policy: HitPolicy,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            model: names::TARGET.to_string(),
            positions: vec![
                Vec3::new(-0.2, -0.5, 0.3),
                Vec3::new(2.0, -0.5, 1.2),
                Vec3::new(0.6, -0.5, 2.0),
                Vec3::new(-1.2, -0.5, -1.0),
                Vec3::new(1.3, -0.5, -1.5),
            ],
            scale: 1.0,
            respawn_after: None,
            hit_policy: HitPolicy::AllIntersecting,
        }
    }
}

/// Instanced scenery drawn from one mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub model: String,
    pub offsets: Vec<Vec3>,
    pub scale: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        const OFFSETS: [[f32; 2]; 34] = [
            [2.8, 0.0],
            [3.7, 0.2],
            [3.7, -0.4],
            [4.1, -1.0],
            [4.2, -0.8],
            [4.3, -1.3],
            [3.3, 1.1],
            [3.8, 1.4],
            [3.9, 1.8],
            [3.8, 2.2],
            [4.1, -1.7],
            [4.2, -2.0],
            [4.0, -2.3],
            [4.0, -1.8],
            [3.7, -2.9],
            [3.5, 3.1],
            [4.1, 3.5],
            [3.8, 3.9],
            [3.1, -3.6],
            [2.6, -4.0],
            [2.1, -4.1],
            [1.6, -3.7],
            [1.3, -3.9],
            [1.2, -2.9],
            [0.7, -4.0],
            [0.1, -3.4],
            [-0.4, -3.7],
            [-0.8, -4.0],
            [-1.5, -3.3],
            [-2.2, -3.8],
            [-2.8, -3.4],
            [-3.3, -3.4],
            [-4.0, -4.0],
            [-4.4, -3.5],
        ];
        Self {
            model: names::TREE.to_string(),
            offsets: OFFSETS.iter().map(|&[x, z]| Vec3::new(x, -0.5, z)).collect(),
            scale: 0.5,
        }
    }
}

/// Full configuration of a range session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub targets: TargetConfig,
    pub trees: TreeConfig,
    pub bindings: ActionMap,
}

impl RangeConfig {
    /// Load and validate a YAML file. Missing sections take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded range config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        positive("camera.sensitivity", cam.sensitivity)?;
        positive("camera.walk_speed", cam.walk_speed)?;
        positive("camera.run_speed", cam.run_speed)?;
        positive("camera.jump_velocity", cam.jump_velocity)?;
        positive("camera.gravity", cam.gravity)?;
        if !(0.0..90.0).contains(&cam.pitch_limit) || cam.pitch_limit == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.pitch_limit must be in (0, 90), got {}",
                cam.pitch_limit
            )));
        }

        let proj = &self.projection;
        positive("projection.near", proj.near)?;
        if proj.far <= proj.near {
            return Err(ConfigError::Invalid(format!(
                "projection.far ({}) must exceed projection.near ({})",
                proj.far, proj.near
            )));
        }
        if !(proj.fov_y > 0.0 && proj.fov_y < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "projection.fov_y must be in (0, 180), got {}",
                proj.fov_y
            )));
        }

        positive("targets.scale", self.targets.scale)?;
        if let Some(after) = self.targets.respawn_after {
            positive("targets.respawn_after", after)?;
        }
        positive("trees.scale", self.trees.scale)?;
        if self.trees.offsets.is_empty() {
            return Err(ConfigError::Invalid("trees.offsets must not be empty".into()));
        }
        Ok(())
    }
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be positive, got {value}")))
    }
}
