use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Initial projection parameters. `fov_y` is in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
            width: 1280,
            height: 720,
        }
    }
}

/// Screen-space orthographic volume, kept in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

/// Perspective and orthographic parameters derived from the viewport.
///
/// Only [`Projection::on_resize`] and [`Projection::set_fov`] change state.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    fov_y: f32,
    width: u32,
    height: u32,
    near: f32,
    far: f32,
    ortho: OrthoBounds,
}

impl Projection {
    pub fn new(config: &ProjectionConfig) -> Self {
        let mut projection = Self {
            fov_y: config.fov_y,
            width: 1,
            height: 1,
            near: config.near,
            far: config.far,
            ortho: OrthoBounds {
                left: 0.0,
                right: 1.0,
                bottom: 0.0,
                top: 1.0,
                near: config.near,
                far: config.far,
            },
        };
        projection.on_resize(config.width, config.height);
        projection
    }

    /// Track a new viewport size. A zero dimension (minimized window) is ignored.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::trace!(width, height, "ignoring degenerate viewport");
            return;
        }
        self.width = width;
        self.height = height;
        self.ortho.right = width as f32;
        self.ortho.top = height as f32;
    }

    /// Field of view in degrees.
    pub fn set_fov(&mut self, fov_y: f32) {
        self.fov_y = fov_y.clamp(1.0, 179.0);
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn ortho_bounds(&self) -> OrthoBounds {
        self.ortho
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect(), self.near, self.far)
    }

    pub fn orthographic_matrix(&self) -> Mat4 {
        let o = self.ortho;
        Mat4::orthographic_rh(o.left, o.right, o.bottom, o.top, o.near, o.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(&ProjectionConfig::default())
    }
}
