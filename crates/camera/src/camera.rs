use glam::{Mat4, Vec3};
use range_common::{Directions, Ray};
use serde::{Deserialize, Serialize};

const WORLD_UP: Vec3 = Vec3::Y;

/// Height above the ground at which a descending jump counts as landed.
/// Absorbs the rounding left over after integrating a full arc in steps.
pub const LANDING_EPSILON: f32 = 1e-5;

/// Tunables for the first-person camera. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub start_position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Degrees per unit of mouse motion.
    pub sensitivity: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    /// Upward velocity applied when a jump starts.
    pub jump_velocity: f32,
    /// Downward acceleration while airborne.
    pub gravity: f32,
    /// Height the camera lands on.
    pub ground_height: f32,
    pub pitch_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: Vec3::new(0.0, 0.0, 5.0),
            yaw: -90.0,
            pitch: 0.0,
            sensitivity: 0.1,
            walk_speed: 2.5,
            run_speed: 5.0,
            jump_velocity: 3.0,
            gravity: 9.8,
            ground_height: 0.0,
            pitch_limit: 89.0,
        }
    }
}

/// Discrete movement speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedLevel {
    #[default]
    Walk,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Grounded,
    Jumping,
}

/// Camera pose. Mutated only through [`CameraController`].
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    speed: SpeedLevel,
    vertical_velocity: f32,
    jumping: bool,
}

impl Camera {
    fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw,
            pitch,
            speed: SpeedLevel::Walk,
            vertical_velocity: 0.0,
            jumping: false,
        };
        camera.update_basis();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn speed(&self) -> SpeedLevel {
        self.speed
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Ray from the eye along the view direction.
    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.front)
    }

    fn update_basis(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

/// Drives a [`Camera`] from mouse deltas, movement directions and jump requests.
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: Camera,
    config: CameraConfig,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        let limit = pitch_limit(&config);
        let pitch = config.pitch.clamp(-limit, limit);
        let camera = Camera::new(config.start_position, config.yaw, pitch);
        Self { camera, config }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Apply a mouse delta. Positive `dy` pitches up.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let s = self.config.sensitivity;
        let limit = pitch_limit(&self.config);
        let cam = &mut self.camera;
        cam.yaw += dx * s;
        cam.pitch = (cam.pitch + dy * s).clamp(-limit, limit);
        cam.update_basis();
    }

    /// Ground-locked movement: the vertical part of front/right is ignored.
    ///
    /// Held directions add up, so a diagonal covers more ground per second
    /// than a single axis.
    pub fn move_camera(&mut self, directions: Directions, dt: f32) {
        if directions.is_empty() {
            return;
        }
        let velocity = self.speed_value() * dt;
        let flat_front = Vec3::new(self.camera.front.x, 0.0, self.camera.front.z).normalize_or_zero();
        let flat_right = Vec3::new(self.camera.right.x, 0.0, self.camera.right.z).normalize_or_zero();

        let mut step = Vec3::ZERO;
        if directions.forward {
            step += flat_front;
        }
        if directions.backward {
            step -= flat_front;
        }
        if directions.right {
            step += flat_right;
        }
        if directions.left {
            step -= flat_right;
        }
        self.camera.position += step * velocity;
    }

    /// Leave the ground. Returns `false` if already airborne.
    pub fn start_jump(&mut self) -> bool {
        if self.camera.jumping {
            return false;
        }
        self.camera.jumping = true;
        self.camera.vertical_velocity = self.config.jump_velocity;
        tracing::debug!(velocity = self.config.jump_velocity, "jump started");
        true
    }

    /// Advance an ongoing jump by `dt`. Does nothing while grounded.
    ///
    /// Returns `true` on the frame the camera lands.
    pub fn update_jump(&mut self, dt: f32) -> bool {
        let cam = &mut self.camera;
        if !cam.jumping {
            return false;
        }
        let g = self.config.gravity;
        cam.position.y += cam.vertical_velocity * dt - 0.5 * g * dt * dt;
        cam.vertical_velocity -= g * dt;

        let descending = cam.vertical_velocity < 0.0;
        if descending && cam.position.y <= self.config.ground_height + LANDING_EPSILON {
            cam.position.y = self.config.ground_height;
            cam.vertical_velocity = 0.0;
            cam.jumping = false;
            tracing::debug!(y = cam.position.y, "landed");
            return true;
        }
        false
    }

    pub fn set_speed(&mut self, level: SpeedLevel) {
        if self.camera.speed != level {
            tracing::debug!(?level, "speed changed");
        }
        self.camera.speed = level;
    }

    pub fn motion_state(&self) -> MotionState {
        if self.camera.jumping {
            MotionState::Jumping
        } else {
            MotionState::Grounded
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera.view_matrix()
    }

    fn speed_value(&self) -> f32 {
        match self.camera.speed {
            SpeedLevel::Walk => self.config.walk_speed,
            SpeedLevel::Run => self.config.run_speed,
        }
    }
}

/// `f32::clamp` panics on a negative or NaN bound.
fn pitch_limit(config: &CameraConfig) -> f32 {
    let limit = config.pitch_limit.abs();
    if limit.is_nan() { 0.0 } else { limit }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(cam: &Camera) {
        let (f, r, u) = (cam.front(), cam.right(), cam.up());
        for v in [f, r, u] {
            assert!((v.length() - 1.0).abs() < EPS, "not unit: {v:?}");
        }
        assert!(f.dot(r).abs() < EPS);
        assert!(f.dot(u).abs() < EPS);
        assert!(r.dot(u).abs() < EPS);
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let ctl = CameraController::default();
        let cam = ctl.camera();
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 5.0));
        assert!((cam.front() - Vec3::NEG_Z).length() < EPS);
        assert!((cam.right() - Vec3::X).length() < EPS);
        assert!((cam.up() - Vec3::Y).length() < EPS);
        assert_eq!(ctl.motion_state(), MotionState::Grounded);
    }

    #[test]
    fn basis_stays_orthonormal_across_rotations() {
        let mut ctl = CameraController::default();
        let deltas = [(13.0, 7.0), (-400.0, 250.0), (90.0, -900.0), (0.5, 0.25), (3600.0, 1.0)];
        for (dx, dy) in deltas {
            ctl.rotate(dx, dy);
            assert_orthonormal(ctl.camera());
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let mut ctl = CameraController::default();
        for _ in 0..100 {
            ctl.rotate(0.0, 1000.0);
        }
        assert_eq!(ctl.camera().pitch(), 89.0);
        assert_orthonormal(ctl.camera());
        for _ in 0..100 {
            ctl.rotate(0.0, -1000.0);
        }
        assert_eq!(ctl.camera().pitch(), -89.0);
        assert_orthonormal(ctl.camera());
    }

    #[test]
    fn movement_ignores_pitch() {
        let mut ctl = CameraController::default();
        ctl.rotate(0.0, 600.0);
        let start = ctl.camera().position();
        ctl.move_camera(Directions::forward(), 1.0);
        let pos = ctl.camera().position();
        assert_eq!(pos.y, start.y);
        assert!(((pos - start).length() - 2.5).abs() < EPS);
        assert!(pos.z < start.z);
    }

    #[test]
    fn opposite_directions_cancel() {
        let mut ctl = CameraController::default();
        let start = ctl.camera().position();
        ctl.move_camera(Directions::forward().with(Directions::backward()), 1.0);
        assert!((ctl.camera().position() - start).length() < EPS);
    }

    #[test]
    fn diagonal_movement_is_not_normalized() {
        let mut ctl = CameraController::default();
        let start = ctl.camera().position();
        ctl.move_camera(Directions::forward().with(Directions::right()), 1.0);
        let dist = (ctl.camera().position() - start).length();
        assert!((dist - 2.5 * 2.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn run_speed_doubles_distance() {
        let mut ctl = CameraController::default();
        ctl.set_speed(SpeedLevel::Run);
        ctl.move_camera(Directions::left(), 0.5);
        let pos = ctl.camera().position();
        assert!((pos.x + 2.5).abs() < EPS);
        ctl.set_speed(SpeedLevel::Walk);
        assert_eq!(ctl.camera().speed(), SpeedLevel::Walk);
    }

    #[test]
    fn update_jump_is_noop_while_grounded() {
        let mut ctl = CameraController::default();
        let before = ctl.camera().clone();
        for _ in 0..10 {
            assert!(!ctl.update_jump(0.016));
        }
        assert_eq!(ctl.camera(), &before);
    }

    #[test]
    fn jump_lands_after_two_v0_over_g() {
        let mut ctl = CameraController::new(CameraConfig {
            jump_velocity: 4.0,
            gravity: 8.0,
            ..CameraConfig::default()
        });
        assert!(ctl.start_jump());
        assert!(!ctl.start_jump(), "second request while airborne must be ignored");

        // Apex at t = 0.5, landing at t = 2 * 4 / 8 = 1.0.
        let mut landed_at = None;
        for step in 1..=8 {
            if ctl.update_jump(0.25) {
                landed_at = Some(step as f32 * 0.25);
                break;
            }
            if step == 2 {
                assert!((ctl.camera().position().y - 1.0).abs() < EPS);
            }
        }
        assert_eq!(landed_at, Some(1.0));
        assert_eq!(ctl.camera().position().y, 0.0);
        assert_eq!(ctl.camera().vertical_velocity(), 0.0);
        assert_eq!(ctl.motion_state(), MotionState::Grounded);
    }

    #[test]
    fn jump_at_frame_rate_lands_near_expected_time() {
        let mut ctl = CameraController::default();
        ctl.start_jump();
        let dt = 1.0 / 60.0;
        let mut t = 0.0;
        while ctl.motion_state() == MotionState::Jumping {
            ctl.update_jump(dt);
            t += dt;
            assert!(t < 5.0, "jump never landed");
        }
        let expected = 2.0 * 3.0 / 9.8;
        assert!((t - expected).abs() <= dt + 1e-4, "landed at {t}, expected {expected}");
        assert_eq!(ctl.camera().position().y, 0.0);
    }

    #[test]
    fn jump_lands_on_the_step_that_completes_the_arc() {
        let airtime = 2.0 * 3.0 / 9.8;
        for steps in [1, 10, 37, 60, 144] {
            let mut ctl = CameraController::default();
            ctl.start_jump();
            let dt = airtime / steps as f32;
            for step in 1..steps {
                assert!(!ctl.update_jump(dt), "steps={steps}: landed early at step {step}");
            }
            assert!(ctl.update_jump(dt), "steps={steps}: y={}", ctl.camera().position().y);
            assert_eq!(ctl.motion_state(), MotionState::Grounded);
            assert_eq!(ctl.camera().position().y, 0.0);
        }
    }

    #[test]
    fn tiny_first_step_does_not_land() {
        let mut ctl = CameraController::default();
        ctl.start_jump();
        assert!(!ctl.update_jump(1e-7));
        assert_eq!(ctl.motion_state(), MotionState::Jumping);
    }

    #[test]
    fn bad_pitch_limit_does_not_panic() {
        for limit in [-45.0, f32::NAN] {
            let mut ctl = CameraController::new(CameraConfig {
                pitch: 30.0,
                pitch_limit: limit,
                ..CameraConfig::default()
            });
            ctl.rotate(0.0, 100.0);
            assert!(ctl.camera().pitch().is_finite());
        }
        let ctl = CameraController::new(CameraConfig {
            pitch: 80.0,
            pitch_limit: -45.0,
            ..CameraConfig::default()
        });
        assert_eq!(ctl.camera().pitch(), 45.0);
    }

    #[test]
    fn ray_follows_view_direction() {
        let mut ctl = CameraController::default();
        ctl.rotate(900.0, 0.0);
        let ray = ctl.camera().ray();
        assert_eq!(ray.origin, ctl.camera().position());
        assert!((ray.direction - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn view_matrix_maps_eye_to_origin() {
        let ctl = CameraController::default();
        let eye = ctl.view_matrix().transform_point3(ctl.camera().position());
        assert!(eye.length() < EPS);
    }
}
