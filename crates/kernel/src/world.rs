use glam::Vec3;
use range_assets::{AssetError, AssetService, MeshHandle};
use range_camera::{CameraController, MotionState, Projection, SpeedLevel};
use range_common::{DirectionalLight, Ray, SpotLight, SpotlightPreset};
use range_input::{Action, InputSource};
use range_render::FrameContext;

use crate::config::{ConfigError, RangeConfig};
use crate::targets::{TargetId, TargetSet};

/// Errors building a [`RangeWorld`].
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("asset lookup failed: {0}")]
    Asset(#[from] AssetError),
}

/// A record of every state change a frame made.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeEvent {
    CursorToggled { captured: bool },
    TargetsAwakened { count: usize },
    LampToggled { on: bool },
    PresetSelected(SpotlightPreset),
    SpeedChanged(SpeedLevel),
    JumpStarted,
    Landed,
    TargetRespawned(TargetId),
    /// A shot was fired; `hits` lists the targets it took down.
    Shot { hits: Vec<TargetId> },
    Resized { width: u32, height: u32 },
}

/// What the host loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Exit,
}

/// Range state and the per-frame update that drives it.
///
/// # Invariants
/// - Within a frame the camera settles before the ray is built, and target
///   bounds are refit before any hit test.
/// - Exit is decided before any mutation, so a quitting frame changes nothing.
/// - Every mutation appends a [`RangeEvent`].
#[derive(Debug, Clone)]
pub struct RangeWorld {
    config: RangeConfig,
    camera: CameraController,
    projection: Projection,
    targets: TargetSet,
    target_model: MeshHandle,
    scene_light: DirectionalLight,
    rifle_light: DirectionalLight,
    spotlight: SpotLight,
    ray: Ray,
    cursor_captured: bool,
    frame: u64,
    event_log: Vec<RangeEvent>,
}

impl RangeWorld {
    /// Build the range: camera at its start pose, targets spawned inactive.
    pub fn new(config: RangeConfig, assets: &dyn AssetService) -> Result<Self, SceneError> {
        config.validate()?;

        let camera = CameraController::new(config.camera.clone());
        let projection = Projection::new(&config.projection);
        let target_model = assets.mesh(&config.targets.model)?;
        let mut targets = TargetSet::new(config.targets.hit_policy, config.targets.respawn_after);
        targets.spawn_all(
            assets,
            target_model,
            &config.targets.positions,
            config.targets.scale,
        )?;

        let mut spotlight = SpotLight::default();
        spotlight.follow(camera.camera().position(), camera.camera().front());
        let ray = camera.camera().ray();

        tracing::info!(
            targets = targets.len(),
            trees = config.trees.offsets.len(),
            "range initialized"
        );

        Ok(Self {
            config,
            camera,
            projection,
            targets,
            target_model,
            scene_light: DirectionalLight::scene(),
            rifle_light: DirectionalLight::rifle(),
            spotlight,
            ray,
            cursor_captured: true,
            frame: 0,
            event_log: Vec::new(),
        })
    }

    /// Run one frame against `input`.
    pub fn frame(&mut self, input: &dyn InputSource) -> FrameOutcome {
        let actions = self.config.bindings.actions(input);
        if actions.contains(&Action::Quit) {
            tracing::info!(frame = self.frame, "exit requested");
            return FrameOutcome::Exit;
        }

        self.frame += 1;
        let _span = tracing::trace_span!("frame", n = self.frame).entered();
        let dt = input.dt();

        for action in &actions {
            match *action {
                Action::ToggleCursor => {
                    self.cursor_captured = !self.cursor_captured;
                    self.log(RangeEvent::CursorToggled {
                        captured: self.cursor_captured,
                    });
                }
                Action::AwakenTargets => {
                    let count = self.targets.activate_all();
                    self.targets.recompute_bounds();
                    tracing::info!(count, "targets awakened");
                    self.log(RangeEvent::TargetsAwakened { count });
                }
                Action::ToggleLamp => {
                    let on = self.spotlight.toggle();
                    tracing::debug!(on, "lamp toggled");
                    self.log(RangeEvent::LampToggled { on });
                }
                Action::SelectPreset(preset) => {
                    self.spotlight.apply_preset(preset);
                    self.log(RangeEvent::PresetSelected(preset));
                }
                Action::Quit | Action::Run | Action::Walk | Action::Jump | Action::Fire => {}
            }
        }

        self.update_camera(input, &actions, dt);

        let cam = self.camera.camera();
        self.spotlight.follow(cam.position(), cam.front());
        self.ray = cam.ray();

        for id in self.targets.update(dt) {
            tracing::debug!(target_id = %id, "target respawned");
            self.log(RangeEvent::TargetRespawned(id));
        }
        self.targets.recompute_bounds();

        if actions.contains(&Action::Fire) {
            let hits = self.targets.apply_hit(&self.ray);
            self.log(RangeEvent::Shot { hits });
        }

        FrameOutcome::Continue
    }

    fn update_camera(&mut self, input: &dyn InputSource, actions: &[Action], dt: f32) {
        self.camera
            .move_camera(self.config.bindings.directions(input), dt);
        let mouse = input.mouse_delta();
        if self.cursor_captured && mouse != glam::Vec2::ZERO {
            self.camera.rotate(mouse.x, mouse.y);
        }

        for action in actions {
            match action {
                Action::Run => self.set_speed(SpeedLevel::Run),
                Action::Walk => self.set_speed(SpeedLevel::Walk),
                Action::Jump => {
                    if self.camera.motion_state() == MotionState::Grounded && self.camera.start_jump() {
                        self.log(RangeEvent::JumpStarted);
                    }
                }
                _ => {}
            }
        }

        if self.camera.update_jump(dt) {
            self.log(RangeEvent::Landed);
        }
    }

    fn set_speed(&mut self, level: SpeedLevel) {
        if self.camera.camera().speed() != level {
            self.camera.set_speed(level);
            self.log(RangeEvent::SpeedChanged(level));
        }
    }

    /// Track a new viewport size.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.projection.on_resize(width, height);
        self.log(RangeEvent::Resized { width, height });
    }

    /// Per-frame values every draw reads.
    pub fn frame_context(&self) -> FrameContext {
        let cam = self.camera.camera();
        FrameContext {
            view: cam.view_matrix(),
            projection: self.projection.projection_matrix(),
            view_position: cam.position(),
            scene_light: self.scene_light,
            rifle_light: self.rifle_light,
            spotlight: self.spotlight,
        }
    }

    pub fn config(&self) -> &RangeConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut Projection {
        &mut self.projection
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn target_model(&self) -> MeshHandle {
        self.target_model
    }

    pub fn spotlight(&self) -> &SpotLight {
        &self.spotlight
    }

    /// The shot ray as of the last frame.
    pub fn ray(&self) -> Ray {
        self.ray
    }

    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    pub fn eye_position(&self) -> Vec3 {
        self.camera.camera().position()
    }

    /// Frames run so far, not counting a quitting frame.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[RangeEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<RangeEvent> {
        std::mem::take(&mut self.event_log)
    }

    fn log(&mut self, event: RangeEvent) {
        self.event_log.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_assets::{AssetStore, MeshAsset, names};
    use range_input::{InputState, Key};

    fn world() -> RangeWorld {
        RangeWorld::new(RangeConfig::default(), &AssetStore::range_defaults()).unwrap()
    }

    /// Run one frame with `keys` pressed (true) or released (false) beforehand.
    fn step(world: &mut RangeWorld, input: &mut InputState, keys: &[(Key, bool)], dt: f32) -> FrameOutcome {
        for &(key, down) in keys {
            input.on_key(key, down);
        }
        input.begin_frame(dt);
        let outcome = world.frame(input);
        input.end_frame();
        outcome
    }

    fn tap(world: &mut RangeWorld, input: &mut InputState, key: Key) -> FrameOutcome {
        let outcome = step(world, input, &[(key, true)], 0.016);
        step(world, input, &[(key, false)], 0.016);
        outcome
    }

    #[test]
    fn new_world_has_inactive_targets() {
        let w = world();
        assert_eq!(w.targets().len(), 5);
        assert_eq!(w.targets().active_count(), 0);
        assert_eq!(w.eye_position(), Vec3::new(0.0, 0.0, 5.0));
        assert!(w.events().is_empty());
    }

    #[test]
    fn missing_target_model_fails_construction() {
        let err = RangeWorld::new(RangeConfig::default(), &AssetStore::new()).unwrap_err();
        assert!(matches!(err, SceneError::Asset(_)));
    }

    #[test]
    fn invalid_config_fails_construction() {
        let mut config = RangeConfig::default();
        config.camera.gravity = -1.0;
        let err = RangeWorld::new(config, &AssetStore::range_defaults()).unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }

    #[test]
    fn escape_exits_before_any_mutation() {
        let mut w = world();
        let mut input = InputState::new();
        let outcome = step(&mut w, &mut input, &[(Key::Escape, true), (Key::P, true), (Key::W, true)], 0.5);
        assert_eq!(outcome, FrameOutcome::Exit);
        assert_eq!(w.targets().active_count(), 0);
        assert_eq!(w.eye_position(), Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(w.frame_count(), 0);
        assert!(w.events().is_empty());
    }

    #[test]
    fn awaken_activates_and_fits_bounds_in_same_frame() {
        let mut w = world();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::P);
        assert_eq!(w.targets().active_count(), 5);
        assert!(w.targets().iter().all(|t| t.bounds().is_some()));
        assert_eq!(w.events(), &[RangeEvent::TargetsAwakened { count: 5 }]);
    }

    #[test]
    fn fire_from_start_pose_hits_the_target_in_line() {
        let mut w = world();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::P);
        w.drain_events();

        tap(&mut w, &mut input, Key::MouseLeft);
        assert_eq!(w.events(), &[RangeEvent::Shot { hits: vec![TargetId(0)] }]);
        assert_eq!(w.targets().active_count(), 4);
        assert!(!w.targets().get(TargetId(0)).unwrap().is_active());
    }

    #[test]
    fn shot_at_inactive_targets_hits_nothing() {
        let mut w = world();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::MouseLeft);
        assert_eq!(w.events(), &[RangeEvent::Shot { hits: vec![] }]);
    }

    #[test]
    fn holding_forward_moves_along_ground() {
        let mut w = world();
        let mut input = InputState::new();
        step(&mut w, &mut input, &[(Key::W, true)], 0.5);
        step(&mut w, &mut input, &[], 0.5);
        let pos = w.eye_position();
        assert!((pos.z - 2.5).abs() < 1e-4, "{pos:?}");
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn shift_switches_speed_on_edges() {
        let mut w = world();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::LeftShift);
        assert_eq!(
            w.events(),
            &[
                RangeEvent::SpeedChanged(SpeedLevel::Run),
                RangeEvent::SpeedChanged(SpeedLevel::Walk)
            ]
        );
    }

    #[test]
    fn jump_starts_once_and_lands() {
        let mut w = world();
        let mut input = InputState::new();
        step(&mut w, &mut input, &[(Key::Space, true)], 0.1);
        assert_eq!(w.camera().motion_state(), MotionState::Jumping);
        assert!(w.eye_position().y > 0.0);
        step(&mut w, &mut input, &[(Key::Space, false)], 0.1);
        step(&mut w, &mut input, &[(Key::Space, true)], 0.1);

        for _ in 0..100 {
            step(&mut w, &mut input, &[], 0.1);
        }
        assert_eq!(w.camera().motion_state(), MotionState::Grounded);
        assert_eq!(w.eye_position().y, 0.0);
        let jumps = w.events().iter().filter(|e| **e == RangeEvent::JumpStarted).count();
        let landings = w.events().iter().filter(|e| **e == RangeEvent::Landed).count();
        assert_eq!((jumps, landings), (1, 1));
    }

    #[test]
    fn spotlight_follows_camera_and_toggles() {
        let mut w = world();
        let mut input = InputState::new();
        input.on_mouse_motion(900.0, 0.0);
        tap(&mut w, &mut input, Key::V);
        assert!(w.spotlight().lamp_on);
        assert!((w.spotlight().direction - Vec3::X).length() < 1e-4);
        assert_eq!(w.spotlight().position, w.eye_position());

        tap(&mut w, &mut input, Key::Num2);
        assert_eq!(w.spotlight().linear, 0.09);
        tap(&mut w, &mut input, Key::Num1);
        assert_eq!(w.spotlight().linear, 0.22);
    }

    #[test]
    fn released_cursor_freezes_view() {
        let mut w = world();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::F1);
        assert!(!w.cursor_captured());
        let front = w.camera().camera().front();
        input.on_mouse_motion(500.0, 100.0);
        step(&mut w, &mut input, &[], 0.016);
        assert_eq!(w.camera().camera().front(), front);
    }

    #[test]
    fn ray_is_rebuilt_from_camera_each_frame() {
        let mut w = world();
        let mut input = InputState::new();
        step(&mut w, &mut input, &[(Key::D, true)], 1.0);
        let ray = w.ray();
        assert_eq!(ray.origin, w.eye_position());
        assert_eq!(ray.direction, w.camera().camera().front());
    }

    #[test]
    fn respawn_timer_brings_targets_back() {
        let mut config = RangeConfig::default();
        config.targets.respawn_after = Some(0.5);
        let mut w = RangeWorld::new(config, &AssetStore::range_defaults()).unwrap();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::P);
        tap(&mut w, &mut input, Key::MouseLeft);
        assert_eq!(w.targets().active_count(), 4);
        w.drain_events();

        for _ in 0..40 {
            step(&mut w, &mut input, &[], 0.016);
        }
        assert_eq!(w.targets().active_count(), 5);
        assert_eq!(w.events(), &[RangeEvent::TargetRespawned(TargetId(0))]);
        assert!(w.targets().get(TargetId(0)).unwrap().bounds().is_some());
    }

    /// Five reference targets; a ray through only the first one takes only it down.
    #[test]
    fn end_to_end_single_target_shot() {
        let mut store = AssetStore::new();
        store
            .register_mesh(MeshAsset::cuboid(names::TARGET, Vec3::ZERO, Vec3::splat(0.1)))
            .unwrap();
        let mut w = RangeWorld::new(RangeConfig::default(), &store).unwrap();
        let mut input = InputState::new();
        tap(&mut w, &mut input, Key::P);

        let first = Vec3::new(-0.2, -0.5, 0.3);
        let from = Vec3::new(-0.2, 3.0, 0.3);
        let mut targets = w.targets.clone();
        let hits = targets.apply_hit(&Ray::new(from, (first - from).normalize()));
        assert_eq!(hits, vec![TargetId(0)]);
        assert_eq!(targets.active_count(), 4);
        assert!(targets.iter().skip(1).all(|t| t.is_active()));
    }

    #[test]
    fn resize_updates_projection_and_logs() {
        let mut w = world();
        w.on_resize(640, 480);
        assert!((w.projection().aspect() - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(w.drain_events(), vec![RangeEvent::Resized { width: 640, height: 480 }]);
        assert!(w.events().is_empty());
    }

    #[test]
    fn frame_context_carries_camera_and_lights() {
        let w = world();
        let ctx = w.frame_context();
        assert_eq!(ctx.view_position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(ctx.view, w.camera().view_matrix());
        assert_eq!(ctx.scene_light, DirectionalLight::scene());
        assert!(!ctx.spotlight.lamp_on);
    }
}
