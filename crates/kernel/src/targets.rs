use std::fmt;

use glam::{Mat4, Vec3};
use range_assets::{AssetError, AssetService, MeshHandle};
use range_common::{Aabb, Ray, raycast};
use serde::{Deserialize, Serialize};

/// Stable index of a target within its [`TargetSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Which intersecting targets a single shot deactivates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitPolicy {
    /// Every active target the ray passes through.
    #[default]
    AllIntersecting,
    /// Only the target whose box the ray enters first.
    Nearest,
}

/// One shootable target.
///
/// World bounds exist only while the target is active and has been refit
/// since its last activation.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    id: TargetId,
    model: MeshHandle,
    model_bounds: Aabb,
    position: Vec3,
    scale: f32,
    active: bool,
    bounds: Option<Aabb>,
    inactive_elapsed: f32,
}

impl Target {
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn model(&self) -> MeshHandle {
        self.model
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// World-space box, `None` while stale.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Seconds spent inactive since the last deactivation.
    pub fn inactive_elapsed(&self) -> f32 {
        self.inactive_elapsed
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.scale))
    }

    fn activate(&mut self) {
        self.active = true;
        self.inactive_elapsed = 0.0;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.bounds = None;
        self.inactive_elapsed = 0.0;
    }
}

/// Owns every target and applies activation, bounds refits and hits.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<Target>,
    policy: HitPolicy,
    respawn_after: Option<f32>,
}

impl TargetSet {
    /// `respawn_after`: seconds after which a hit target comes back on its
    /// own. `None` leaves reactivation to [`TargetSet::activate_all`].
    pub fn new(policy: HitPolicy, respawn_after: Option<f32>) -> Self {
        Self {
            targets: Vec::new(),
            policy,
            respawn_after,
        }
    }

    /// Create one inactive target per position, all sharing `model`.
    ///
    /// Model-space bounds are read from `assets` once here.
    pub fn spawn_all(
        &mut self,
        assets: &dyn AssetService,
        model: MeshHandle,
        positions: &[Vec3],
        scale: f32,
    ) -> Result<Vec<TargetId>, AssetError> {
        let model_bounds = assets.mesh_bounds(model)?;
        let first = self.targets.len() as u32;
        let ids: Vec<TargetId> = (first..first + positions.len() as u32).map(TargetId).collect();
        self.targets
            .extend(ids.iter().zip(positions).map(|(&id, &position)| Target {
                id,
                model,
                model_bounds,
                position,
                scale,
                active: false,
                bounds: None,
                inactive_elapsed: 0.0,
            }));
        tracing::debug!(count = positions.len(), "spawned targets");
        Ok(ids)
    }

    /// Mark every target active. Bounds stay stale until [`TargetSet::recompute_bounds`].
    pub fn activate_all(&mut self) -> usize {
        for t in &mut self.targets {
            t.activate();
        }
        self.targets.len()
    }

    /// Refit bounds of active targets whose box is stale. Returns how many were refit.
    pub fn recompute_bounds(&mut self) -> usize {
        let mut refit = 0;
        for t in self.targets.iter_mut().filter(|t| t.active && t.bounds.is_none()) {
            t.bounds = Some(t.model_bounds.transformed(&t.model_matrix()));
            refit += 1;
        }
        if refit > 0 {
            tracing::trace!(refit, "recomputed target bounds");
        }
        refit
    }

    /// Advance inactive timers and respawn targets whose timer elapsed.
    ///
    /// Respawned targets come back with stale bounds.
    pub fn update(&mut self, dt: f32) -> Vec<TargetId> {
        let mut respawned = Vec::new();
        for t in self.targets.iter_mut().filter(|t| !t.active) {
            t.inactive_elapsed += dt;
            if self.respawn_after.is_some_and(|after| t.inactive_elapsed >= after) {
                t.activate();
                respawned.push(t.id);
            }
        }
        respawned
    }

    /// Deactivate the active targets hit by `ray` according to the hit policy.
    ///
    /// Every active target must have fresh bounds.
    pub fn apply_hit(&mut self, ray: &Ray) -> Vec<TargetId> {
        let hits: Vec<(usize, f32)> = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.active)
            .filter_map(|(i, t)| {
                debug_assert!(t.bounds.is_some(), "{} hit-tested with stale bounds", t.id);
                let bounds = t.bounds.as_ref()?;
                raycast::entry_distance(ray, bounds).map(|d| (i, d))
            })
            .collect();

        let chosen: Vec<usize> = match self.policy {
            HitPolicy::AllIntersecting => hits.into_iter().map(|(i, _)| i).collect(),
            HitPolicy::Nearest => hits
                .into_iter()
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
                .into_iter()
                .collect(),
        };

        chosen
            .into_iter()
            .map(|i| {
                let t = &mut self.targets[i];
                t.deactivate();
                tracing::info!(target_id = %t.id, "target hit");
                t.id
            })
            .collect()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(|t| t.active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Model matrices of active targets, in spawn order.
    pub fn active_transforms(&self) -> Vec<Mat4> {
        self.active().map(Target::model_matrix).collect()
    }

    pub fn policy(&self) -> HitPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: HitPolicy) {
        self.policy = policy;
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_assets::{AssetStore, MeshAsset};

    /// Unit cube centered on the model origin.
    fn store_with_cube() -> (AssetStore, MeshHandle) {
        let mut store = AssetStore::new();
        let handle = store
            .register_mesh(MeshAsset::cuboid("cube", Vec3::ZERO, Vec3::splat(0.5)))
            .unwrap();
        (store, handle)
    }

    fn spawned(positions: &[Vec3], policy: HitPolicy, respawn_after: Option<f32>) -> TargetSet {
        let (store, cube) = store_with_cube();
        let mut set = TargetSet::new(policy, respawn_after);
        set.spawn_all(&store, cube, positions, 1.0).unwrap();
        set
    }

    fn down_neg_z(from: Vec3) -> Ray {
        Ray::new(from, Vec3::NEG_Z)
    }

    #[test]
    fn spawned_targets_start_inactive_without_bounds() {
        let set = spawned(&[Vec3::ZERO, Vec3::X * 3.0], HitPolicy::default(), None);
        assert_eq!(set.len(), 2);
        assert_eq!(set.active_count(), 0);
        assert!(set.iter().all(|t| t.bounds().is_none()));
    }

    #[test]
    fn activation_leaves_bounds_stale_until_recompute() {
        let mut set = spawned(&[Vec3::new(1.0, 2.0, 3.0)], HitPolicy::default(), None);
        set.activate_all();
        assert!(set.get(TargetId(0)).unwrap().bounds().is_none());
        assert_eq!(set.recompute_bounds(), 1);
        let b = set.get(TargetId(0)).unwrap().bounds().unwrap();
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.half_extents(), Vec3::splat(0.5));
    }

    #[test]
    fn recompute_is_idempotent_and_skips_inactive() {
        let mut set = spawned(&[Vec3::ZERO], HitPolicy::default(), None);
        assert_eq!(set.recompute_bounds(), 0);
        set.activate_all();
        assert_eq!(set.recompute_bounds(), 1);
        let before = set.get(TargetId(0)).unwrap().bounds();
        assert_eq!(set.recompute_bounds(), 0);
        assert_eq!(set.get(TargetId(0)).unwrap().bounds(), before);
    }

    #[test]
    fn scale_is_applied_to_bounds() {
        let (store, cube) = store_with_cube();
        let mut set = TargetSet::default();
        set.spawn_all(&store, cube, &[Vec3::ZERO], 2.0).unwrap();
        set.activate_all();
        set.recompute_bounds();
        assert_eq!(set.get(TargetId(0)).unwrap().bounds().unwrap().max, Vec3::ONE);
    }

    #[test]
    fn hit_deactivates_and_clears_bounds() {
        let mut set = spawned(&[Vec3::ZERO], HitPolicy::default(), None);
        set.activate_all();
        set.recompute_bounds();
        let hits = set.apply_hit(&down_neg_z(Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(hits, vec![TargetId(0)]);
        let t = set.get(TargetId(0)).unwrap();
        assert!(!t.is_active());
        assert!(t.bounds().is_none());
    }

    #[test]
    fn hitting_inactive_target_is_noop() {
        let mut set = spawned(&[Vec3::ZERO], HitPolicy::default(), None);
        let ray = down_neg_z(Vec3::new(0.0, 0.0, 5.0));
        assert!(set.apply_hit(&ray).is_empty());
        set.activate_all();
        set.recompute_bounds();
        assert_eq!(set.apply_hit(&ray).len(), 1);
        assert!(set.apply_hit(&ray).is_empty());
        set.recompute_bounds();
        assert!(set.apply_hit(&ray).is_empty());
    }

    #[test]
    fn all_intersecting_policy_takes_every_target_in_line() {
        let line = [Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -4.0)];
        let mut set = spawned(&line, HitPolicy::AllIntersecting, None);
        set.activate_all();
        set.recompute_bounds();
        let hits = set.apply_hit(&down_neg_z(Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(hits, vec![TargetId(0), TargetId(1), TargetId(2)]);
        assert_eq!(set.active_count(), 0);
    }

    #[test]
    fn nearest_policy_takes_only_the_closest() {
        let line = [Vec3::new(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0)];
        let mut set = spawned(&line, HitPolicy::Nearest, None);
        set.activate_all();
        set.recompute_bounds();
        let hits = set.apply_hit(&down_neg_z(Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(hits, vec![TargetId(1)]);
        assert_eq!(set.active_count(), 2);
    }

    #[test]
    fn without_respawn_timer_targets_stay_down() {
        let mut set = spawned(&[Vec3::ZERO], HitPolicy::default(), None);
        for _ in 0..1000 {
            assert!(set.update(0.1).is_empty());
        }
        assert_eq!(set.active_count(), 0);
        assert!(set.get(TargetId(0)).unwrap().inactive_elapsed() > 99.0);
    }

    #[test]
    fn respawn_timer_reactivates_with_stale_bounds() {
        let mut set = spawned(&[Vec3::ZERO], HitPolicy::default(), Some(1.0));
        set.activate_all();
        set.recompute_bounds();
        set.apply_hit(&down_neg_z(Vec3::new(0.0, 0.0, 5.0)));

        assert!(set.update(0.5).is_empty());
        assert_eq!(set.update(0.5), vec![TargetId(0)]);
        let t = set.get(TargetId(0)).unwrap();
        assert!(t.is_active());
        assert!(t.bounds().is_none());
        assert_eq!(t.inactive_elapsed(), 0.0);
        assert_eq!(set.recompute_bounds(), 1);
    }

    #[test]
    fn moved_box_is_missed() {
        let mut set = spawned(&[Vec3::new(10.0, 0.0, 0.0)], HitPolicy::default(), None);
        set.activate_all();
        set.recompute_bounds();
        assert!(set.apply_hit(&down_neg_z(Vec3::new(0.0, 0.0, 5.0))).is_empty());
        assert_eq!(set.active_count(), 1);
    }

    #[test]
    fn active_transforms_follow_spawn_order() {
        let mut set = spawned(&[Vec3::X, Vec3::Y], HitPolicy::default(), None);
        assert!(set.active_transforms().is_empty());
        set.activate_all();
        let m = set.active_transforms();
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].w_axis.truncate(), Vec3::X);
        assert_eq!(m[1].w_axis.truncate(), Vec3::Y);
    }

    #[test]
    fn missing_model_is_an_asset_error() {
        let store = AssetStore::new();
        let mut set = TargetSet::default();
        let bogus = MeshHandle(range_assets::AssetId(7));
        assert!(set.spawn_all(&store, bogus, &[Vec3::ZERO], 1.0).is_err());
        assert!(set.is_empty());
    }
}
