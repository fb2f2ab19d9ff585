use glam::{Mat3, Mat4, Vec3};
use range_common::{DirectionalLight, SpotLight};

use crate::uniforms::{ShaderBinding, UniformBlock};

/// Values shared by every draw in one frame.
///
/// Built once per frame from the world and passed into each draw, so light
/// state cannot change between draws of the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_position: Vec3,
    pub scene_light: DirectionalLight,
    /// Extra light used only for the first-person rifle.
    pub rifle_light: DirectionalLight,
    pub spotlight: SpotLight,
}

impl FrameContext {
    /// Camera matrices, eye position, scene light and flashlight.
    pub fn apply_world_lighting(&self, binding: &mut ShaderBinding) {
        binding
            .set_mat4("projection", self.projection)
            .set_mat4("view", self.view)
            .set_vec3("viewPos", self.view_position);
        self.scene_light.apply(binding, "dirlight");
        self.spotlight.apply(binding, "spotlight");
    }

    /// View-space lighting for geometry attached to the camera.
    pub fn apply_held_item_lighting(&self, binding: &mut ShaderBinding) {
        binding
            .set_mat4("projection", self.projection)
            .set_mat4("view", Mat4::IDENTITY)
            .set_vec3("viewPos", self.view_position);
        self.scene_light.apply(binding, "scene_dirlight");
        self.rifle_light.apply(binding, "rifle_dirlight");
    }

    /// View with translation removed, so the skybox stays centered on the eye.
    pub fn skybox_view(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.view))
    }
}

/// Inverse-transpose of the upper 3x3, for transforming normals.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model.inverse().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_assets::{AssetId, ShaderHandle};

    fn ctx() -> FrameContext {
        FrameContext {
            view: Mat4::look_at_rh(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0),
            view_position: Vec3::new(1.0, 2.0, 3.0),
            scene_light: DirectionalLight::scene(),
            rifle_light: DirectionalLight::rifle(),
            spotlight: SpotLight::default(),
        }
    }

    #[test]
    fn world_lighting_sets_matrices_and_both_lights() {
        let mut b = ShaderBinding::new(ShaderHandle(AssetId(0)));
        ctx().apply_world_lighting(&mut b);
        assert_eq!(b.mat4("view"), Some(ctx().view));
        assert_eq!(b.vec3("viewPos"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(b.vec3("dirlight.direction").is_some());
        assert!(b.int("spotlight.lamp_on").is_some());
    }

    #[test]
    fn held_item_uses_identity_view_and_rifle_light() {
        let mut b = ShaderBinding::new(ShaderHandle(AssetId(0)));
        ctx().apply_held_item_lighting(&mut b);
        assert_eq!(b.mat4("view"), Some(Mat4::IDENTITY));
        assert_eq!(b.vec3("rifle_dirlight.diffuse"), Some(Vec3::splat(0.55)));
        assert!(b.vec3("spotlight.position").is_none());
    }

    #[test]
    fn skybox_view_has_no_translation() {
        let v = ctx().skybox_view();
        assert_eq!(v.w_axis, glam::Vec4::W);
        assert_eq!(v.transform_vector3(Vec3::X), ctx().view.transform_vector3(Vec3::X));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(model);
        assert!((n * Vec3::X - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }
}
