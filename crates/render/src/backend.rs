use glam::Mat4;
use range_assets::SkyboxHandle;

use crate::RenderError;
use crate::layout::VertexLayout;
use crate::uniforms::ShaderBinding;

/// The graphics API the scene is drawn through.
///
/// GPU objects are associated types owned by the caller; dropping one frees
/// it. Draw calls are recorded in the order issued and take effect when the
/// host ends the frame.
pub trait GraphicsBackend {
    /// Uploaded vertex data plus its layout.
    type VertexArray;
    /// Uploaded per-instance model matrices.
    type InstanceBuffer;

    /// Prepare a new frame. Called by the host before any draw.
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    /// Submit everything drawn since [`GraphicsBackend::begin_frame`].
    fn end_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn create_vertex_array(
        &mut self,
        vertices: &[f32],
        layout: &VertexLayout,
    ) -> Result<Self::VertexArray, RenderError>;

    fn create_instance_buffer(
        &mut self,
        transforms: &[Mat4],
    ) -> Result<Self::InstanceBuffer, RenderError>;

    /// Draw raw geometry such as the ground plane or the crosshair.
    fn draw_arrays(&mut self, vertices: &Self::VertexArray, binding: &ShaderBinding);

    /// Draw a lit model mesh once.
    fn draw_mesh(&mut self, mesh: &Self::VertexArray, binding: &ShaderBinding);

    /// Draw `count` copies of `mesh`, one per matrix in `instances`.
    fn draw_instanced(
        &mut self,
        mesh: &Self::VertexArray,
        instances: &Self::InstanceBuffer,
        count: u32,
        binding: &ShaderBinding,
    );

    fn draw_skybox(&mut self, skybox: SkyboxHandle, binding: &ShaderBinding);

    fn set_depth_test(&mut self, enabled: bool);

    /// Map normalized depth into `[near, far]` for subsequent draws.
    fn set_depth_range(&mut self, near: f32, far: f32);
}
