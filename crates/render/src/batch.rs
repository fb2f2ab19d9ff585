use std::fmt;

use glam::{Mat4, Vec3};

use crate::RenderError;
use crate::backend::GraphicsBackend;
use crate::uniforms::ShaderBinding;

/// Many copies of one mesh drawn with a single instanced call.
///
/// The transforms live in one owned buffer. The backend copy is uploaded on
/// the first draw, reused afterwards, and released with the batch.
pub struct InstanceBatch<B: GraphicsBackend> {
    transforms: Vec<Mat4>,
    uploaded: Option<B::InstanceBuffer>,
}

impl<B: GraphicsBackend> InstanceBatch<B> {
    /// One `translate(offset) * scale` matrix per offset, in input order.
    pub fn build(offsets: &[Vec3], scale: f32) -> Result<Self, RenderError> {
        Ok(Self {
            transforms: instance_transforms(offsets, scale)?,
            uploaded: None,
        })
    }

    /// Replace every transform. The next draw uploads again.
    pub fn rebuild(&mut self, offsets: &[Vec3], scale: f32) -> Result<(), RenderError> {
        self.transforms = instance_transforms(offsets, scale)?;
        self.uploaded = None;
        Ok(())
    }

    /// Issue one instanced draw covering every transform.
    ///
    /// There is no count argument: the instance count is fixed by
    /// [`InstanceBatch::build`] or [`InstanceBatch::rebuild`] and is always
    /// [`InstanceBatch::count`].
    pub fn draw(
        &mut self,
        backend: &mut B,
        mesh: &B::VertexArray,
        binding: &ShaderBinding,
    ) -> Result<(), RenderError> {
        let count = self.count();
        let instances = match self.uploaded.take() {
            Some(buffer) => buffer,
            None => {
                tracing::debug!(count, "uploading instance buffer");
                backend.create_instance_buffer(&self.transforms)?
            }
        };
        backend.draw_instanced(mesh, &instances, count, binding);
        self.uploaded = Some(instances);
        Ok(())
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn count(&self) -> u32 {
        self.transforms.len() as u32
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded.is_some()
    }
}

impl<B: GraphicsBackend> fmt::Debug for InstanceBatch<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceBatch")
            .field("count", &self.transforms.len())
            .field("uploaded", &self.uploaded.is_some())
            .finish()
    }
}

fn instance_transforms(offsets: &[Vec3], scale: f32) -> Result<Vec<Mat4>, RenderError> {
    if offsets.is_empty() {
        return Err(RenderError::EmptyBatch);
    }
    let scale = Mat4::from_scale(Vec3::splat(scale));
    Ok(offsets
        .iter()
        .map(|&offset| Mat4::from_translation(offset) * scale)
        .collect())
}
