use std::fmt::Write as _;

use glam::Mat4;
use range_assets::SkyboxHandle;

use crate::RenderError;
use crate::backend::GraphicsBackend;
use crate::layout::VertexLayout;
use crate::uniforms::ShaderBinding;

/// Vertex array created by a [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedVertexArray {
    pub id: u32,
    pub vertex_count: u32,
}

/// Instance buffer created by a [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedInstanceBuffer {
    pub id: u32,
    pub count: u32,
}

/// One call observed by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Arrays {
        vertex_array: u32,
        vertices: u32,
        binding: ShaderBinding,
    },
    Mesh {
        vertex_array: u32,
        vertices: u32,
        binding: ShaderBinding,
    },
    Instanced {
        vertex_array: u32,
        instance_buffer: u32,
        count: u32,
        binding: ShaderBinding,
    },
    Skybox {
        skybox: SkyboxHandle,
        binding: ShaderBinding,
    },
    DepthTest(bool),
    DepthRange {
        near: f32,
        far: f32,
    },
}

impl DrawCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Arrays { .. } => "arrays",
            Self::Mesh { .. } => "mesh",
            Self::Instanced { .. } => "instanced",
            Self::Skybox { .. } => "skybox",
            Self::DepthTest(_) => "depth_test",
            Self::DepthRange { .. } => "depth_range",
        }
    }

    pub fn binding(&self) -> Option<&ShaderBinding> {
        match self {
            Self::Arrays { binding, .. }
            | Self::Mesh { binding, .. }
            | Self::Instanced { binding, .. }
            | Self::Skybox { binding, .. } => Some(binding),
            Self::DepthTest(_) | Self::DepthRange { .. } => None,
        }
    }
}

/// Backend that records calls instead of touching a GPU.
///
/// Used by tests and by headless runs to inspect what a frame would draw.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    instance_uploads: Vec<u32>,
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last [`GraphicsBackend::begin_frame`].
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Instance count of every instance buffer created, in creation order.
    pub fn instance_uploads(&self) -> &[u32] {
        &self.instance_uploads
    }

    /// Frames completed with [`GraphicsBackend::end_frame`].
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Human-readable listing of the recorded commands.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Recorded draws (frames={}, uploads={}) ===",
            self.frames,
            self.instance_uploads.len()
        );
        for cmd in &self.commands {
            let _ = match cmd {
                DrawCommand::Arrays { vertex_array, vertices, .. } => {
                    writeln!(out, "  arrays    va={vertex_array} vertices={vertices}")
                }
                DrawCommand::Mesh { vertex_array, vertices, .. } => {
                    writeln!(out, "  mesh      va={vertex_array} vertices={vertices}")
                }
                DrawCommand::Instanced {
                    vertex_array,
                    instance_buffer,
                    count,
                    ..
                } => writeln!(
                    out,
                    "  instanced va={vertex_array} buffer={instance_buffer} count={count}"
                ),
                DrawCommand::Skybox { skybox, .. } => writeln!(out, "  skybox    {:?}", skybox.id()),
                DrawCommand::DepthTest(on) => writeln!(out, "  depth     test={on}"),
                DrawCommand::DepthRange { near, far } => {
                    writeln!(out, "  depth     range=[{near}, {far}]")
                }
            };
        }
        out
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for RecordingBackend {
    type VertexArray = RecordedVertexArray;
    type InstanceBuffer = RecordedInstanceBuffer;

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.commands.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }

    fn create_vertex_array(
        &mut self,
        vertices: &[f32],
        layout: &VertexLayout,
    ) -> Result<Self::VertexArray, RenderError> {
        let vertex_count = layout
            .vertex_count(vertices)
            .ok_or(RenderError::InvalidVertexData {
                len: vertices.len(),
                stride: layout.stride,
            })?;
        Ok(RecordedVertexArray {
            id: self.next_id(),
            vertex_count,
        })
    }

    fn create_instance_buffer(
        &mut self,
        transforms: &[Mat4],
    ) -> Result<Self::InstanceBuffer, RenderError> {
        let count = transforms.len() as u32;
        self.instance_uploads.push(count);
        Ok(RecordedInstanceBuffer {
            id: self.next_id(),
            count,
        })
    }

    fn draw_arrays(&mut self, vertices: &Self::VertexArray, binding: &ShaderBinding) {
        self.commands.push(DrawCommand::Arrays {
            vertex_array: vertices.id,
            vertices: vertices.vertex_count,
            binding: binding.clone(),
        });
    }

    fn draw_mesh(&mut self, mesh: &Self::VertexArray, binding: &ShaderBinding) {
        self.commands.push(DrawCommand::Mesh {
            vertex_array: mesh.id,
            vertices: mesh.vertex_count,
            binding: binding.clone(),
        });
    }

    fn draw_instanced(
        &mut self,
        mesh: &Self::VertexArray,
        instances: &Self::InstanceBuffer,
        count: u32,
        binding: &ShaderBinding,
    ) {
        debug_assert!(count <= instances.count, "drawing more instances than uploaded");
        self.commands.push(DrawCommand::Instanced {
            vertex_array: mesh.id,
            instance_buffer: instances.id,
            count,
            binding: binding.clone(),
        });
    }

    fn draw_skybox(&mut self, skybox: SkyboxHandle, binding: &ShaderBinding) {
        self.commands.push(DrawCommand::Skybox {
            skybox,
            binding: binding.clone(),
        });
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.commands.push(DrawCommand::DepthTest(enabled));
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.commands.push(DrawCommand::DepthRange { near, far });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PLANE_VERTICES, VertexLayout};
    use range_assets::{AssetId, ShaderHandle};

    #[test]
    fn ragged_vertices_are_rejected() {
        let mut backend = RecordingBackend::new();
        let err = backend
            .create_vertex_array(&[0.0; 10], &VertexLayout::POSITION_NORMAL_UV)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidVertexData { len: 10, stride: 8 }));
    }

    #[test]
    fn begin_frame_clears_commands() {
        let mut backend = RecordingBackend::new();
        backend.set_depth_test(false);
        backend.end_frame().unwrap();
        backend.begin_frame().unwrap();
        assert!(backend.commands().is_empty());
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn summary_lists_commands() {
        let mut backend = RecordingBackend::new();
        let va = backend
            .create_vertex_array(&PLANE_VERTICES, &VertexLayout::POSITION_NORMAL_UV)
            .unwrap();
        backend.draw_arrays(&va, &ShaderBinding::new(ShaderHandle(AssetId(3))));
        backend.set_depth_range(0.0, 0.01);
        let text = backend.summary();
        assert!(text.contains("arrays    va=1 vertices=6"));
        assert!(text.contains("range=[0, 0.01]"));
    }
}
