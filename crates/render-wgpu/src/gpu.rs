use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use glam::Mat4;
use range_assets::{AssetId, SkyboxHandle};
use range_render::{GraphicsBackend, RenderError, ShaderBinding, VertexLayout};
use wgpu::util::DeviceExt;

use crate::shaders;
use crate::uniforms::{DrawUniforms, aligned_stride};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INSTANCE_STRIDE: u64 = std::mem::size_of::<[f32; 16]>() as u64;
const INITIAL_DRAW_CAPACITY: u64 = 64;

/// Vertex buffer uploaded by [`WgpuBackend`].
#[derive(Debug)]
pub struct WgpuVertexArray {
    buffer: Arc<wgpu::Buffer>,
    vertex_count: u32,
    kind: PipelineKind,
}

impl WgpuVertexArray {
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Per-instance model matrices uploaded by [`WgpuBackend`].
#[derive(Debug)]
pub struct WgpuInstanceBuffer {
    buffer: Arc<wgpu::Buffer>,
    count: u32,
}

impl WgpuInstanceBuffer {
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineKind {
    Model,
    Instanced,
    Flat,
}

impl PipelineKind {
    const ALL: [Self; 3] = [Self::Model, Self::Instanced, Self::Flat];

    fn for_layout(layout: &VertexLayout) -> Result<Self, RenderError> {
        if *layout == VertexLayout::POSITION_NORMAL_UV {
            Ok(Self::Model)
        } else if *layout == VertexLayout::POSITION {
            Ok(Self::Flat)
        } else {
            Err(RenderError::Backend(format!(
                "unsupported vertex layout with stride {}",
                layout.stride
            )))
        }
    }
}

fn pipeline_index(kind: PipelineKind, depth_test: bool) -> usize {
    let base = match kind {
        PipelineKind::Model => 0,
        PipelineKind::Instanced => 2,
        PipelineKind::Flat => 4,
    };
    base + usize::from(depth_test)
}

/// A draw recorded during the frame and replayed in [`GraphicsBackend::end_frame`].
struct PendingDraw {
    pipeline: usize,
    depth_range: (f32, f32),
    uniform_offset: u32,
    vertices: Arc<wgpu::Buffer>,
    vertex_count: u32,
    instances: Option<(Arc<wgpu::Buffer>, u32)>,
}

/// wgpu implementation of [`GraphicsBackend`].
///
/// Owns the device and queue. The host configures the surface through
/// [`WgpuBackend::device`] and hands over the frame's view with
/// [`WgpuBackend::set_target`] before ending the frame.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    pipelines: Vec<wgpu::RenderPipeline>,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_capacity: u64,
    staging: Vec<u8>,
    draws: Vec<PendingDraw>,
    depth_test: bool,
    depth_range: (f32, f32),
    clear_color: wgpu::Color,
    skybox_colors: BTreeMap<AssetId, [f32; 3]>,
    depth_texture: wgpu::TextureView,
    size: (u32, u32),
    target: Option<wgpu::TextureView>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_stride = aligned_stride(
            DrawUniforms::SIZE,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DrawUniforms::SIZE),
                },
                count: None,
            }],
        });

        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniforms(&device, &uniform_layout, uniform_stride, INITIAL_DRAW_CAPACITY);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("range_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("range_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::RANGE_SHADER.into()),
        });

        let mut pipelines = Vec::with_capacity(6);
        for kind in PipelineKind::ALL {
            for depth_test in [false, true] {
                debug_assert_eq!(pipelines.len(), pipeline_index(kind, depth_test));
                pipelines.push(Self::create_pipeline(
                    &device,
                    &pipeline_layout,
                    &shader,
                    surface_format,
                    kind,
                    depth_test,
                ));
            }
        }

        let depth_texture = Self::create_depth_texture(&device, width, height);

        Self {
            device,
            queue,
            surface_format,
            pipelines,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_capacity: INITIAL_DRAW_CAPACITY,
            staging: Vec::new(),
            draws: Vec::new(),
            depth_test: true,
            depth_range: (0.0, 1.0),
            clear_color: wgpu::Color::BLACK,
            skybox_colors: BTreeMap::new(),
            depth_texture,
            size: (width.max(1), height.max(1)),
            target: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.depth_texture = Self::create_depth_texture(&self.device, width, height);
    }

    /// Color the sky is cleared to when `skybox` is drawn.
    pub fn set_skybox_color(&mut self, skybox: SkyboxHandle, color: [f32; 3]) {
        self.skybox_colors.insert(skybox.id(), color);
    }

    /// View the current frame is rendered into.
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    fn push_draw(
        &mut self,
        kind: PipelineKind,
        vertices: &Arc<wgpu::Buffer>,
        vertex_count: u32,
        instances: Option<(Arc<wgpu::Buffer>, u32)>,
        binding: &ShaderBinding,
    ) {
        let uniforms = DrawUniforms::from_binding(binding);
        let offset = self.staging.len() as u64;
        self.staging.extend_from_slice(bytemuck::bytes_of(&uniforms));
        self.staging
            .resize((offset + self.uniform_stride) as usize, 0);

        self.draws.push(PendingDraw {
            pipeline: pipeline_index(kind, self.depth_test),
            depth_range: self.depth_range,
            uniform_offset: offset as u32,
            vertices: Arc::clone(vertices),
            vertex_count,
            instances,
        });
    }

    fn ensure_uniform_capacity(&mut self, draws: u64) {
        if draws <= self.uniform_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        tracing::debug!(capacity, "growing draw uniform buffer");
        let (buffer, bind_group) =
            Self::create_uniforms(&self.device, &self.uniform_layout, self.uniform_stride, capacity);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
    }

    fn create_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(DrawUniforms::SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        kind: PipelineKind,
        depth_test: bool,
    ) -> wgpu::RenderPipeline {
        let mesh_attributes = vertex_attributes(&VertexLayout::POSITION_NORMAL_UV);
        let flat_attributes = vertex_attributes(&VertexLayout::POSITION);
        let instance_attributes = wgpu::vertex_attr_array![
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
        ];
        let mesh_buffer = wgpu::VertexBufferLayout {
            array_stride: VertexLayout::POSITION_NORMAL_UV.stride_bytes(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &mesh_attributes,
        };
        let instance_buffer = wgpu::VertexBufferLayout {
            array_stride: INSTANCE_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &instance_attributes,
        };
        let flat_buffer = wgpu::VertexBufferLayout {
            array_stride: VertexLayout::POSITION.stride_bytes(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &flat_attributes,
        };

        let (label, vs, fs, buffers) = match kind {
            PipelineKind::Model => ("model_pipeline", "vs_model", "fs_lit", vec![mesh_buffer]),
            PipelineKind::Instanced => (
                "instanced_pipeline",
                "vs_instanced",
                "fs_lit",
                vec![mesh_buffer, instance_buffer],
            ),
            PipelineKind::Flat => ("flat_pipeline", "vs_flat", "fs_flat", vec![flat_buffer]),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(vs),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fs),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_test,
                depth_compare: if depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl GraphicsBackend for WgpuBackend {
    type VertexArray = WgpuVertexArray;
    type InstanceBuffer = WgpuInstanceBuffer;

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.staging.clear();
        self.draws.clear();
        self.depth_test = true;
        self.depth_range = (0.0, 1.0);
        self.clear_color = wgpu::Color::BLACK;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let draws = std::mem::take(&mut self.draws);
        let Some(target) = self.target.take() else {
            return Err(RenderError::Backend("no render target set for frame".into()));
        };

        self.ensure_uniform_capacity(draws.len() as u64);
        if !self.staging.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &self.staging);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("range_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("range_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let (width, height) = self.size;
            for draw in &draws {
                pass.set_pipeline(&self.pipelines[draw.pipeline]);
                pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                pass.set_viewport(
                    0.0,
                    0.0,
                    width as f32,
                    height as f32,
                    draw.depth_range.0,
                    draw.depth_range.1,
                );
                pass.set_vertex_buffer(0, draw.vertices.slice(..));
                match &draw.instances {
                    Some((instances, count)) => {
                        pass.set_vertex_buffer(1, instances.slice(..));
                        pass.draw(0..draw.vertex_count, 0..*count);
                    }
                    None => pass.draw(0..draw.vertex_count, 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!(draws = draws.len(), "frame submitted");
        Ok(())
    }

    fn create_vertex_array(
        &mut self,
        vertices: &[f32],
        layout: &VertexLayout,
    ) -> Result<Self::VertexArray, RenderError> {
        let kind = PipelineKind::for_layout(layout)?;
        let vertex_count = layout
            .vertex_count(vertices)
            .ok_or(RenderError::InvalidVertexData {
                len: vertices.len(),
                stride: layout.stride,
            })?;
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertex_buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(WgpuVertexArray {
            buffer: Arc::new(buffer),
            vertex_count,
            kind,
        })
    }

    fn create_instance_buffer(
        &mut self,
        transforms: &[Mat4],
    ) -> Result<Self::InstanceBuffer, RenderError> {
        if transforms.is_empty() {
            return Err(RenderError::EmptyBatch);
        }
        let columns: Vec<[f32; 16]> = transforms.iter().map(Mat4::to_cols_array).collect();
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("instance_buffer"),
                contents: bytemuck::cast_slice(&columns),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(WgpuInstanceBuffer {
            buffer: Arc::new(buffer),
            count: transforms.len() as u32,
        })
    }

    fn draw_arrays(&mut self, vertices: &Self::VertexArray, binding: &ShaderBinding) {
        self.push_draw(vertices.kind, &vertices.buffer, vertices.vertex_count, None, binding);
    }

    fn draw_mesh(&mut self, mesh: &Self::VertexArray, binding: &ShaderBinding) {
        self.push_draw(mesh.kind, &mesh.buffer, mesh.vertex_count, None, binding);
    }

    fn draw_instanced(
        &mut self,
        mesh: &Self::VertexArray,
        instances: &Self::InstanceBuffer,
        count: u32,
        binding: &ShaderBinding,
    ) {
        let count = count.min(instances.count);
        let instances = Some((Arc::clone(&instances.buffer), count));
        self.push_draw(PipelineKind::Instanced, &mesh.buffer, mesh.vertex_count, instances, binding);
    }

    fn draw_skybox(&mut self, skybox: SkyboxHandle, _binding: &ShaderBinding) {
        match self.skybox_colors.get(&skybox.id()) {
            Some(&[r, g, b]) => {
                self.clear_color = wgpu::Color {
                    r: f64::from(r),
                    g: f64::from(g),
                    b: f64::from(b),
                    a: 1.0,
                };
            }
            None => tracing::warn!(skybox = skybox.id().0, "no color registered for skybox"),
        }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_range = (near, far);
    }
}

/// wgpu attributes for an interleaved `f32` layout.
fn vertex_attributes(layout: &VertexLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .attributes
        .iter()
        .map(|attr| wgpu::VertexAttribute {
            format: match attr.components {
                1 => wgpu::VertexFormat::Float32,
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                _ => wgpu::VertexFormat::Float32x4,
            },
            offset: u64::from(attr.offset) * std::mem::size_of::<f32>() as u64,
            shader_location: attr.location,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_attributes_use_byte_offsets() {
        let attrs = vertex_attributes(&VertexLayout::POSITION_NORMAL_UV);
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attrs[2].offset, 24);
    }

    #[test]
    fn pipeline_indices_are_distinct() {
        let mut seen: Vec<usize> = PipelineKind::ALL
            .iter()
            .flat_map(|&k| [pipeline_index(k, false), pipeline_index(k, true)])
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn only_known_layouts_have_pipelines() {
        assert_eq!(
            PipelineKind::for_layout(&VertexLayout::POSITION).ok(),
            Some(PipelineKind::Flat)
        );
        let odd = VertexLayout {
            stride: 5,
            attributes: &[],
        };
        assert!(PipelineKind::for_layout(&odd).is_err());
    }
}
