//! wgpu backend for the range renderer.
//!
//! Implements [`range_render::GraphicsBackend`]: draws are recorded during the
//! frame with their packed uniforms and replayed in one render pass when the
//! frame ends.
//!
//! # Invariants
//! - Backend never mutates world state.
//! - Depth range is applied per draw through the viewport depth bounds.
//! - The skybox clears the frame to its registered color.

mod gpu;
mod shaders;
mod uniforms;

pub use gpu::{WgpuBackend, WgpuInstanceBuffer, WgpuVertexArray};
pub use shaders::RANGE_SHADER;
pub use uniforms::DrawUniforms;
