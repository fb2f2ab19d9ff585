//! Rendering adapter: backend-agnostic draw pass for the range.
//!
//! # Invariants
//! - The renderer never mutates world state; it reads a [`FrameContext`]
//!   and the active target transforms.
//! - Instanced scenery is uploaded once and drawn with one call per frame.
//! - Every per-frame value reaches a draw through its [`ShaderBinding`],
//!   never through shared mutable state.

pub mod backend;
pub mod batch;
pub mod frame;
pub mod layout;
pub mod recording;
pub mod scene;
pub mod uniforms;

pub use backend::GraphicsBackend;
pub use batch::InstanceBatch;
pub use frame::{FrameContext, normal_matrix};
pub use layout::{CROSSHAIR_VERTICES, PLANE_VERTICES, VertexAttribute, VertexLayout};
pub use recording::{DrawCommand, RecordingBackend};
pub use scene::{SceneLayout, SceneRenderer, SceneSetup};
pub use uniforms::{ShaderBinding, UniformBlock, UniformValue};

use range_assets::AssetError;

/// Errors from creating or drawing GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("asset lookup failed: {0}")]
    Asset(#[from] AssetError),
    #[error("instance batch needs at least one transform")]
    EmptyBatch,
    #[error("vertex data of {len} floats is not a whole number of {stride}-float vertices")]
    InvalidVertexData { len: usize, stride: u32 },
    #[error("backend error: {0}")]
    Backend(String),
}

pub fn crate_info() -> &'static str {
    concat!("range-render v", env!("CARGO_PKG_VERSION"))
}
