//! Asset service: typed handles for meshes, shaders, textures and skyboxes.
//!
//! Everything downstream resolves assets by name once and then holds a
//! handle. Handles are content-addressed, so registering the same asset
//! twice yields the same handle and never a second copy.
//!
//! Decoding model or image files is out of scope; the [`AssetStore`] holds
//! procedural meshes plus shader/texture/skybox descriptors and can persist
//! that registry as a JSON manifest.

pub mod mesh;
pub mod store;

use range_common::Aabb;
use serde::{Deserialize, Serialize};

pub use mesh::{MESH_STRIDE, MeshAsset};
pub use store::{Asset, AssetStore, ShaderAsset, SkyboxAsset, TextureAsset};

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub AssetId);

        impl $name {
            pub fn id(self) -> AssetId {
                self.0
            }
        }
    };
}

handle!(
    /// Shared reference to a mesh. The asset service owns the geometry.
    MeshHandle
);
handle!(ShaderHandle);
handle!(TextureHandle);
handle!(
    /// Cubemap used as the scene background.
    SkyboxHandle
);

/// Which table an asset name is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Mesh,
    Shader,
    Texture,
    Skybox,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Mesh => "mesh",
            Self::Shader => "shader",
            Self::Texture => "texture",
            Self::Skybox => "skybox",
        };
        f.pad(s)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} not found: {name}")]
    NotFound { kind: AssetKind, name: String },
    #[error("no asset with id {0:?}")]
    UnknownId(AssetId),
    #[error("{kind} name {name:?} already registered with different content")]
    DuplicateName { kind: AssetKind, name: String },
    #[error("mesh {0:?} has no usable vertex data")]
    EmptyMesh(String),
}

/// Lookup contract the range consumes. Callers resolve names once at
/// construction and keep the handles.
pub trait AssetService {
    fn mesh(&self, name: &str) -> Result<MeshHandle, AssetError>;

    fn mesh_data(&self, handle: MeshHandle) -> Result<&MeshAsset, AssetError>;

    /// Model-space bounds of a mesh.
    fn mesh_bounds(&self, handle: MeshHandle) -> Result<Aabb, AssetError> {
        self.mesh_data(handle).map(|m| m.bounds)
    }

    fn shader(&self, name: &str) -> Result<ShaderHandle, AssetError>;

    fn texture(&self, name: &str) -> Result<TextureHandle, AssetError>;

    fn skybox(&self, name: &str) -> Result<SkyboxHandle, AssetError>;
}

/// Names of the assets the built-in range scene uses.
pub mod names {
    pub const TARGET: &str = "target";
    pub const TREE: &str = "tree";
    pub const CABIN: &str = "cabin";
    pub const RIFLE: &str = "rifle";

    pub const MODEL_SHADER: &str = "model";
    pub const INSTANCED_SHADER: &str = "instanced";
    pub const PLANE_SHADER: &str = "plane";
    pub const CROSSHAIR_SHADER: &str = "crosshair";
    pub const SKYBOX_SHADER: &str = "skybox";

    pub const GRASS_TEXTURE: &str = "grass";
    pub const NIGHT_SKYBOX: &str = "night";
}

pub fn crate_info() -> &'static str {
    concat!("range-assets v", env!("CARGO_PKG_VERSION"))
}
