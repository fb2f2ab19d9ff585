use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::mesh::MeshAsset;
use crate::{
    AssetError, AssetId, AssetKind, AssetService, MeshHandle, ShaderHandle, SkyboxHandle,
    TextureHandle, names,
};

/// A shader program known by name. Source text is owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderAsset {
    pub name: String,
}

/// A 2D texture descriptor. The image itself is not decoded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureAsset {
    pub name: String,
    pub source: String,
}

/// Cubemap faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyboxAsset {
    pub name: String,
    pub faces: [String; 6],
    /// Flat color used by backends that do not sample the cubemap.
    pub fallback_color: [f32; 3],
}

/// An asset entry in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    Mesh(MeshAsset),
    Shader(ShaderAsset),
    Texture(TextureAsset),
    Skybox(SkyboxAsset),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Mesh(_) => AssetKind::Mesh,
            Self::Shader(_) => AssetKind::Shader,
            Self::Texture(_) => AssetKind::Texture,
            Self::Skybox(_) => AssetKind::Skybox,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Mesh(m) => &m.name,
            Self::Shader(s) => &s.name,
            Self::Texture(t) => &t.name,
            Self::Skybox(s) => &s.name,
        }
    }

    fn content_hash(&self) -> AssetId {
        let mut hasher = Sha256::new();
        hasher.update(self.kind().to_string().as_bytes());
        hasher.update(self.name().as_bytes());
        match self {
            Self::Mesh(m) => {
                for f in &m.vertices {
                    hasher.update(f.to_le_bytes());
                }
            }
            Self::Shader(_) => {}
            Self::Texture(t) => hasher.update(t.source.as_bytes()),
            Self::Skybox(s) => {
                for face in &s.faces {
                    hasher.update(face.as_bytes());
                }
                for c in s.fallback_color {
                    hasher.update(c.to_le_bytes());
                }
            }
        }
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        AssetId(u64::from_le_bytes(bytes))
    }
}

/// Content-addressed asset registry.
///
/// Assets are indexed by their content hash and looked up by `(kind, name)`.
/// The registry can be persisted to disk as JSON for inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the placeholder geometry and descriptors the range scene expects.
    pub fn range_defaults() -> Self {
        let mut store = Self::new();
        store.insert_all(default_assets());
        store
    }

    /// Register any asset and return its ID.
    ///
    /// Re-registering identical content returns the existing ID. A different
    /// asset reusing a name of the same kind is rejected.
    pub fn register(&mut self, asset: Asset) -> Result<AssetId, AssetError> {
        let id = asset.content_hash();
        if self.assets.contains_key(&id) {
            return Ok(id);
        }
        if self.find(asset.kind(), asset.name()).is_some() {
            return Err(AssetError::DuplicateName {
                kind: asset.kind(),
                name: asset.name().to_string(),
            });
        }
        tracing::debug!(kind = %asset.kind(), name = asset.name(), ?id, "registered asset");
        self.assets.insert(id, asset);
        Ok(id)
    }

    pub fn register_mesh(&mut self, mesh: MeshAsset) -> Result<MeshHandle, AssetError> {
        if mesh.vertices.is_empty() {
            return Err(AssetError::EmptyMesh(mesh.name));
        }
        self.register(Asset::Mesh(mesh)).map(MeshHandle)
    }

    pub fn register_shader(&mut self, name: impl Into<String>) -> Result<ShaderHandle, AssetError> {
        self.register(Asset::Shader(ShaderAsset { name: name.into() }))
            .map(ShaderHandle)
    }

    pub fn register_texture(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<TextureHandle, AssetError> {
        self.register(Asset::Texture(TextureAsset {
            name: name.into(),
            source: source.into(),
        }))
        .map(TextureHandle)
    }

    pub fn register_skybox(&mut self, skybox: SkyboxAsset) -> Result<SkyboxHandle, AssetError> {
        self.register(Asset::Skybox(skybox)).map(SkyboxHandle)
    }

    /// Get an asset by ID.
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    pub fn skybox_data(&self, handle: SkyboxHandle) -> Result<&SkyboxAsset, AssetError> {
        match self.assets.get(&handle.0) {
            Some(Asset::Skybox(s)) => Ok(s),
            _ => Err(AssetError::UnknownId(handle.0)),
        }
    }

    /// Iterate `(id, asset)` in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetId, &Asset)> {
        self.assets.iter().map(|(id, a)| (*id, a))
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Save the asset registry to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load an asset registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path.as_ref())?;
        let store: Self = serde_json::from_reader(file)?;
        tracing::info!(path = %path.as_ref().display(), assets = store.len(), "loaded asset manifest");
        Ok(store)
    }

    fn find(&self, kind: AssetKind, name: &str) -> Option<AssetId> {
        self.assets
            .iter()
            .find(|(_, a)| a.kind() == kind && a.name() == name)
            .map(|(id, _)| *id)
    }

    fn lookup(&self, kind: AssetKind, name: &str) -> Result<AssetId, AssetError> {
        self.find(kind, name).ok_or_else(|| AssetError::NotFound {
            kind,
            name: name.to_string(),
        })
    }

    fn insert_all(&mut self, assets: Vec<Asset>) {
        for asset in assets {
            let id = asset.content_hash();
            self.assets.insert(id, asset);
        }
    }
}

impl AssetService for AssetStore {
    fn mesh(&self, name: &str) -> Result<MeshHandle, AssetError> {
        self.lookup(AssetKind::Mesh, name).map(MeshHandle)
    }

    fn mesh_data(&self, handle: MeshHandle) -> Result<&MeshAsset, AssetError> {
        match self.assets.get(&handle.0) {
            Some(Asset::Mesh(m)) => Ok(m),
            _ => Err(AssetError::UnknownId(handle.0)),
        }
    }

    fn shader(&self, name: &str) -> Result<ShaderHandle, AssetError> {
        self.lookup(AssetKind::Shader, name).map(ShaderHandle)
    }

    fn texture(&self, name: &str) -> Result<TextureHandle, AssetError> {
        self.lookup(AssetKind::Texture, name).map(TextureHandle)
    }

    fn skybox(&self, name: &str) -> Result<SkyboxHandle, AssetError> {
        self.lookup(AssetKind::Skybox, name).map(SkyboxHandle)
    }
}

fn default_assets() -> Vec<Asset> {
    let meshes = [
        // Standing board, base on the model origin.
        MeshAsset::cuboid(names::TARGET, Vec3::new(0.0, 0.35, 0.0), Vec3::new(0.25, 0.35, 0.03)),
        MeshAsset::cuboid(names::TREE, Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.35, 1.5, 0.35)),
        MeshAsset::cuboid(names::CABIN, Vec3::new(0.0, 2.5, 0.0), Vec3::new(4.0, 2.5, 3.0)),
        MeshAsset::cuboid(names::RIFLE, Vec3::ZERO, Vec3::new(0.04, 0.06, 0.45)),
    ];
    let shaders = [
        names::MODEL_SHADER,
        names::INSTANCED_SHADER,
        names::PLANE_SHADER,
        names::CROSSHAIR_SHADER,
        names::SKYBOX_SHADER,
    ];

    let mut out: Vec<Asset> = meshes.into_iter().map(Asset::Mesh).collect();
    out.extend(shaders.into_iter().map(|name| {
        Asset::Shader(ShaderAsset {
            name: name.to_string(),
        })
    }));
    out.push(Asset::Texture(TextureAsset {
        name: names::GRASS_TEXTURE.to_string(),
        source: "textures/grass.png".to_string(),
    }));
    out.push(Asset::Skybox(SkyboxAsset {
        name: names::NIGHT_SKYBOX.to_string(),
        faces: ["right", "left", "top", "bottom", "front", "back"]
            .map(|face| format!("skybox/night/{face}.png")),
        fallback_color: [0.02, 0.03, 0.08],
    }));
    out
}
