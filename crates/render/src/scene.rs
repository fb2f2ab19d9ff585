use glam::{Mat4, Quat, Vec3};
use range_assets::{AssetService, MeshHandle, ShaderHandle, SkyboxHandle, TextureHandle, names};

use crate::RenderError;
use crate::backend::GraphicsBackend;
use crate::batch::InstanceBatch;
use crate::frame::{FrameContext, normal_matrix};
use crate::layout::{CROSSHAIR_VERTICES, PLANE_VERTICES, VertexLayout};
use crate::uniforms::ShaderBinding;

/// Placement and material constants for the fixed scenery.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub cabin_position: Vec3,
    pub cabin_scale: f32,
    pub cabin_shininess: f32,
    pub tree_shininess: f32,
    pub target_shininess: f32,
    /// Rifle offset in view space.
    pub rifle_offset: Vec3,
    /// Yaw, pitch and roll applied in that order, in degrees.
    pub rifle_rotation: Vec3,
    pub rifle_scale: f32,
    pub rifle_shininess: f32,
    /// Depth range the rifle is squeezed into so it never clips scenery.
    pub rifle_depth_far: f32,
    pub crosshair_scale: f32,
    pub crosshair_color: Vec3,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            cabin_position: Vec3::new(-3.0, -0.5, 1.0),
            cabin_scale: 0.2,
            cabin_shininess: 32.0,
            tree_shininess: 8.0,
            target_shininess: 32.0,
            rifle_offset: Vec3::new(0.3, -0.24, -0.875),
            rifle_rotation: Vec3::new(98.5, -3.0, 3.3),
            rifle_scale: 0.7,
            rifle_shininess: 32.0,
            rifle_depth_far: 0.01,
            crosshair_scale: 0.01,
            crosshair_color: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl SceneLayout {
    pub fn cabin_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.cabin_position) * Mat4::from_scale(Vec3::splat(self.cabin_scale))
    }

    pub fn rifle_matrix(&self) -> Mat4 {
        let r = self.rifle_rotation;
        let rotation = Quat::from_rotation_y(r.x.to_radians())
            * Quat::from_rotation_x(r.y.to_radians())
            * Quat::from_rotation_z(r.z.to_radians());
        Mat4::from_scale_rotation_translation(Vec3::splat(self.rifle_scale), rotation, self.rifle_offset)
    }

    pub fn crosshair_matrix(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.crosshair_scale))
    }
}

/// What to draw besides the fixed scenery.
#[derive(Debug, Clone, Copy)]
pub struct SceneSetup<'a> {
    pub target_model: MeshHandle,
    pub tree_model: &'a str,
    pub tree_offsets: &'a [Vec3],
    pub tree_scale: f32,
}

#[derive(Debug, Clone, Copy)]
struct SceneShaders {
    model: ShaderHandle,
    instanced: ShaderHandle,
    plane: ShaderHandle,
    crosshair: ShaderHandle,
    skybox: ShaderHandle,
}

/// Draws the whole range through a [`GraphicsBackend`].
///
/// All assets are resolved and uploaded once at construction.
pub struct SceneRenderer<B: GraphicsBackend> {
    layout: SceneLayout,
    shaders: SceneShaders,
    ground_texture: TextureHandle,
    skybox: SkyboxHandle,
    plane: B::VertexArray,
    crosshair: B::VertexArray,
    tree: B::VertexArray,
    cabin: B::VertexArray,
    target: B::VertexArray,
    rifle: B::VertexArray,
    trees: InstanceBatch<B>,
}

impl<B: GraphicsBackend> SceneRenderer<B> {
    pub fn new(
        backend: &mut B,
        assets: &dyn AssetService,
        setup: SceneSetup<'_>,
        layout: SceneLayout,
    ) -> Result<Self, RenderError> {
        let shaders = SceneShaders {
            model: assets.shader(names::MODEL_SHADER)?,
            instanced: assets.shader(names::INSTANCED_SHADER)?,
            plane: assets.shader(names::PLANE_SHADER)?,
            crosshair: assets.shader(names::CROSSHAIR_SHADER)?,
            skybox: assets.shader(names::SKYBOX_SHADER)?,
        };

        let mut upload_mesh = |handle: MeshHandle| -> Result<B::VertexArray, RenderError> {
            let mesh = assets.mesh_data(handle)?;
            backend.create_vertex_array(&mesh.vertices, &VertexLayout::POSITION_NORMAL_UV)
        };
        let tree = upload_mesh(assets.mesh(setup.tree_model)?)?;
        let cabin = upload_mesh(assets.mesh(names::CABIN)?)?;
        let rifle = upload_mesh(assets.mesh(names::RIFLE)?)?;
        let target = upload_mesh(setup.target_model)?;

        let plane = backend.create_vertex_array(&PLANE_VERTICES, &VertexLayout::POSITION_NORMAL_UV)?;
        let crosshair = backend.create_vertex_array(&CROSSHAIR_VERTICES, &VertexLayout::POSITION)?;
        let trees = InstanceBatch::build(setup.tree_offsets, setup.tree_scale)?;

        tracing::info!(trees = trees.count(), "scene renderer ready");

        Ok(Self {
            layout,
            shaders,
            ground_texture: assets.texture(names::GRASS_TEXTURE)?,
            skybox: assets.skybox(names::NIGHT_SKYBOX)?,
            plane,
            crosshair,
            tree,
            cabin,
            target,
            rifle,
            trees,
        })
    }

    /// Draw one frame. `targets` holds the model matrix of each active target.
    pub fn draw(&mut self, backend: &mut B, ctx: &FrameContext, targets: &[Mat4]) -> Result<(), RenderError> {
        let _span = tracing::trace_span!("draw_scene", targets = targets.len()).entered();
        let layout = &self.layout;

        let mut trees = ShaderBinding::new(self.shaders.instanced);
        ctx.apply_world_lighting(&mut trees);
        trees.set_float("shininess", layout.tree_shininess);
        self.trees.draw(backend, &self.tree, &trees)?;

        let mut plane = ShaderBinding::new(self.shaders.plane);
        ctx.apply_world_lighting(&mut plane);
        plane
            .set_mat4("model", Mat4::IDENTITY)
            .set_int("texture_diffuse", 0)
            .bind_texture(self.ground_texture);
        backend.draw_arrays(&self.plane, &plane);

        let cabin = lit_model(self.shaders.model, ctx, layout.cabin_matrix(), layout.cabin_shininess);
        backend.draw_mesh(&self.cabin, &cabin);

        for &model in targets {
            let target = lit_model(self.shaders.model, ctx, model, layout.target_shininess);
            backend.draw_mesh(&self.target, &target);
        }

        let rifle_model = layout.rifle_matrix();
        let mut rifle = ShaderBinding::new(self.shaders.model);
        ctx.apply_held_item_lighting(&mut rifle);
        rifle
            .set_mat4("model", rifle_model)
            .set_mat3("invNormal", normal_matrix(rifle_model))
            .set_float("shininess", layout.rifle_shininess);
        backend.set_depth_range(0.0, layout.rifle_depth_far);
        backend.draw_mesh(&self.rifle, &rifle);
        backend.set_depth_range(0.0, 1.0);

        let mut sky = ShaderBinding::new(self.shaders.skybox);
        sky.set_mat4("view", ctx.skybox_view())
            .set_mat4("projection", ctx.projection);
        backend.draw_skybox(self.skybox, &sky);

        let mut crosshair = ShaderBinding::new(self.shaders.crosshair);
        crosshair
            .set_mat4("model", layout.crosshair_matrix())
            .set_vec3("color", layout.crosshair_color);
        backend.set_depth_test(false);
        backend.draw_arrays(&self.crosshair, &crosshair);
        backend.set_depth_test(true);

        Ok(())
    }

    /// Replace the tree placements; uploaded again on the next draw.
    pub fn rebuild_trees(&mut self, offsets: &[Vec3], scale: f32) -> Result<(), RenderError> {
        self.trees.rebuild(offsets, scale)
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub fn tree_count(&self) -> u32 {
        self.trees.count()
    }
}

fn lit_model(shader: ShaderHandle, ctx: &FrameContext, model: Mat4, shininess: f32) -> ShaderBinding {
    let mut binding = ShaderBinding::new(shader);
    ctx.apply_world_lighting(&mut binding);
    binding
        .set_mat4("model", model)
        .set_mat3("invNormal", normal_matrix(model))
        .set_float("shininess", shininess);
    binding
}
