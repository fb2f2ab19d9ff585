use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use range_assets::{AssetService, AssetStore, names};
use range_input::{InputState, Key};
use range_kernel::{FrameOutcome, RangeConfig, RangeWorld};
use range_render::{GraphicsBackend, SceneLayout, SceneRenderer, SceneSetup};
use range_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "range-desktop", about = "First-person shooting range")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyV => Key::V,
        KeyCode::Digit1 => Key::Num1,
        KeyCode::Digit2 => Key::Num2,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::Escape => Key::Escape,
        KeyCode::F1 => Key::F1,
        _ => return None,
    })
}

fn map_button(button: MouseButton) -> Option<Key> {
    match button {
        MouseButton::Left => Some(Key::MouseLeft),
        MouseButton::Right => Some(Key::MouseRight),
        _ => None,
    }
}

/// Window, surface and everything drawn into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    renderer: SceneRenderer<WgpuBackend>,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, world: &RangeWorld, assets: &AssetStore) -> Result<Self> {
        let projection = &world.config().projection;
        let attrs = Window::default_attributes()
            .with_title("Shooting Range")
            .with_inner_size(PhysicalSize::new(projection.width, projection.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("range_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface has no supported formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let mut backend = WgpuBackend::new(device, queue, format, config.width, config.height);
        let skybox = assets.skybox(names::NIGHT_SKYBOX)?;
        backend.set_skybox_color(skybox, assets.skybox_data(skybox)?.fallback_color);

        let range = world.config();
        let setup = SceneSetup {
            target_model: world.target_model(),
            tree_model: &range.trees.model,
            tree_offsets: &range.trees.offsets,
            tree_scale: range.trees.scale,
        };
        let renderer = SceneRenderer::new(&mut backend, assets, setup, SceneLayout::default())?;

        Ok(Self {
            window,
            surface,
            config,
            backend,
            renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(self.backend.device(), &self.config);
        self.backend.resize(self.config.width, self.config.height);
    }

    fn apply_cursor(&self, captured: bool) {
        let grab = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            tracing::warn!("cursor grab failed: {e}");
        }
        self.window.set_cursor_visible(!captured);
    }

    fn render(&mut self, world: &RangeWorld) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(self.backend.device(), &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let drawn = self.backend.begin_frame().and_then(|()| {
            self.renderer.draw(
                &mut self.backend,
                &world.frame_context(),
                &world.targets().active_transforms(),
            )?;
            self.backend.set_target(view);
            self.backend.end_frame()
        });
        if let Err(e) = drawn {
            tracing::error!("render failed: {e}");
        }
        output.present();
    }
}

struct RangeApp {
    assets: AssetStore,
    world: RangeWorld,
    input: InputState,
    gpu: Option<Gpu>,
    cursor_applied: Option<bool>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl RangeApp {
    fn new(config: RangeConfig) -> Result<Self> {
        let assets = AssetStore::range_defaults();
        let world = RangeWorld::new(config, &assets)?;
        Ok(Self {
            assets,
            world,
            input: InputState::new(),
            gpu: None,
            cursor_applied: None,
            last_frame: Instant::now(),
            error: None,
        })
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        self.input.begin_frame(dt);
        let outcome = self.world.frame(&self.input);
        self.input.end_frame();

        for event in self.world.drain_events() {
            tracing::debug!(?event, "range event");
        }
        if outcome == FrameOutcome::Exit {
            event_loop.exit();
            return;
        }

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let captured = self.world.cursor_captured();
        if self.cursor_applied != Some(captured) {
            gpu.apply_cursor(captured);
            self.cursor_applied = Some(captured);
        }
        gpu.render(&self.world);
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for RangeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.world, &self.assets) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.world.on_resize(size.width, size.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                self.world.on_resize(new_size.width, new_size.height);
            }
            WindowEvent::Focused(false) => {
                self.input.release_all();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(code) {
                    self.input.on_key(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(key) = map_button(button) {
                    self.input.on_key(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            // Window y grows downward; pitch grows upward.
            self.input.on_mouse_motion(delta.0 as f32, -(delta.1 as f32));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("range-desktop starting");

    let config = match &cli.config {
        Some(path) => RangeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RangeConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = RangeApp::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bound_key_has_a_physical_source() {
        let codes = [
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyS,
            KeyCode::KeyD,
            KeyCode::KeyP,
            KeyCode::KeyV,
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Space,
            KeyCode::ShiftLeft,
            KeyCode::Escape,
            KeyCode::F1,
        ];
        let mut mapped: Vec<Key> = codes.iter().filter_map(|&c| map_key(c)).collect();
        mapped.extend([MouseButton::Left, MouseButton::Right].into_iter().filter_map(map_button));
        mapped.sort();
        mapped.dedup();
        assert_eq!(mapped.len(), Key::ALL.len());
    }

    #[test]
    fn unbound_inputs_are_ignored() {
        assert_eq!(map_key(KeyCode::KeyQ), None);
        assert_eq!(map_button(MouseButton::Middle), None);
    }
}
