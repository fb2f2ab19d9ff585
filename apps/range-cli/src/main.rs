use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use range_assets::{AssetStore, names};
use range_input::{InputState, Key};
use range_kernel::{FrameOutcome, RangeConfig, RangeEvent, RangeWorld};
use range_render::{GraphicsBackend, RecordingBackend, SceneLayout, SceneRenderer, SceneSetup};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "range-cli", about = "CLI tool for shooting range operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the default asset set
    Info,
    /// Print the effective configuration as YAML
    Config {
        /// YAML config file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Also write the configuration to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run the range headless and print what happened
    Simulate {
        /// YAML config file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Wake the targets on the first frame
        #[arg(long)]
        awaken: bool,
        /// Fire once on the second frame
        #[arg(long)]
        fire: bool,
        /// Jump on the first frame
        #[arg(long)]
        jump: bool,
        /// Print the draw list of the last frame
        #[arg(long)]
        draws: bool,
    },
}

/// Key presses injected at fixed frames. Each press lasts one frame.
#[derive(Debug, Default, Clone, Copy)]
struct Script {
    awaken: bool,
    fire: bool,
    jump: bool,
}

impl Script {
    fn presses(&self, frame: u64, config: &RangeConfig) -> Vec<Key> {
        let bindings = &config.bindings;
        let mut keys = Vec::new();
        if frame == 0 && self.awaken {
            keys.push(bindings.awaken_targets);
        }
        if frame == 0 && self.jump {
            keys.push(bindings.jump);
        }
        if frame == 1 && self.fire {
            keys.push(bindings.fire);
        }
        keys
    }
}

struct SimulationReport {
    frames_run: u64,
    events: Vec<RangeEvent>,
    active_targets: usize,
    eye: Vec3,
    draw_summary: String,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RangeConfig> {
    match path {
        Some(path) => RangeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RangeConfig::default()),
    }
}

fn simulate(config: RangeConfig, frames: u64, dt: f32, script: Script) -> anyhow::Result<SimulationReport> {
    let assets = AssetStore::range_defaults();
    let mut world = RangeWorld::new(config.clone(), &assets)?;

    let mut backend = RecordingBackend::new();
    let tree_model = config.trees.model.as_str();
    let setup = SceneSetup {
        target_model: world.target_model(),
        tree_model,
        tree_offsets: &config.trees.offsets,
        tree_scale: config.trees.scale,
    };
    let mut renderer = SceneRenderer::new(&mut backend, &assets, setup, SceneLayout::default())?;

    let mut input = InputState::new();
    let mut events = Vec::new();
    let mut frames_run = 0;

    for frame in 0..frames {
        let presses = script.presses(frame, &config);
        for &key in &presses {
            input.on_key(key, true);
        }
        input.begin_frame(dt);
        let outcome = world.frame(&input);
        events.extend(world.drain_events());
        if outcome == FrameOutcome::Exit {
            tracing::info!(frame, "exit requested");
            break;
        }

        backend.begin_frame()?;
        renderer.draw(&mut backend, &world.frame_context(), &world.targets().active_transforms())?;
        backend.end_frame()?;

        input.end_frame();
        for key in presses {
            input.on_key(key, false);
        }
        frames_run += 1;
    }

    Ok(SimulationReport {
        frames_run,
        events,
        active_targets: world.targets().active_count(),
        eye: world.eye_position(),
        draw_summary: backend.summary(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("range-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", range_assets::crate_info());
            println!("render: {}", range_render::crate_info());
            let store = AssetStore::range_defaults();
            println!("default assets: {}", store.len());
            for (id, asset) in store.iter() {
                println!("  {:016x} {:<8} {}", id.0, asset.kind(), asset.name());
            }
            println!("scene meshes: {}, {}, {}, {}", names::TARGET, names::TREE, names::CABIN, names::RIFLE);
        }
        Commands::Config { config, out } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_yaml_string()?);
            if let Some(out) = out {
                config
                    .save(&out)
                    .with_context(|| format!("writing config {}", out.display()))?;
                tracing::info!(path = %out.display(), "config written");
            }
        }
        Commands::Simulate {
            config,
            frames,
            dt,
            awaken,
            fire,
            jump,
            draws,
        } => {
            let config = load_config(config.as_deref())?;
            let script = Script { awaken, fire, jump };
            let report = simulate(config, frames, dt, script)?;

            println!("Simulated {} frame(s)", report.frames_run);
            for event in &report.events {
                println!("  {event:?}");
            }
            println!("Active targets: {}", report.active_targets);
            let Vec3 { x, y, z } = report.eye;
            println!("Eye: ({x:.2}, {y:.2}, {z:.2})");
            if draws {
                print!("{}", report.draw_summary);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_kernel::TargetId;

    #[test]
    fn awaken_then_fire_takes_down_the_center_target() {
        let script = Script {
            awaken: true,
            fire: true,
            jump: false,
        };
        let report = simulate(RangeConfig::default(), 3, 1.0 / 60.0, script).unwrap();
        assert_eq!(report.frames_run, 3);
        assert!(report.events.contains(&RangeEvent::TargetsAwakened { count: 5 }));
        let hits = report.events.iter().find_map(|e| match e {
            RangeEvent::Shot { hits } => Some(hits.clone()),
            _ => None,
        });
        assert_eq!(hits, Some(vec![TargetId(0)]));
        assert_eq!(report.active_targets, 4);
    }

    #[test]
    fn jump_lands_within_a_second() {
        let script = Script {
            jump: true,
            ..Script::default()
        };
        let report = simulate(RangeConfig::default(), 60, 1.0 / 60.0, script).unwrap();
        assert!(report.events.contains(&RangeEvent::JumpStarted));
        assert!(report.events.contains(&RangeEvent::Landed));
        assert_eq!(report.eye.y, 0.0);
    }

    #[test]
    fn idle_run_draws_the_scene() {
        let report = simulate(RangeConfig::default(), 2, 1.0 / 60.0, Script::default()).unwrap();
        assert!(report.events.is_empty());
        assert!(report.draw_summary.contains("frames=2"));
        assert!(report.draw_summary.contains("instanced"));
    }
}
