//! Range kernel: targets, configuration and the authoritative frame update.
//!
//! # Invariants
//! - All state mutations flow through [`RangeWorld::frame`] or explicit
//!   operations and are recorded in its event log.
//! - A target is hit-tested only while active and with fresh bounds.

pub mod config;
pub mod targets;
pub mod world;

pub use config::{ConfigError, RangeConfig, TargetConfig, TreeConfig};
pub use targets::{HitPolicy, Target, TargetId, TargetSet};
pub use world::{FrameOutcome, RangeEvent, RangeWorld, SceneError};
