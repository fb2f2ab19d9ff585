//! First-person camera and projection.
//!
//! # Invariants
//! - `front`, `right` and `up` are unit length and mutually orthogonal after
//!   every rotation.
//! - Pitch stays within `±pitch_limit` regardless of accumulated mouse input.
//! - The camera is either `Grounded` or `Jumping`; it only leaves the ground
//!   on an explicit jump request and returns when its height reaches the
//!   ground reference.

pub mod camera;
pub mod projection;

pub use camera::{Camera, CameraConfig, CameraController, LANDING_EPSILON, MotionState, SpeedLevel};
pub use projection::{OrthoBounds, Projection, ProjectionConfig};
