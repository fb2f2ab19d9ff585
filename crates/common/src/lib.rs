//! Shared value types for the range runtime.
//!
//! Everything here is plain data or a pure function. Components that own
//! mutable state (camera, targets, batches) live in their own crates and
//! exchange these types by value.
//!
//! # Invariants
//! - `Ray::direction` is unit length.
//! - `Aabb::min <= Aabb::max` on every axis.

pub mod geometry;
pub mod light;
pub mod raycast;
mod types;

pub use geometry::{Aabb, Ray};
pub use light::{DirectionalLight, SpotLight, SpotlightPreset};
pub use types::{Directions, Transform};
