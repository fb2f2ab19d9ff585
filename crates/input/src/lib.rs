//! Input source: per-key discrete states, mouse delta, frame time.
//!
//! Hosts feed raw press/release and motion events into an [`InputState`] and
//! advance it once per frame. Everything downstream reads through the
//! [`InputSource`] trait so tests can script input without a window.
//!
//! # Invariants
//! - A key is `JustPressed` / `JustReleased` for exactly one frame.
//! - Mouse delta is the motion accumulated since the previous frame only.

pub mod action;
pub mod key;
pub mod state;

pub use action::{Action, ActionMap};
pub use key::{Key, KeyState};
pub use state::{InputSource, InputState};
