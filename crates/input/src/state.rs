use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use crate::key::{Key, KeyState};

/// Read-only view of one frame of input.
pub trait InputSource {
    /// Discrete state of `key` for the current frame.
    fn key(&self, key: Key) -> KeyState;

    /// Mouse motion accumulated during the current frame.
    fn mouse_delta(&self) -> Vec2;

    /// Seconds elapsed since the previous frame.
    fn dt(&self) -> f32;

    fn just_pressed(&self, key: Key) -> bool {
        self.key(key) == KeyState::JustPressed
    }

    fn just_released(&self, key: Key) -> bool {
        self.key(key) == KeyState::JustReleased
    }

    fn is_down(&self, key: Key) -> bool {
        self.key(key).is_down()
    }
}

/// Edge-tracking input state fed by a host event loop.
///
/// Call [`InputState::begin_frame`] once per frame before consuming input;
/// events arriving between two `begin_frame` calls belong to the next frame.
///
/// A key pressed and released before the frame observes it still reports
/// `JustPressed` for that frame and `JustReleased` for the next.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: BTreeMap<Key, KeyState>,
    /// Releases deferred until the press edge has been observed.
    deferred_releases: BTreeSet<Key>,
    pending_delta: Vec2,
    frame_delta: Vec2,
    dt: f32,
    frame: u64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press (`down == true`) or release of `key`.
    pub fn on_key(&mut self, key: Key, down: bool) {
        let state = self.keys.entry(key).or_default();
        if *state == KeyState::JustPressed {
            if down {
                self.deferred_releases.remove(&key);
            } else {
                self.deferred_releases.insert(key);
            }
            return;
        }
        *state = state.with_event(down);
    }

    /// Accumulate raw mouse motion.
    pub fn on_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.pending_delta += Vec2::new(dx, dy);
    }

    /// Release every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        let held: Vec<Key> = self
            .keys
            .iter()
            .filter(|(_, s)| s.is_down())
            .map(|(&k, _)| k)
            .collect();
        tracing::debug!(held = held.len(), "releasing all keys");
        for key in held {
            self.on_key(key, false);
        }
    }

    /// Open a new frame lasting `dt` seconds.
    ///
    /// Edges recorded since the last [`InputState::end_frame`] are visible
    /// until the next `end_frame`.
    pub fn begin_frame(&mut self, dt: f32) {
        self.dt = dt.max(0.0);
        self.frame_delta = std::mem::take(&mut self.pending_delta);
        self.frame += 1;
    }

    /// Settle edges so they are not observed twice. Call after the frame consumed input.
    pub fn end_frame(&mut self) {
        for state in self.keys.values_mut() {
            *state = state.settle();
        }
        for key in std::mem::take(&mut self.deferred_releases) {
            if let Some(state) = self.keys.get_mut(&key) {
                *state = state.with_event(false);
            }
        }
        self.frame_delta = Vec2::ZERO;
    }

    /// Number of frames opened so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl InputSource for InputState {
    fn key(&self, key: Key) -> KeyState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    fn mouse_delta(&self) -> Vec2 {
        self.frame_delta
    }

    fn dt(&self) -> f32 {
        self.dt
    }
}
