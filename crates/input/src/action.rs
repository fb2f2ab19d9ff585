use range_common::{Directions, SpotlightPreset};
use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::state::InputSource;

/// A discrete command produced from one frame of input.
///
/// The world consumes actions, never raw key states, so bindings can be
/// remapped from configuration without touching frame logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the application.
    Quit,
    /// Toggle mouse capture.
    ToggleCursor,
    /// Reactivate every target.
    AwakenTargets,
    /// Toggle the camera flashlight.
    ToggleLamp,
    /// Switch flashlight intensity.
    SelectPreset(SpotlightPreset),
    /// Switch to run speed.
    Run,
    /// Switch back to walk speed.
    Walk,
    /// Begin a jump if grounded.
    Jump,
    /// Cast a shot along the view direction.
    Fire,
}

/// Key assignment for every action and movement direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionMap {
    pub forward: Key,
    pub backward: Key,
    pub left: Key,
    pub right: Key,
    pub quit: Key,
    pub toggle_cursor: Key,
    pub awaken_targets: Key,
    pub toggle_lamp: Key,
    pub preset_soft: Key,
    pub preset_bright: Key,
    pub run: Key,
    pub jump: Key,
    pub fire: Key,
}

impl Default for ActionMap {
    fn default() -> Self {
        Self {
            forward: Key::W,
            backward: Key::S,
            left: Key::A,
            right: Key::D,
            quit: Key::Escape,
            toggle_cursor: Key::F1,
            awaken_targets: Key::P,
            toggle_lamp: Key::V,
            preset_soft: Key::Num1,
            preset_bright: Key::Num2,
            run: Key::LeftShift,
            jump: Key::Space,
            fire: Key::MouseLeft,
        }
    }
}

impl ActionMap {
    /// Discrete actions triggered this frame, in processing order:
    /// quit, world commands, speed and jump, then fire.
    pub fn actions(&self, input: &dyn InputSource) -> Vec<Action> {
        let mut out = Vec::new();
        let edges = [
            (self.quit, Action::Quit),
            (self.toggle_cursor, Action::ToggleCursor),
            (self.awaken_targets, Action::AwakenTargets),
            (self.toggle_lamp, Action::ToggleLamp),
            (self.preset_soft, Action::SelectPreset(SpotlightPreset::Soft)),
            (self.preset_bright, Action::SelectPreset(SpotlightPreset::Bright)),
            (self.run, Action::Run),
        ];
        for (key, action) in edges {
            if input.just_pressed(key) {
                out.push(action);
            }
        }
        if input.just_released(self.run) {
            out.push(Action::Walk);
        }
        if input.just_pressed(self.jump) {
            out.push(Action::Jump);
        }
        if input.just_pressed(self.fire) {
            out.push(Action::Fire);
        }
        out
    }

    /// Movement directions currently held.
    pub fn directions(&self, input: &dyn InputSource) -> Directions {
        Directions {
            forward: input.is_down(self.forward),
            backward: input.is_down(self.backward),
            left: input.is_down(self.left),
            right: input.is_down(self.right),
        }
    }

    /// Every key referenced by this map.
    pub fn keys(&self) -> [Key; 13] {
        [
            self.forward,
            self.backward,
            self.left,
            self.right,
            self.quit,
            self.toggle_cursor,
            self.awaken_targets,
            self.toggle_lamp,
            self.preset_soft,
            self.preset_bright,
            self.run,
            self.jump,
            self.fire,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InputState;

    fn frame_with(keys: &[(Key, bool)]) -> InputState {
        let mut input = InputState::new();
        for &(key, down) in keys {
            input.on_key(key, down);
        }
        input.begin_frame(0.016);
        input
    }

    #[test]
    fn default_bindings_match_range_controls() {
        let map = ActionMap::default();
        assert_eq!(map.fire, Key::MouseLeft);
        assert_eq!(map.awaken_targets, Key::P);
        assert_eq!(map.jump, Key::Space);
    }

    #[test]
    fn quick_click_and_tap_still_fire_and_jump() {
        let map = ActionMap::default();
        let input = frame_with(&[
            (Key::MouseLeft, true),
            (Key::MouseLeft, false),
            (Key::Space, true),
            (Key::Space, false),
        ]);
        assert_eq!(map.actions(&input), vec![Action::Jump, Action::Fire]);
    }

    #[test]
    fn edges_produce_actions_in_order() {
        let map = ActionMap::default();
        let input = frame_with(&[
            (Key::MouseLeft, true),
            (Key::Space, true),
            (Key::P, true),
            (Key::Escape, true),
        ]);
        assert_eq!(
            map.actions(&input),
            vec![Action::Quit, Action::AwakenTargets, Action::Jump, Action::Fire]
        );
    }

    #[test]
    fn held_keys_do_not_repeat_actions() {
        let map = ActionMap::default();
        let mut input = frame_with(&[(Key::V, true)]);
        assert_eq!(map.actions(&input), vec![Action::ToggleLamp]);
        input.end_frame();
        input.begin_frame(0.016);
        assert!(map.actions(&input).is_empty());
    }

    #[test]
    fn shift_edges_switch_speed() {
        let map = ActionMap::default();
        let mut input = frame_with(&[(Key::LeftShift, true)]);
        assert_eq!(map.actions(&input), vec![Action::Run]);
        input.end_frame();
        input.on_key(Key::LeftShift, false);
        input.begin_frame(0.016);
        assert_eq!(map.actions(&input), vec![Action::Walk]);
    }

    #[test]
    fn presets_map_to_number_keys() {
        let map = ActionMap::default();
        let input = frame_with(&[(Key::Num1, true), (Key::Num2, true)]);
        assert_eq!(
            map.actions(&input),
            vec![
                Action::SelectPreset(SpotlightPreset::Soft),
                Action::SelectPreset(SpotlightPreset::Bright)
            ]
        );
    }

    #[test]
    fn directions_follow_held_keys() {
        let map = ActionMap::default();
        let mut input = frame_with(&[(Key::W, true), (Key::D, true)]);
        input.end_frame();
        input.begin_frame(0.016);
        let dirs = map.directions(&input);
        assert!(dirs.forward && dirs.right);
        assert!(!dirs.backward && !dirs.left);
    }

    #[test]
    fn rebinding_fire() {
        let map = ActionMap {
            fire: Key::MouseRight,
            ..ActionMap::default()
        };
        let input = frame_with(&[(Key::MouseLeft, true)]);
        assert!(map.actions(&input).is_empty());
        let input = frame_with(&[(Key::MouseRight, true)]);
        assert_eq!(map.actions(&input), vec![Action::Fire]);
    }
}
