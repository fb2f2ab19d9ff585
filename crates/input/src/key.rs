use serde::{Deserialize, Serialize};

/// Physical keys and buttons the range reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    P,
    V,
    Num1,
    Num2,
    Space,
    LeftShift,
    Escape,
    F1,
    MouseLeft,
    MouseRight,
}

impl Key {
    pub const ALL: [Key; 14] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::P,
        Key::V,
        Key::Num1,
        Key::Num2,
        Key::Space,
        Key::LeftShift,
        Key::Escape,
        Key::F1,
        Key::MouseLeft,
        Key::MouseRight,
    ];
}

/// Discrete per-frame state of a key.
///
/// `JustPressed` and `JustReleased` are edges: they last one frame and then
/// settle into `Pressed` / `Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Released,
    JustPressed,
    Pressed,
    JustReleased,
}

impl KeyState {
    /// Held this frame, including the frame it went down.
    pub fn is_down(self) -> bool {
        matches!(self, Self::JustPressed | Self::Pressed)
    }

    /// State after one frame boundary with no new event.
    pub fn settle(self) -> Self {
        match self {
            Self::JustPressed => Self::Pressed,
            Self::JustReleased => Self::Released,
            other => other,
        }
    }

    /// State after a press (`down == true`) or release event.
    pub fn with_event(self, down: bool) -> Self {
        match (self.is_down(), down) {
            (false, true) => Self::JustPressed,
            (true, false) => Self::JustReleased,
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_cycle() {
        let s = KeyState::Released.with_event(true);
        assert_eq!(s, KeyState::JustPressed);
        assert!(s.is_down());
        let s = s.settle();
        assert_eq!(s, KeyState::Pressed);
        let s = s.with_event(false);
        assert_eq!(s, KeyState::JustReleased);
        assert!(!s.is_down());
        assert_eq!(s.settle(), KeyState::Released);
    }

    #[test]
    fn key_repeat_does_not_retrigger_edge() {
        let s = KeyState::Pressed.with_event(true);
        assert_eq!(s, KeyState::Pressed);
        let s = KeyState::Released.with_event(false);
        assert_eq!(s, KeyState::Released);
    }
}
