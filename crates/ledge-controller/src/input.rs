use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Control signals for one tick. Every flag means "pressed this tick"; the
/// controller consumes the whole struct on each update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub left: bool,
    pub right: bool,
    /// Climb up while on a ladder.
    pub up: bool,
    /// Climb down while on a ladder. Also lets go of a grabbed ledge.
    pub down: bool,
    /// Grab a ladder the character overlaps.
    pub ladder: bool,
    /// Let go of the ladder immediately.
    pub release_ladder: bool,
    pub jump: bool,
    /// Let go of a grabbed ledge.
    pub release: bool,
}

impl ControlInput {
    pub fn press(&mut self, signal: ControlSignal) {
        match signal {
            ControlSignal::Left => self.left = true,
            ControlSignal::Right => self.right = true,
            ControlSignal::Up => self.up = true,
            ControlSignal::Down => self.down = true,
            ControlSignal::Ladder => self.ladder = true,
            ControlSignal::ReleaseLadder => self.release_ladder = true,
            ControlSignal::Jump => self.jump = true,
            ControlSignal::Release => self.release = true,
        }
    }

    pub fn with(mut self, signal: ControlSignal) -> Self {
        self.press(signal);
        self
    }

    /// Controls pressed in either input.
    pub fn merged(self, other: ControlInput) -> Self {
        Self {
            left: self.left || other.left,
            right: self.right || other.right,
            up: self.up || other.up,
            down: self.down || other.down,
            ladder: self.ladder || other.ladder,
            release_ladder: self.release_ladder || other.release_ladder,
            jump: self.jump || other.jump,
            release: self.release || other.release,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// A single named control, for scripted or data-driven input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlSignal {
    Left,
    Right,
    Up,
    Down,
    Ladder,
    ReleaseLadder,
    Jump,
    Release,
}

impl ControlSignal {
    pub const ALL: [ControlSignal; 8] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::Ladder,
        Self::ReleaseLadder,
        Self::Jump,
        Self::Release,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Ladder => "Ladder",
            Self::ReleaseLadder => "Release Ladder",
            Self::Jump => "Jump",
            Self::Release => "Release",
        }
    }
}

impl std::fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSignal(pub String);

impl std::fmt::Display for UnknownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown control signal: {:?}", self.0)
    }
}

impl std::error::Error for UnknownSignal {}

impl FromStr for ControlSignal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.name() == s)
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for signal in ControlSignal::ALL {
            assert_eq!(signal.name().parse::<ControlSignal>(), Ok(signal));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("left".parse::<ControlSignal>().is_err());
        assert!("Fly".parse::<ControlSignal>().is_err());
        assert!("".parse::<ControlSignal>().is_err());
    }

    #[test]
    fn press_sets_only_its_flag() {
        let input = ControlInput::default().with(ControlSignal::ReleaseLadder);
        assert!(input.release_ladder);
        assert!(!input.release);
        assert!(!input.is_idle());
        assert!(ControlInput::default().is_idle());
    }

    #[test]
    fn presses_accumulate() {
        let mut input = ControlInput::default();
        input.press(ControlSignal::Right);
        input.press(ControlSignal::Jump);
        assert!(input.right && input.jump);
        assert!(!input.left);
    }

    #[test]
    fn merge_keeps_both_sides() {
        let a = ControlInput::default().with(ControlSignal::Left);
        let b = ControlInput::default().with(ControlSignal::Jump);
        let merged = a.merged(b);
        assert!(merged.left && merged.jump);
        assert!(!merged.right);
        assert_eq!(merged.merged(ControlInput::default()), merged);
    }
}
