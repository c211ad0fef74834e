use serde::{Deserialize, Serialize};
use std::fmt;

/// Forward/backward intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Longitudinal {
    Forward,
    Backward,
}

/// Turn intent. Turning always also creeps the car along its heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Steer {
    Left,
    Right,
}

/// Door intent for a single door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorSwing {
    Open,
    Close,
}

/// One tick worth of intents, resolved independently per axis.
///
/// The kernel consumes commands, never raw key events. A command with every
/// axis empty is the neutral (idle) command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveCommand {
    pub longitudinal: Option<Longitudinal>,
    pub steer: Option<Steer>,
    pub left_door: Option<DoorSwing>,
    pub right_door: Option<DoorSwing>,
    pub toggle_light: bool,
}

impl DriveCommand {
    pub const NEUTRAL: Self = Self {
        longitudinal: None,
        steer: None,
        left_door: None,
        right_door: None,
        toggle_light: false,
    };

    pub fn forward() -> Self {
        Self {
            longitudinal: Some(Longitudinal::Forward),
            ..Self::NEUTRAL
        }
    }

    pub fn backward() -> Self {
        Self {
            longitudinal: Some(Longitudinal::Backward),
            ..Self::NEUTRAL
        }
    }

    pub fn steer(steer: Steer) -> Self {
        Self {
            steer: Some(steer),
            ..Self::NEUTRAL
        }
    }

    pub fn toggle_light() -> Self {
        Self {
            toggle_light: true,
            ..Self::NEUTRAL
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// True when the command asks the car to move (translate and/or turn).
    pub fn is_moving(&self) -> bool {
        self.longitudinal.is_some() || self.steer.is_some()
    }
}

/// Compact compass-style token for logs: `n`, `sw`, `e`, `jk`, `p`, `-`.
impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_neutral() {
            return f.write_str("-");
        }
        match self.longitudinal {
            Some(Longitudinal::Forward) => f.write_str("n")?,
            Some(Longitudinal::Backward) => f.write_str("s")?,
            None => {}
        }
        match self.steer {
            Some(Steer::Left) => f.write_str("w")?,
            Some(Steer::Right) => f.write_str("e")?,
            None => {}
        }
        match self.left_door {
            Some(DoorSwing::Open) => f.write_str("j")?,
            Some(DoorSwing::Close) => f.write_str("h")?,
            None => {}
        }
        match self.right_door {
            Some(DoorSwing::Open) => f.write_str("k")?,
            Some(DoorSwing::Close) => f.write_str("l")?,
            None => {}
        }
        if self.toggle_light {
            f.write_str("p")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neutral() {
        assert!(DriveCommand::default().is_neutral());
        assert!(!DriveCommand::default().is_moving());
    }

    #[test]
    fn display_combines_axes() {
        let cmd = DriveCommand {
            longitudinal: Some(Longitudinal::Forward),
            steer: Some(Steer::Left),
            left_door: Some(DoorSwing::Open),
            right_door: None,
            toggle_light: true,
        };
        assert_eq!(cmd.to_string(), "nwjp");
        assert_eq!(DriveCommand::NEUTRAL.to_string(), "-");
        assert_eq!(DriveCommand::steer(Steer::Right).to_string(), "e");
    }

    #[test]
    fn steer_alone_is_moving() {
        assert!(DriveCommand::steer(Steer::Left).is_moving());
        assert!(!DriveCommand::toggle_light().is_moving());
    }
}
