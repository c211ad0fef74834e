use std::fmt;

/// What a held key asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Forward,
    Backward,
    Left,
    Right,
    OpenLeftDoor,
    CloseLeftDoor,
    OpenRightDoor,
    CloseRightDoor,
    ToggleLight,
}

/// The keys the controller reacts to. Everything else is ignored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedKey {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowLeft,
    ArrowDown,
    ArrowRight,
    H,
    J,
    K,
    L,
    P,
}

impl TrackedKey {
    pub const ALL: [TrackedKey; 13] = [
        Self::W,
        Self::A,
        Self::S,
        Self::D,
        Self::ArrowUp,
        Self::ArrowLeft,
        Self::ArrowDown,
        Self::ArrowRight,
        Self::H,
        Self::J,
        Self::K,
        Self::L,
        Self::P,
    ];

    /// What holding this key asks for.
    pub fn role(self) -> KeyRole {
        match self {
            Self::W | Self::ArrowUp => KeyRole::Forward,
            Self::S | Self::ArrowDown => KeyRole::Backward,
            Self::A | Self::ArrowLeft => KeyRole::Left,
            Self::D | Self::ArrowRight => KeyRole::Right,
            Self::J => KeyRole::OpenLeftDoor,
            Self::H => KeyRole::CloseLeftDoor,
            Self::K => KeyRole::OpenRightDoor,
            Self::L => KeyRole::CloseRightDoor,
            Self::P => KeyRole::ToggleLight,
        }
    }

    /// Parse a key name as used in key scripts (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "w" => Self::W,
            "a" => Self::A,
            "s" => Self::S,
            "d" => Self::D,
            "up" => Self::ArrowUp,
            "left" => Self::ArrowLeft,
            "down" => Self::ArrowDown,
            "right" => Self::ArrowRight,
            "h" => Self::H,
            "j" => Self::J,
            "k" => Self::K,
            "l" => Self::L,
            "p" => Self::P,
            _ => return None,
        };
        Some(key)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::W => "w",
            Self::A => "a",
            Self::S => "s",
            Self::D => "d",
            Self::ArrowUp => "up",
            Self::ArrowLeft => "left",
            Self::ArrowDown => "down",
            Self::ArrowRight => "right",
            Self::H => "h",
            Self::J => "j",
            Self::K => "k",
            Self::L => "l",
            Self::P => "p",
        }
    }
}

impl fmt::Display for TrackedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
