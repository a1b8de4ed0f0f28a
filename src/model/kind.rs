use super::*;

/// The closed set of in-game events the herald announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Dragon attack foretold by the monk.
    Dragon,
    /// Serpent attack foretold by the monk.
    Serpent,
    /// The Mercenary Lord, announced with an absolute timestamp.
    Lord,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Dragon, EventKind::Serpent, EventKind::Lord];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Dragon => "dragon",
            EventKind::Serpent => "serpent",
            EventKind::Lord => "lord",
        }
    }

    pub fn is_countdown(self) -> bool {
        matches!(self, EventKind::Dragon | EventKind::Serpent)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
