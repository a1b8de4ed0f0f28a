use super::*;

/// Which notification of an occurrence a marker stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Lead-time threshold in seconds.
    Threshold(u64),
    /// The single notification of an absolute event.
    Once,
}

/// Key of a sent marker, rendered as `dragon_5400` or `lord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, new)]
pub struct MarkerKey {
    pub kind: EventKind,
    pub slot: Slot,
}

impl MarkerKey {
    pub fn threshold(kind: EventKind, seconds: u64) -> Self {
        Self::new(kind, Slot::Threshold(seconds))
    }

    pub fn once(kind: EventKind) -> Self {
        Self::new(kind, Slot::Once)
    }
}

impl std::fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.slot {
            Slot::Threshold(seconds) => write!(f, "{}_{}", self.kind, seconds),
            Slot::Once => write!(f, "{}", self.kind),
        }
    }
}
