//! Turning noisy page markup into [`DetectedEvent`]s.
//!
//! Each page the herald polls has its own [`Strategy`]. The regular expressions a strategy
//! matches with are data handed in at construction, so a markup change on the site means
//! new patterns, not new code.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use snafu::{ensure, ResultExt, Snafu};

use crate::model::{DetectedEvent, EventKind};
use crate::time::Timestamp;

pub use duration::*;
pub use events::*;
pub use prophecy::*;

mod duration;
mod events;
mod prophecy;

/// The site pages the herald knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// The monastery, where the monk foretells beast attacks.
    Prophecy,
    /// The event feed, where the Mercenary Lord is announced.
    Events,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Page::Prophecy => f.write_str("prophecy"),
            Page::Events => f.write_str("events"),
        }
    }
}

/// Extraction strategy for one page kind.
///
/// Must not fail: finding nothing is the common case and yields an empty [`Extraction`].
pub trait Strategy: Send + Sync {
    fn page(&self) -> Page;

    fn extract(&self, html: &str, now: Timestamp) -> Extraction;
}

/// Result of one extraction call, at most one event per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction(BTreeMap<EventKind, DetectedEvent>);

impl Extraction {
    /// Keep `event`, replacing an earlier event of the same kind.
    pub fn insert(&mut self, event: DetectedEvent) {
        self.0.insert(event.kind, event);
    }

    /// Forget `kind`, as when a later mention of it cannot be read.
    pub fn remove(&mut self, kind: EventKind) -> Option<DetectedEvent> {
        self.0.remove(&kind)
    }

    pub fn get(&self, kind: EventKind) -> Option<&DetectedEvent> {
        self.0.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Extraction {
    type Item = DetectedEvent;
    type IntoIter = std::collections::btree_map::IntoValues<EventKind, DetectedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PatternError {
    #[snafu(display("invalid {name} pattern: {source}"))]
    InvalidPattern { name: &'static str, source: regex::Error },

    #[snafu(display("{name} pattern is missing the `{group}` capture group"))]
    MissingGroup {
        name: &'static str,
        group: &'static str,
    },

    #[snafu(display("location entry `{entry}` needs a name and a non-empty root"))]
    EmptyLocation { entry: String },
}

/// Compile a case-insensitive pattern and make sure it exposes the named groups we read.
pub(crate) fn compile(
    name: &'static str, pattern: &str, groups: &[&'static str],
) -> Result<Regex, PatternError> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .context(InvalidPatternSnafu { name })?;

    for &group in groups {
        ensure!(
            regex.capture_names().flatten().any(|found| found == group),
            MissingGroupSnafu { name, group }
        );
    }

    Ok(regex)
}
