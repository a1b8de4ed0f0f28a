use chrono::NaiveDateTime;
use regex::Regex;
use scraper::Html;

use super::*;
use crate::time::ReferenceZone;

/// A card of the event feed: header span, `HH:MM DD.MM.YY` span, body paragraph.
pub const DEFAULT_CARD_PATTERN: &str = r"(?s)<span[^>]*>(?P<header>[^<]*)</span>\s*<span[^>]*>\s*(?P<stamp>\d{2}:\d{2}\s+\d{2}\.\d{2}\.\d{2})\s*</span>\s*<p[^>]*>(?P<body>.*?)</p>";

/// "Владыка Наёмников" in any case ending, with or without the diaeresis.
pub const DEFAULT_BOSS_PATTERN: &str = r"Владык\w*\s+На[её]мник\w*";

pub const DEFAULT_LOCATION_PATTERN: &str =
    r"Готовьтесь\s+к\s+бою\s+в\s+(?P<location>[А-ЯЁA-Z][^.!?\n<]+)";

const STAMP_FORMAT: &str = "%H:%M %d.%m.%y";

/// A place the boss can show up at.
///
/// Written as `Name` or `Name=root`; the text on the page is accepted if its lowercase form
/// contains `root` (defaults to the lowercase name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub root: String,
}

impl std::str::FromStr for Location {
    type Err = PatternError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, root) = input.split_once('=').unwrap_or((input, input));
        let (name, root) = (name.trim(), root.trim());

        // an empty root would match any captured place
        snafu::ensure!(
            !name.is_empty() && !root.is_empty(),
            EmptyLocationSnafu { entry: input }
        );

        Ok(Self {
            name: name.to_string(),
            root: root.to_lowercase(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EventPatterns {
    /// Must capture `header`, `stamp` and `body`.
    pub card: String,
    pub boss: String,
    /// Must capture `location`.
    pub location: String,
    pub locations: Vec<Location>,
}

impl Default for EventPatterns {
    fn default() -> Self {
        Self {
            card: DEFAULT_CARD_PATTERN.to_string(),
            boss: DEFAULT_BOSS_PATTERN.to_string(),
            location: DEFAULT_LOCATION_PATTERN.to_string(),
            locations: default_locations(),
        }
    }
}

pub fn default_locations() -> Vec<Location> {
    ["Гранд", "Норлунг"]
        .into_iter()
        .map(|name| Location {
            name: name.to_string(),
            root: name.to_lowercase(),
        })
        .collect()
}

/// Absolute-timestamp strategy for the event feed.
#[derive(Debug, Clone)]
pub struct EventFeedStrategy {
    card: Regex,
    boss: Regex,
    location: Regex,
    locations: Vec<Location>,
    zone: ReferenceZone,
}

impl EventFeedStrategy {
    pub fn new(patterns: EventPatterns, zone: ReferenceZone) -> Result<Self, PatternError> {
        Ok(Self {
            card: compile("card", &patterns.card, &["header", "stamp", "body"])?,
            boss: compile("boss", &patterns.boss, &[])?,
            location: compile("location", &patterns.location, &["location"])?,
            locations: patterns.locations,
            zone,
        })
    }

    /// Visible text of a markup fragment, entities decoded and whitespace collapsed.
    fn text(markup: &str) -> String {
        let fragment = Html::parse_fragment(markup);
        let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn parse_stamp(&self, stamp: &str) -> Option<Timestamp> {
        let stamp = stamp.split_whitespace().collect::<Vec<_>>().join(" ");
        let local = NaiveDateTime::parse_from_str(&stamp, STAMP_FORMAT).ok()?;
        self.zone.resolve(local)
    }

    /// Place named in the card body, if it is one we know. Garbled names are dropped.
    fn location(&self, body: &str) -> Option<String> {
        let raw = self.location.captures(body)?.name("location")?.as_str().to_lowercase();
        let known = self.locations.iter().find(|place| raw.contains(&place.root));

        if known.is_none() {
            tracing::debug!(location = %raw, "dropping unknown location");
        }

        known.map(|place| place.name.clone())
    }
}

impl Strategy for EventFeedStrategy {
    fn page(&self) -> Page {
        Page::Events
    }

    fn extract(&self, html: &str, now: Timestamp) -> Extraction {
        let today = self.zone.today(now);
        let mut latest: Option<(Timestamp, String)> = None;

        for captures in self.card.captures_iter(html) {
            let header = Self::text(captures.name("header").map_or("", |m| m.as_str()));
            let body = Self::text(captures.name("body").map_or("", |m| m.as_str()));

            if !self.boss.is_match(&header) && !self.boss.is_match(&body) {
                continue;
            }

            let stamp = captures.name("stamp").map_or("", |m| m.as_str());
            let Some(at) = self.parse_stamp(stamp) else {
                tracing::debug!(stamp, "skipping card with unreadable timestamp");
                continue;
            };

            if self.zone.today(at) != today {
                continue;
            }

            if latest.as_ref().map_or(true, |(best, _)| at >= *best) {
                latest = Some((at, body));
            }
        }

        let mut extraction = Extraction::default();
        if let Some((at, body)) = latest {
            let location = self.location(&body);
            extraction.insert(DetectedEvent::absolute(EventKind::Lord, at, location));
        }

        extraction
    }
}
