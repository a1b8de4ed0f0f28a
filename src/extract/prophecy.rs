use regex::Regex;

use super::*;

/// "Предвижу нападение <beast> через <time>" as written by the monk.
pub const DEFAULT_PROPHECY_PATTERN: &str =
    r"Предвижу\s+нападение\s+(?P<beast>\S+)\s+через\s*(?P<time>[0-9:\s]+)?";

/// Maps beast names containing `root` to `kind`. Matched against the lowercased name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeastName {
    pub root: String,
    pub kind: EventKind,
}

impl BeastName {
    pub fn new(root: &str, kind: EventKind) -> Self {
        Self {
            root: root.to_lowercase(),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProphecyPatterns {
    /// Must capture `beast` and `time`.
    pub phrase: String,
    pub beasts: Vec<BeastName>,
    pub fallback: DigitFallback,
}

impl Default for ProphecyPatterns {
    fn default() -> Self {
        Self {
            phrase: DEFAULT_PROPHECY_PATTERN.to_string(),
            beasts: vec![
                BeastName::new("дракон", EventKind::Dragon),
                BeastName::new("зме", EventKind::Serpent),
            ],
            fallback: DigitFallback::default(),
        }
    }
}

/// Countdown strategy for the prophecy page.
#[derive(Debug, Clone)]
pub struct ProphecyStrategy {
    phrase: Regex,
    beasts: Vec<BeastName>,
    fallback: DigitFallback,
}

impl ProphecyStrategy {
    pub fn new(patterns: ProphecyPatterns) -> Result<Self, PatternError> {
        let phrase = compile("prophecy", &patterns.phrase, &["beast", "time"])?;

        Ok(Self {
            phrase,
            beasts: patterns.beasts,
            fallback: patterns.fallback,
        })
    }

    fn classify(&self, beast: &str) -> Option<EventKind> {
        let beast = beast.to_lowercase();
        self.beasts
            .iter()
            .find(|name| beast.contains(&name.root))
            .map(|name| name.kind)
    }
}

impl Strategy for ProphecyStrategy {
    fn page(&self) -> Page {
        Page::Prophecy
    }

    fn extract(&self, html: &str, now: Timestamp) -> Extraction {
        let mut extraction = Extraction::default();

        for captures in self.phrase.captures_iter(html) {
            let beast = captures.name("beast").map_or("", |m| m.as_str());
            let Some(kind) = self.classify(beast) else {
                tracing::debug!(beast, "ignoring prophecy about an unknown beast");
                continue;
            };

            let seconds = captures
                .name("time")
                .and_then(|m| parse_duration(m.as_str(), self.fallback))
                .and_then(|seconds| u32::try_from(seconds).ok());

            // the latest mention decides, even when it cannot be read
            let Some(seconds) = seconds else {
                tracing::debug!(%kind, "prophecy without a readable countdown");
                extraction.remove(kind);
                continue;
            };

            extraction.insert(DetectedEvent::countdown(kind, seconds, now));
        }

        extraction
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn strategy() -> ProphecyStrategy {
        ProphecyStrategy::new(ProphecyPatterns::default()).unwrap()
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn both_beasts_on_one_page() {
        let html = r#"
            <div class="monk">
              <p>Предвижу нападение дракона через 1:30:00</p>
              <p>Предвижу нападение змея через 45:10</p>
            </div>"#;

        let extraction = strategy().extract(html, now());

        assert_eq!(extraction.len(), 2);
        assert_eq!(
            extraction.get(EventKind::Dragon),
            Some(&DetectedEvent::countdown(EventKind::Dragon, 5400, now()))
        );
        assert_eq!(
            extraction.get(EventKind::Serpent),
            Some(&DetectedEvent::countdown(EventKind::Serpent, 2710, now()))
        );
    }

    #[test]
    fn phrase_is_case_insensitive() {
        let html = "ПРЕДВИЖУ НАПАДЕНИЕ Дракона через 120";
        let extraction = strategy().extract(html, now());

        assert_eq!(
            extraction.get(EventKind::Dragon),
            Some(&DetectedEvent::countdown(EventKind::Dragon, 120, now()))
        );
    }

    #[test]
    fn unknown_beast_is_ignored() {
        let html = "Предвижу нападение кракена через 10:00";
        assert!(strategy().extract(html, now()).is_empty());
    }

    #[test]
    fn later_mention_of_the_same_beast_wins() {
        let html = "Предвижу нападение змея через 50:00 ... Предвижу нападение змеи через 40:00";
        let extraction = strategy().extract(html, now());

        assert_eq!(
            extraction.get(EventKind::Serpent),
            Some(&DetectedEvent::countdown(EventKind::Serpent, 2400, now()))
        );
    }

    #[test]
    fn missing_countdown_is_a_miss() {
        let html = "Предвижу нападение дракона через <b>скоро</b>";
        assert!(strategy().extract(html, now()).is_empty());
    }

    #[test]
    fn unreadable_later_mention_drops_the_earlier_countdown() {
        let html = "<p>Предвижу нападение дракона через 1:30:00</p> \
                    <p>Предвижу нападение дракона через <b>скоро</b></p> \
                    <p>Предвижу нападение змея через 40:00</p>";
        let extraction = strategy().extract(html, now());

        assert_eq!(extraction.get(EventKind::Dragon), None);
        assert_eq!(
            extraction.get(EventKind::Serpent),
            Some(&DetectedEvent::countdown(EventKind::Serpent, 2400, now()))
        );
    }

    #[test]
    fn readable_mention_after_unreadable_one_counts() {
        let html = "Предвижу нападение дракона через ?? ... Предвижу нападение дракона через 2:00";
        let extraction = strategy().extract(html, now());

        assert_eq!(
            extraction.get(EventKind::Dragon),
            Some(&DetectedEvent::countdown(EventKind::Dragon, 120, now()))
        );
    }

    #[test]
    fn page_without_prophecy() {
        assert!(strategy().extract("<html><body>Монах молчит</body></html>", now()).is_empty());
    }

    #[test]
    fn custom_vocabulary() {
        let patterns = ProphecyPatterns {
            phrase: r"(?P<beast>\w+) arrives in (?P<time>[0-9:]+)".to_string(),
            beasts: vec![BeastName::new("Wyrm", EventKind::Dragon)],
            fallback: DigitFallback::Strict,
        };
        let strategy = ProphecyStrategy::new(patterns).unwrap();

        let extraction = strategy.extract("the wyrm arrives in 2:00", now());
        assert_eq!(
            extraction.get(EventKind::Dragon),
            Some(&DetectedEvent::countdown(EventKind::Dragon, 120, now()))
        );
    }
}
