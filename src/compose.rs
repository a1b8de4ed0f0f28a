use std::collections::BTreeMap;

use crate::model::EventKind;
use crate::time::{ReferenceZone, Timestamp};

/// Compact Russian rendering of a remaining time: "45 с", "40 мин", "2 ч", "1 ч 30 мин".
pub fn humanize(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{seconds} с");
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes} мин");
    }

    let (hours, minutes) = (minutes / 60, minutes % 60);
    if minutes == 0 {
        format!("{hours} ч")
    } else {
        format!("{hours} ч {minutes} мин")
    }
}

/// Renders notification text for the chat.
#[derive(Debug, Clone)]
pub struct Composer {
    zone: ReferenceZone,
    /// City each beast is heading for.
    targets: BTreeMap<EventKind, String>,
}

impl Composer {
    pub fn new(zone: ReferenceZone, targets: impl IntoIterator<Item = (EventKind, String)>) -> Self {
        Self {
            zone,
            targets: targets.into_iter().collect(),
        }
    }

    pub fn compose(
        &self, kind: EventKind, seconds_left: i64, predicted_at: Timestamp, now: Timestamp,
        location: Option<&str>,
    ) -> String {
        let left = humanize(seconds_left);
        let clock = self.clock(predicted_at, now);

        match kind {
            EventKind::Dragon | EventKind::Serpent => {
                let (emoji, beast) = match kind {
                    EventKind::Dragon => ("🐉", "дракона"),
                    _ => ("🐍", "змея"),
                };
                let target = self
                    .targets
                    .get(&kind)
                    .map(|city| format!(" на <b>{city}</b>"))
                    .unwrap_or_default();

                format!(
                    "{emoji} <b>Храбрые викинги, внимание!</b> Мудрый монах предрекает нападение {beast}{target} через <b>{left}</b> (около {clock})!"
                )
            }
            EventKind::Lord => {
                let headline = match location {
                    Some(city) => format!("К городу {city} приближается Владыка Наёмников!"),
                    None => "Приближается Владыка Наёмников!".to_string(),
                };

                format!("⚔️ <b>{headline}</b> Готовьтесь к бою через <b>{left}</b> (в {clock})!")
            }
        }
    }

    /// `HH:MM` in the reference timezone, with the date appended when it is not today.
    fn clock(&self, at: Timestamp, now: Timestamp) -> String {
        let local = self.zone.local(at);
        if self.zone.today(at) == self.zone.today(now) {
            local.format("%H:%M").to_string()
        } else {
            local.format("%H:%M %d.%m").to_string()
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(
            ReferenceZone::default(),
            [
                (EventKind::Dragon, "Гранд".to_string()),
                (EventKind::Serpent, "Норлунг".to_string()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        // 12:00 at +03:00
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn humanize_units() {
        assert_eq!(humanize(45), "45 с");
        assert_eq!(humanize(2400), "40 мин");
        assert_eq!(humanize(7200), "2 ч");
        assert_eq!(humanize(5430), "1 ч 30 мин");
    }

    #[test]
    fn dragon_message() {
        let at = now() + Duration::minutes(40);
        let text = Composer::default().compose(EventKind::Dragon, 2400, at, now(), None);

        assert_eq!(
            text,
            "🐉 <b>Храбрые викинги, внимание!</b> Мудрый монах предрекает нападение дракона на <b>Гранд</b> через <b>40 мин</b> (около 12:40)!"
        );
    }

    #[test]
    fn serpent_without_known_target() {
        let composer = Composer::new(ReferenceZone::default(), []);
        let at = now() + Duration::seconds(90);
        let text = composer.compose(EventKind::Serpent, 90, at, now(), None);

        assert!(text.starts_with("🐍 "));
        assert!(text.contains("нападение змея через <b>1 мин</b> (около 12:01)"));
    }

    #[test]
    fn lord_message_with_and_without_location() {
        let composer = Composer::default();
        let at = now() + Duration::hours(2);

        let with = composer.compose(EventKind::Lord, 7200, at, now(), Some("Норлунг"));
        assert_eq!(
            with,
            "⚔️ <b>К городу Норлунг приближается Владыка Наёмников!</b> Готовьтесь к бою через <b>2 ч</b> (в 14:00)!"
        );

        let without = composer.compose(EventKind::Lord, 7200, at, now(), None);
        assert!(without.contains("<b>Приближается Владыка Наёмников!</b>"));
    }

    #[test]
    fn date_suffix_after_midnight() {
        let at = now() + Duration::hours(13);
        let text = Composer::default().compose(EventKind::Dragon, 46_800, at, now(), None);

        assert!(text.contains("(около 01:00 02.05)"), "{text}");
    }
}
