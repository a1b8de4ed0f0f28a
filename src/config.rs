use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use snafu::{OptionExt as _, ResultExt as _};
use url::Url;

use crate::compose::Composer;
use crate::error::{
    ApplicationError, ConfigLoadSnafu, DispatcherSnafu, InvalidOffsetSnafu, PatternSnafu,
};
use crate::extract::{
    default_locations, DigitFallback, EventFeedStrategy, EventPatterns, Location, ProphecyPatterns,
    ProphecyStrategy, Strategy,
};
use crate::model::EventKind;
use crate::monitor::Monitor;
use crate::schedule::{Reconciler, Scheduler, SkippedThresholds};
use crate::service::site::{Site, SiteConfig};
use crate::service::state::StateStore;
use crate::service::telegram::{Telegram, TelegramConfig};
use crate::time::ReferenceZone;

/// Process configuration, read once from the environment at startup.
#[serde_as]
#[derive(Clone, Deserialize)]
pub struct Config {
    pub bot_token: String,
    #[serde(default)]
    pub chat_ids: Vec<String>,
    #[serde(default = "TelegramConfig::default_api")]
    pub telegram_api: Url,
    #[serde(default)]
    pub silent: bool,
    #[serde(default = "defaults::attempts")]
    pub send_attempts: usize,

    #[serde(default = "defaults::cookies_file")]
    pub cookies_file: PathBuf,
    pub cookie_domain: Option<String>,
    #[serde(default = "defaults::session_cookie")]
    pub session_cookie: String,
    pub site_url: Option<Url>,
    #[serde(default = "defaults::prophecy_path")]
    pub prophecy_path: String,
    #[serde(default = "defaults::events_path")]
    pub events_path: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout: humantime::Duration,
    #[serde(default = "defaults::attempts")]
    pub fetch_attempts: usize,

    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,
    #[serde(default = "defaults::log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "defaults::thresholds")]
    pub thresholds: Vec<u64>,
    #[serde(default)]
    pub skipped_thresholds: SkippedThresholds,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "defaults::drift_tolerance")]
    pub drift_tolerance: humantime::Duration,
    #[serde(default)]
    pub digit_fallback: DigitFallback,
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,

    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval: humantime::Duration,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub run_for: Option<humantime::Duration>,

    #[serde(default = "defaults::dragon_target")]
    pub dragon_target: String,
    #[serde(default = "defaults::serpent_target")]
    pub serpent_target: String,

    pub prophecy_pattern: Option<String>,
    pub card_pattern: Option<String>,
    pub boss_pattern: Option<String>,
    pub location_pattern: Option<String>,
    /// `Name` or `Name=root` entries.
    #[serde(default)]
    pub locations: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }

    pub fn poll_interval(&self) -> Duration {
        *self.poll_interval
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for.as_deref().copied()
    }

    pub fn zone(&self) -> Result<ReferenceZone, ApplicationError> {
        let hours = self.utc_offset_hours;
        ReferenceZone::from_hours(hours).context(InvalidOffsetSnafu { hours })
    }

    pub fn site(&self) -> Site {
        Site::new(SiteConfig {
            cookies_file: self.cookies_file.clone(),
            cookie_domain: self.cookie_domain.clone(),
            session_cookie: self.session_cookie.clone(),
            base_url: self.site_url.clone(),
            prophecy_path: self.prophecy_path.clone(),
            events_path: self.events_path.clone(),
            timeout: *self.request_timeout,
            attempts: self.fetch_attempts,
        })
    }

    pub fn telegram(&self) -> Result<Telegram, ApplicationError> {
        Telegram::new(TelegramConfig {
            api: self.telegram_api.clone(),
            token: self.bot_token.clone(),
            timeout: *self.request_timeout,
            attempts: self.send_attempts,
            pause: Duration::from_millis(50),
        })
        .context(DispatcherSnafu)
    }

    pub fn strategies(&self, zone: ReferenceZone) -> Result<Vec<Box<dyn Strategy>>, ApplicationError> {
        let mut prophecy = ProphecyPatterns {
            fallback: self.digit_fallback,
            ..ProphecyPatterns::default()
        };
        if let Some(phrase) = &self.prophecy_pattern {
            prophecy.phrase = phrase.clone();
        }

        let mut events = EventPatterns::default();
        if let Some(card) = &self.card_pattern {
            events.card = card.clone();
        }
        if let Some(boss) = &self.boss_pattern {
            events.boss = boss.clone();
        }
        if let Some(location) = &self.location_pattern {
            events.location = location.clone();
        }
        events.locations = self.locations()?;

        Ok(vec![
            Box::new(ProphecyStrategy::new(prophecy).context(PatternSnafu)?),
            Box::new(EventFeedStrategy::new(events, zone).context(PatternSnafu)?),
        ])
    }

    fn locations(&self) -> Result<Vec<Location>, ApplicationError> {
        let configured = self
            .locations
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| entry.parse::<Location>())
            .collect::<Result<Vec<_>, _>>()
            .context(PatternSnafu)?;

        if configured.is_empty() {
            Ok(default_locations())
        } else {
            Ok(configured)
        }
    }

    /// Wire every component together.
    pub fn monitor(&self) -> Result<Monitor<Site, Telegram>, ApplicationError> {
        let zone = self.zone()?;
        let drift_tolerance = chrono::Duration::from_std(*self.drift_tolerance)
            .unwrap_or_else(|_| chrono::Duration::seconds(crate::schedule::DRIFT_TOLERANCE_SECS));

        if self.chat_ids.is_empty() {
            tracing::warn!("CHAT_IDS is empty, notifications will go nowhere");
        }

        Ok(Monitor {
            source: self.site(),
            dispatcher: self.telegram()?,
            store: StateStore::new(self.state_file.clone()),
            strategies: self.strategies(zone)?,
            reconciler: Reconciler::new(zone, drift_tolerance),
            scheduler: Scheduler::new(self.thresholds.iter().copied(), self.skipped_thresholds, zone),
            composer: Composer::new(
                zone,
                [
                    (EventKind::Dragon, self.dragon_target.clone()),
                    (EventKind::Serpent, self.serpent_target.clone()),
                ],
            ),
            zone,
            recipients: self.chat_ids.clone(),
            silent: self.silent,
        })
    }
}

mod defaults {
    use std::path::PathBuf;
    use std::time::Duration;

    pub fn attempts() -> usize {
        3
    }

    pub fn cookies_file() -> PathBuf {
        PathBuf::from("cookies.json")
    }

    pub fn session_cookie() -> String {
        "wekings_session".to_string()
    }

    pub fn prophecy_path() -> String {
        "/monastic".to_string()
    }

    pub fn events_path() -> String {
        "/events".to_string()
    }

    pub fn request_timeout() -> humantime::Duration {
        Duration::from_secs(20).into()
    }

    pub fn state_file() -> PathBuf {
        PathBuf::from("notify_state.json")
    }

    pub fn log_dir() -> PathBuf {
        PathBuf::from("logs")
    }

    pub fn thresholds() -> Vec<u64> {
        vec![5400, 2400, 120]
    }

    pub fn drift_tolerance() -> humantime::Duration {
        Duration::from_secs(120).into()
    }

    pub fn utc_offset_hours() -> i32 {
        3
    }

    pub fn poll_interval() -> humantime::Duration {
        Duration::from_secs(60).into()
    }

    pub fn dragon_target() -> String {
        "Гранд".to_string()
    }

    pub fn serpent_target() -> String {
        "Норлунг".to_string()
    }
}
