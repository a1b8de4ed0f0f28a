use snafu::{Location, Snafu};

use crate::extract::PatternError;
use crate::service::telegram::TelegramError;

/// Everything that stops the herald from starting. Nothing after startup is fatal.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApplicationError {
    /// Could not read the configuration from the environment
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// The UTC offset does not describe a real timezone
    #[snafu(display("UTC offset of {hours}h is out of range"))]
    InvalidOffset {
        hours: i32,
        #[snafu(implicit)]
        location: Location,
    },

    /// An extraction pattern from the configuration does not compile
    #[snafu(display("bad extraction pattern: {source}"))]
    Pattern {
        source: PatternError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not set up the bot API client
    #[snafu(display("cannot set up the dispatcher: {source}"))]
    Dispatcher {
        source: TelegramError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}
