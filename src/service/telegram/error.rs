use snafu::Snafu;

pub type Result<T, E = TelegramError> = ::std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum TelegramError {
    #[snafu(display("`{api}` cannot carry a bot path"))]
    ApiUrl { api: url::Url },

    #[snafu(display("cannot build the HTTP client: {source}"))]
    Client { source: reqwest::Error },

    #[snafu(display("request to the bot API failed: {source}"))]
    Request { source: reqwest::Error },

    #[snafu(display("rate limited, asked to wait {retry_after}s"))]
    RateLimited { retry_after: u64 },

    #[snafu(display("bot API answered {status}"))]
    Server { status: reqwest::StatusCode },

    #[snafu(display("malformed bot API response: {source}"))]
    Decode { source: reqwest::Error },

    #[snafu(display("bot API rejected the message: {description}"))]
    Rejected { description: String },
}

impl TelegramError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TelegramError::Request { .. }
                | TelegramError::RateLimited { .. }
                | TelegramError::Server { .. }
        )
    }
}
