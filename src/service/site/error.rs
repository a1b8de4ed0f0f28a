use std::path::PathBuf;

use snafu::Snafu;

use crate::extract::Page;

pub type Result<T, E = SiteError> = ::std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum SiteError {
    #[snafu(display("cannot read cookie file `{}`: {source}", path.display()))]
    ReadCookies {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("unsupported cookie file `{}`: expected a list or {{\"cookies\": [...]}}: {source}", path.display()))]
    CookieFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("no cookie carries a domain"))]
    NoDomain,

    #[snafu(display("no applicable cookies for domain `{domain}`"))]
    NoCookies { domain: String },

    #[snafu(display("`{text}` is not a usable site address: {source}"))]
    SiteUrl {
        text: String,
        source: url::ParseError,
    },

    #[snafu(display("cannot build the HTTP client: {source}"))]
    Client { source: reqwest::Error },

    #[snafu(display("request for the {page} page failed: {source}"))]
    Request { page: Page, source: reqwest::Error },

    #[snafu(display("not logged in while fetching the {page} page (landed on {url}), check the cookies"))]
    Unauthenticated { page: Page, url: String },
}

impl SiteError {
    /// Worth another attempt: network trouble or an error status, not a login wall or bad setup.
    pub fn is_transient(&self) -> bool {
        matches!(self, SiteError::Request { .. })
    }
}
