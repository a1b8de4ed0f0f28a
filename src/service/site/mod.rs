//! Authenticated page retrieval from the game site.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderValue};
use snafu::ResultExt as _;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::instrument;
use url::Url;

use crate::extract::Page;

pub use cookies::*;
pub use error::*;

mod cookies;
mod error;

/// Anything that can hand over the markup of a site page.
pub trait PageSource: Send + Sync {
    fn fetch(&self, page: Page) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub cookies_file: PathBuf,
    pub cookie_domain: Option<String>,
    pub session_cookie: String,
    /// Overrides `https://<cookie domain>`.
    pub base_url: Option<Url>,
    pub prophecy_path: String,
    pub events_path: String,
    pub timeout: Duration,
    pub attempts: usize,
}

/// The game site, reached with the cookies of a logged-in browser session.
#[derive(Debug, Clone)]
pub struct Site {
    config: SiteConfig,
}

struct Session {
    client: reqwest::Client,
    base: Url,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// Build a client around the current cookie file. Re-read on every fetch so a refreshed
    /// browser export is picked up without a restart.
    fn session(&self) -> Result<Session> {
        let config = &self.config;
        let cookies = cookies::load(
            &config.cookies_file,
            config.cookie_domain.as_deref(),
            &config.session_cookie,
        )?;

        let base = match &config.base_url {
            Some(url) => url.clone(),
            None => {
                let text = format!("https://{}", cookies.domain);
                Url::parse(&text).context(SiteUrlSnafu { text })?
            }
        };

        let jar = Jar::default();
        for (name, value) in &cookies.cookies {
            jar.add_cookie_str(&format!("{name}={value}; Path=/"), &base);
        }

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .default_headers(browser_headers(&base))
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context(ClientSnafu)?;

        Ok(Session { client, base })
    }

    fn path(&self, page: Page) -> &str {
        match page {
            Page::Prophecy => &self.config.prophecy_path,
            Page::Events => &self.config.events_path,
        }
    }

    async fn get(&self, session: &Session, page: Page) -> Result<String> {
        let path = self.path(page);
        let text = format!("{}{}", session.base.as_str().trim_end_matches('/'), normalize(path));
        let url = Url::parse(&text).context(SiteUrlSnafu { text })?;

        let response = session
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .context(RequestSnafu { page })?;

        let landed = response.url().clone();
        let body = response.text().await.context(RequestSnafu { page })?;

        if is_login_wall(&landed, &body) {
            return UnauthenticatedSnafu {
                page,
                url: landed.to_string(),
            }
            .fail();
        }

        tracing::debug!(%page, bytes = body.len(), "page fetched");
        Ok(body)
    }
}

impl PageSource for Site {
    #[instrument(skip(self))]
    async fn fetch(&self, page: Page) -> Result<String> {
        let session = self.session()?;
        let strategy = FixedInterval::from_millis(1500).take(self.config.attempts.saturating_sub(1));

        RetryIf::spawn(
            strategy,
            || self.get(&session, page),
            |error: &SiteError| {
                let transient = error.is_transient();
                if transient {
                    tracing::warn!(%error, "fetch failed, retrying");
                }
                transient
            },
        )
        .await
    }
}

fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn browser_headers(base: &Url) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("ru-RU,ru;q=0.9"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));

    let referer = format!("{}/", base.as_str().trim_end_matches('/'));
    if let Ok(referer) = HeaderValue::from_str(&referer) {
        headers.insert(header::REFERER, referer);
    }

    headers
}

/// The site answers unauthenticated requests with its login form instead of an error.
fn is_login_wall(landed: &Url, body: &str) -> bool {
    landed.as_str().contains("login") || (body.contains("Вход") && body.contains("Пароль"))
}
