//! Outbound notifications through the Telegram bot API.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::instrument;
use url::Url;

pub use error::*;

mod error;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Delivers text to a set of recipients. Retrying transient failures is the dispatcher's job.
pub trait Dispatcher: Send + Sync {
    fn send(
        &self, recipients: &[String], text: &str, silent: bool,
    ) -> impl Future<Output = Vec<Delivery>> + Send;
}

/// Outcome of sending one message to one recipient.
#[derive(Debug)]
pub struct Delivery {
    pub recipient: String,
    pub outcome: Result<()>,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api: Url,
    pub token: String,
    pub timeout: Duration,
    pub attempts: usize,
    /// Pause between two recipients.
    pub pause: Duration,
}

impl TelegramConfig {
    pub fn default_api() -> Url {
        Url::parse(TELEGRAM_API).expect("hard-coded API address is valid")
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct Telegram {
    client: reqwest::Client,
    endpoint: Url,
    attempts: usize,
    pause: Duration,
}

impl std::fmt::Debug for Telegram {
    // the endpoint embeds the bot token
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telegram")
            .field("attempts", &self.attempts)
            .field("pause", &self.pause)
            .finish_non_exhaustive()
    }
}

impl Telegram {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let mut endpoint = config.api.clone();
        endpoint
            .path_segments_mut()
            .ok()
            .context(ApiUrlSnafu { api: config.api.clone() })?
            .pop_if_empty()
            .push(&format!("bot{}", config.token))
            .push("sendMessage");

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context(ClientSnafu)?;

        Ok(Self {
            client,
            endpoint,
            attempts: config.attempts.max(1),
            pause: config.pause,
        })
    }

    async fn post(&self, message: &SendMessage<'_>) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await
            // the endpoint carries the token
            .map_err(reqwest::Error::without_url)
            .context(RequestSnafu)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(1);

            tokio::time::sleep(Duration::from_secs(retry_after)).await;
            return RateLimitedSnafu { retry_after }.fail();
        }

        if status.is_server_error() {
            return ServerSnafu { status }.fail();
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context(DecodeSnafu)?;
        if !body.ok {
            let description = body.description.unwrap_or_else(|| status.to_string());
            return RejectedSnafu { description }.fail();
        }

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_one(&self, chat_id: &str, text: &str, silent: bool) -> Result<()> {
        let message = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_notification: silent,
        };
        let strategy = FixedInterval::from_millis(1500).take(self.attempts - 1);

        RetryIf::spawn(
            strategy,
            || self.post(&message),
            |error: &TelegramError| {
                let transient = error.is_transient();
                if transient {
                    tracing::warn!(%error, "send failed, retrying");
                }
                transient
            },
        )
        .await
    }
}

impl Dispatcher for Telegram {
    async fn send(&self, recipients: &[String], text: &str, silent: bool) -> Vec<Delivery> {
        let mut deliveries = Vec::with_capacity(recipients.len());

        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pause).await;
            }

            let outcome = self.send_one(recipient, text, silent).await;
            deliveries.push(Delivery {
                recipient: recipient.clone(),
                outcome,
            });
        }

        deliveries
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn telegram(server: &MockServer) -> Telegram {
        Telegram::new(TelegramConfig {
            api: Url::parse(&server.uri()).unwrap(),
            token: "123:ABC".to_string(),
            timeout: Duration::from_secs(5),
            attempts: 2,
            pause: Duration::ZERO,
        })
        .unwrap()
    }

    fn recipients(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn sends_to_every_recipient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "text": "hello",
                "parse_mode": "HTML",
                "disable_notification": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(2)
            .mount(&server)
            .await;

        let deliveries = telegram(&server)
            .send(&recipients(&["1", "-100200"]), "hello", true)
            .await;

        assert_eq!(deliveries.len(), 2);
        assert!(deliveries.iter().all(Delivery::is_delivered));
        assert_eq!(deliveries[1].recipient, "-100200");
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let deliveries = telegram(&server).send(&recipients(&["1"]), "hi", false).await;

        assert!(deliveries[0].is_delivered());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Bad Request: chat not found",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let deliveries = telegram(&server).send(&recipients(&["42"]), "hi", false).await;

        assert!(matches!(
            &deliveries[0].outcome,
            Err(TelegramError::Rejected { description }) if description.contains("chat not found")
        ));
    }

    #[tokio::test]
    async fn failure_for_one_recipient_does_not_stop_the_rest() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"chat_id": "bad"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"ok": false})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"chat_id": "good"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let deliveries = telegram(&server)
            .send(&recipients(&["bad", "good"]), "hi", false)
            .await;

        assert!(!deliveries[0].is_delivered());
        assert!(deliveries[1].is_delivered());
    }

    #[tokio::test]
    async fn errors_do_not_reveal_the_token() {
        // a port nobody listens on any more
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let api = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        let telegram = Telegram::new(TelegramConfig {
            api,
            token: "123:SECRETTOKEN".to_string(),
            timeout: Duration::from_secs(2),
            attempts: 1,
            pause: Duration::ZERO,
        })
        .unwrap();

        let deliveries = telegram.send(&recipients(&["1"]), "hi", false).await;
        let error = deliveries[0].outcome.as_ref().unwrap_err();

        assert!(matches!(error, TelegramError::Request { .. }));
        assert!(!error.to_string().contains("SECRETTOKEN"), "{error}");
        assert!(!format!("{error:?}").contains("SECRETTOKEN"), "{error:?}");
    }

    #[tokio::test]
    async fn undecodable_reply_does_not_reveal_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let deliveries = telegram(&server).send(&recipients(&["1"]), "hi", false).await;
        let error = deliveries[0].outcome.as_ref().unwrap_err();

        assert!(matches!(error, TelegramError::Decode { .. }));
        assert!(!error.to_string().contains("123:ABC"), "{error}");
    }

    #[test]
    fn endpoint_keeps_the_token_as_one_segment() {
        let telegram = Telegram::new(TelegramConfig {
            api: TelegramConfig::default_api(),
            token: "123:ABC".to_string(),
            timeout: Duration::from_secs(1),
            attempts: 1,
            pause: Duration::ZERO,
        })
        .unwrap();

        assert_eq!(
            telegram.endpoint.as_str(),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }
}
