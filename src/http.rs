//! JSON-over-HTTP with retry, shared by the embedding and language-model
//! providers.
//!
//! Retry strategy:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use serde::Serialize;

use repo_chat_core::error::{EmbedError, LlmError};

const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Why a request ultimately failed.
#[derive(Debug)]
pub enum HttpFailure {
    /// Still rate limited after every retry.
    RateLimited,
    /// Non-retryable status, or a server error after every retry.
    Status { status: u16, body: String },
    /// Connection, timeout or body-read failure after every retry.
    Network(String),
    /// The success body was not JSON.
    Decode(String),
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited"),
            Self::Status { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Network(msg) => write!(f, "{msg}"),
            Self::Decode(msg) => write!(f, "invalid JSON body: {msg}"),
        }
    }
}

impl From<HttpFailure> for EmbedError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::RateLimited => EmbedError::RateLimited,
            HttpFailure::Decode(msg) => EmbedError::Malformed(msg),
            other => EmbedError::Request(other.to_string()),
        }
    }
}

impl From<HttpFailure> for LlmError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::RateLimited => LlmError::RateLimited,
            HttpFailure::Decode(msg) => LlmError::Malformed(msg),
            other => LlmError::Request(other.to_string()),
        }
    }
}

/// A JSON endpoint with its retry budget.
#[derive(Debug, Clone)]
pub struct JsonEndpoint {
    client: reqwest::Client,
    url: String,
    bearer: Option<String>,
    max_retries: u32,
    base_backoff: Duration,
    label: &'static str,
}

impl JsonEndpoint {
    /// `label` names the provider in logs and errors.
    pub fn new(
        label: &'static str,
        url: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            bearer: None,
            max_retries,
            base_backoff: BASE_BACKOFF,
            label,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    #[cfg(test)]
    fn with_base_backoff(mut self, base: Duration) -> Self {
        self.base_backoff = base;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` and return the decoded JSON response.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<serde_json::Value, HttpFailure> {
        let mut last_failure = HttpFailure::Network(format!("{} request was not sent", self.label));

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_backoff * (1 << (attempt - 1).min(5));
                tracing::warn!(
                    provider = self.label,
                    attempt,
                    max_retries = self.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_failure,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.url).json(body);
            if let Some(token) = &self.bearer {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    last_failure = HttpFailure::Network(format!(
                        "{} connection error ({}): {}",
                        self.label, self.url, e
                    ));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| HttpFailure::Network(e.to_string()))?;
                return serde_json::from_str(&text).map_err(|e| HttpFailure::Decode(e.to_string()));
            }

            let body_text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                last_failure = HttpFailure::RateLimited;
                continue;
            }
            if status.is_server_error() {
                last_failure = HttpFailure::Status {
                    status: status.as_u16(),
                    body: body_text,
                };
                continue;
            }

            return Err(HttpFailure::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Err(last_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Serve one canned response per connection, in order.
    async fn spawn_server(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            for resp in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let (reader, mut writer) = stream.split();
                let mut reader = BufReader::new(reader);
                let mut content_length = 0usize;
                let mut line = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap_or(0);
                    }
                    if line == "\r\n" {
                        break;
                    }
                }
                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).await.ok();
                writer.write_all(resp.as_bytes()).await.ok();
                writer.shutdown().await.ok();
            }
        });

        format!("http://127.0.0.1:{port}/endpoint")
    }

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn endpoint(url: String, retries: u32) -> JsonEndpoint {
        JsonEndpoint::new("test", url, 5, retries)
            .unwrap()
            .with_base_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_returns_json() {
        let url = spawn_server(vec![response("200 OK", r#"{"ok":true}"#)]).await;
        let json = endpoint(url, 0).post(&serde_json::json!({})).await.unwrap();
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_server_error_retried_then_succeeds() {
        let url = spawn_server(vec![
            response("503 Service Unavailable", "busy"),
            response("200 OK", r#"{"n":2}"#),
        ])
        .await;
        let json = endpoint(url, 2).post(&serde_json::json!({})).await.unwrap();
        assert_eq!(json["n"], 2);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let url = spawn_server(vec![
            response("401 Unauthorized", "bad key"),
            response("200 OK", "{}"),
        ])
        .await;
        let err = endpoint(url, 3).post(&serde_json::json!({})).await.unwrap_err();
        match err {
            HttpFailure::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let url = spawn_server(vec![
            response("429 Too Many Requests", ""),
            response("429 Too Many Requests", ""),
        ])
        .await;
        let err = endpoint(url, 1).post(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, HttpFailure::RateLimited));
        assert!(matches!(EmbedError::from(err), EmbedError::RateLimited));
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_failure() {
        let url = spawn_server(vec![response("200 OK", "not json")]).await;
        let err = endpoint(url, 0).post(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(LlmError::from(err), LlmError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = endpoint(format!("http://127.0.0.1:{port}/"), 0)
            .post(&serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpFailure::Network(_)));
    }
}
