use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::sources::error::{SourceError, SourceResult};

const USER_AGENT: &str = concat!("krizevci-events/", env!("CARGO_PKG_VERSION"));
const BACKOFF_BASE_MS: u64 = 250;

/// Shared HTTP transport for all source adapters.
///
/// Every request is bounded by the client timeout. Transient failures
/// (connect errors, timeouts, 5xx) are retried with exponential backoff.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retries: u32) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SourceError::transport(format!("Failed to build HTTP client: {}", err)))?;

        Ok(Self { http, retries })
    }

    pub async fn get_text(&self, url: &str) -> SourceResult<String> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(Failure::Transient(err)) if attempt < self.retries => {
                    let delay = backoff_delay(attempt);
                    tracing::debug!(
                        "GET {} failed ({}), retrying in {}ms",
                        url,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(Failure::Transient(err)) | Err(Failure::Permanent(err)) => return Err(err),
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SourceResult<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|err| SourceError::format(format!("Unexpected JSON from {}: {}", url, err)))
    }

    async fn get_once(&self, url: &str) -> Result<String, Failure> {
        let response = self.http.get(url).send().await.map_err(|err| {
            let message = if err.is_timeout() {
                format!("Timed out fetching {}", url)
            } else {
                format!("Failed to fetch {}: {}", url, err)
            };
            Failure::Transient(SourceError::transport(message))
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = SourceError::transport(format!("{} returned HTTP {}", url, status));
            return Err(if is_transient(status) {
                Failure::Transient(err)
            } else {
                Failure::Permanent(err)
            });
        }

        response
            .text()
            .await
            .map_err(|err| Failure::Transient(SourceError::transport(format!(
                "Failed to read body from {}: {}",
                url, err
            ))))
    }
}

enum Failure {
    Transient(SourceError),
    Permanent(SourceError),
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_MS.saturating_mul(1 << attempt.min(6));
    let jitter = rand::thread_rng().gen_range(0..=base / 2);
    Duration::from_millis(base + jitter)
}
