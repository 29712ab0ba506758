use std::time::Duration;

use anyhow::Context;
use reqwest::{RequestBuilder, Response};
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 250;

/// Thin wrapper over `reqwest::Client` that retries connect errors and 5xx
/// responses with exponential backoff. 4xx responses are returned as-is.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    pub async fn send_with_retry(&self, request: RequestBuilder) -> anyhow::Result<Response> {
        let mut attempt = 0u32;
        loop {
            let req = request
                .try_clone()
                .context("request body is not cloneable")?;
            match req.send().await {
                Ok(resp) if resp.status().is_server_error() && attempt + 1 < MAX_ATTEMPTS => {
                    warn!(status = %resp.status(), attempt, "retrying after server error");
                }
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt + 1 < MAX_ATTEMPTS => {
                    warn!(error = %e, attempt, "retrying after transport error");
                }
                Err(e) => return Err(anyhow::Error::from(e).context("http request failed")),
            }
            tokio::time::sleep(backoff_delay(attempt)).await;
            attempt += 1;
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        assert_eq!(backoff_delay(0), Duration::from_millis(250));
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
    }
}
