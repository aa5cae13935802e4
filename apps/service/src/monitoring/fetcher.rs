use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, InvalidHeaderValue};
use tracing::debug;

use super::types::Target;
use crate::config::Monitor;
use crate::error::FetchError;

/// Raw page text of one target, or why it could not be retrieved
pub type RawResult = Result<String, FetchError>;

/// Retrieves the textual representation of a target
///
/// Implementations must bound the call in time and must not panic on ordinary
/// network or HTTP errors; those are returned as [`FetchError`].
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &Target) -> RawResult;
}

/// HTTP fetcher presenting itself as a regular browser
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Monitor) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.as_str())
            .default_headers(browser_headers(settings)?)
            .build()?;

        Ok(Self { client })
    }
}

fn browser_headers(settings: &Monitor) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_str(&settings.accept)?);
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&settings.accept_language)?);
    Ok(headers)
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &Target) -> RawResult {
        let start = Instant::now();

        let response = self.client.get(target.identity.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(
            product = %target,
            status = status.as_u16(),
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "fetched page"
        );
        Ok(body)
    }
}
