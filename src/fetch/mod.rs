mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use crate::config::ClientConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use self::auth::ApiKey;

const SLOW_FETCH: Duration = Duration::from_secs(15);

/// Issues one GET for `url` and returns the body of a 2xx response.
///
/// Non-2xx statuses fail before the body is read. There is no retry; the
/// next poll cycle is the retry.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let url = url
        .parse()
        .map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let started = Instant::now();
    let resp = client.execute(req).await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let bytes = resp.bytes().await?.to_vec();

    let elapsed = started.elapsed();
    if elapsed > SLOW_FETCH {
        warn!(elapsed_secs = elapsed.as_secs(), "Feed fetch was slow");
    }
    debug!(bytes = bytes.len(), "Feed bytes received");

    Ok(bytes)
}

/// Where a sensor gets the raw feed bytes for one poll cycle.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self) -> Result<Vec<u8>, FetchError>;
}

/// A [`FeedSource`] bound to a fixed endpoint.
pub struct Fetcher<C> {
    client: C,
    endpoint: String,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Fetcher<ApiKey<BasicClient>> {
    /// Builds the production fetcher: a timed client carrying the static
    /// `x-api-key` credential.
    pub fn from_config(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = BasicClient::with_timeout(config.timeout)?;
        let client = ApiKey::x_api_key(client, &config.api_key)?;
        Ok(Self::new(client, config.endpoint.clone()))
    }
}

#[async_trait]
impl<C: HttpClient> FeedSource for Fetcher<C> {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_feed(&self) -> Result<Vec<u8>, FetchError> {
        fetch_bytes(&self.client, &self.endpoint).await
    }
}
