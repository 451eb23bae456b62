use crate::error::FetchError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// Header the National Transport Authority gateway reads the subscription key from.
pub const API_KEY_HEADER: &str = "x-api-key";

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once, when the wrapper is built,
/// so every request afterwards carries the same static credential.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, FetchError> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| FetchError::InvalidHeader(format!("{header_name}: {e}")))?;
        let mut key = HeaderValue::from_str(key)
            .map_err(|e| FetchError::InvalidHeader(format!("{header_name}: {e}")))?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Uses the `x-api-key` header expected by the GTFS-R gateway.
    pub fn x_api_key(inner: C, key: &str) -> Result<Self, FetchError> {
        Self::new(inner, API_KEY_HEADER, key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        seen: Mutex<Option<HeaderMap>>,
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.seen.lock().unwrap() = Some(req.headers().clone());
            Ok(reqwest::Response::from(
                http::Response::builder().status(200).body(Vec::new()).unwrap(),
            ))
        }
    }

    #[tokio::test]
    async fn test_injects_x_api_key_header() {
        let client = ApiKey::x_api_key(RecordingClient::default(), "secret-key").unwrap();
        let req = reqwest::Request::new(
            reqwest::Method::GET,
            "https://example.com/feed".parse().unwrap(),
        );

        client.execute(req).await.unwrap();

        let headers = client.inner.seen.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "secret-key");
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let result = ApiKey::x_api_key(RecordingClient::default(), "bad\nkey");
        assert!(matches!(result, Err(FetchError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        let result = ApiKey::new(RecordingClient::default(), "bad header", "key");
        assert!(matches!(result, Err(FetchError::InvalidHeader(_))));
    }
}
