//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use super::types::ServiceError;

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for async HTTP client operations.
///
/// This abstraction allows the tiling service to be tested with a mock
/// client instead of a live server.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body, [`ServiceError::NotFound`] for a 404, or another
    /// error for transport failures and non-success statuses.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Http {
                url: String::new(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Http {
                url: url.to_string(),
                reason: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ServiceError::Http {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ServiceError::Http {
                url: url.to_string(),
                reason: format!("Failed to read response: {}", e),
            })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock HTTP client serving canned responses by URL.
    #[derive(Default)]
    pub struct MockAsyncHttpClient {
        pub responses: HashMap<String, Result<Vec<u8>, ServiceError>>,
        pub requests: AtomicUsize,
    }

    impl MockAsyncHttpClient {
        pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.responses.insert(url.to_string(), Ok(body.into()));
            self
        }

        pub fn with_error(mut self, url: &str, error: ServiceError) -> Self {
            self.responses.insert(url.to_string(), Err(error));
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(ServiceError::NotFound(url.to_string())))
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient::default().with("http://example.com/a", vec![1, 2, 3]);

        let result = mock.get("http://example.com/a").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_unknown_url_is_not_found() {
        let mock = MockAsyncHttpClient::default();

        let result = mock.get("http://example.com/missing").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
