//! HTTP transport abstraction and the reqwest-backed implementation.

use crate::config::{ClientOptions, RetryConfig};
use crate::error::{MoneyButtonError, MoneyButtonResult, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

/// A fully built request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Status and complete body of a received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Anything that can perform one HTTP exchange.
///
/// Implementations own connection management and any retry policy; the
/// request executor only sees the final response or failure.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport on top of a pooled [`reqwest::Client`]
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry: RetryConfig,
}

struct AttemptError {
    error: reqwest::Error,
    status: Option<u16>,
}

impl ReqwestTransport {
    pub fn new(options: &ClientOptions) -> MoneyButtonResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout())
            .tcp_keepalive(options.dialer_keep_alive)
            .pool_idle_timeout(options.idle_timeout)
            .pool_max_idle_per_host(options.max_idle_connections)
            .build()
            .map_err(|e| {
                MoneyButtonError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self::from_client(client, options.retry.clone()))
    }

    /// Wrap an existing client, e.g. one shared with the rest of an application
    pub fn from_client(client: reqwest::Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, request: &TransportRequest) -> Result<TransportResponse, AttemptError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| AttemptError {
                status: error.status().map(|s| s.as_u16()),
                error,
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|error| AttemptError {
            error,
            status: Some(status),
        })?;

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            debug!(attempt, method = %request.method, url = %request.url, "sending HTTP request");

            match self.attempt(&request).await {
                Ok(response) if response.status >= 500 && attempt < attempts => {
                    warn!(
                        attempt,
                        status = response.status,
                        url = %request.url,
                        "server error, retrying request"
                    );
                }
                Ok(response) => {
                    debug!(attempt, status = response.status, url = %request.url, "received HTTP response");
                    return Ok(response);
                }
                Err(failure) if attempt < attempts && should_retry_error(&failure.error) => {
                    warn!(attempt, url = %request.url, error = %failure.error, "HTTP request failed, retrying");
                }
                Err(failure) => {
                    let mut error = TransportError::from(failure.error);
                    if let Some(status) = failure.status {
                        error = error.with_status(status);
                    }
                    return Err(error);
                }
            }

            let delay = self.retry.calculate_delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_builds_from_default_options() {
        assert!(ReqwestTransport::new(&ClientOptions::default()).is_ok());
    }

    #[test]
    fn test_transport_response_new() {
        let response = TransportResponse::new(200, "ok");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"ok".to_vec());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let options = ClientOptions::default()
            .with_retry(RetryConfig::disabled())
            .with_request_timeout(Duration::from_secs(2));
        let transport = ReqwestTransport::new(&options).unwrap();

        // Grab a free port and release it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = transport
            .perform(TransportRequest {
                method: Method::GET,
                url: format!("http://127.0.0.1:{}/", port),
                headers: HeaderMap::new(),
                body: None,
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.status(), None);
        assert!(err.message().starts_with("HTTP request failed"));
    }
}
