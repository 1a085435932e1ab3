//! Request execution and error normalization shared by every API call.

use crate::error::{MoneyButtonError, MoneyButtonResult, TransportError};
use crate::transport::{HttpTransport, TransportRequest};
use crate::types::ErrorResponse;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything needed to issue one API request
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    /// Form-encoded payload, only sent with POST and PUT
    pub body: Option<String>,
    pub bearer_token: Option<String>,
    pub expected_status: u16,
    /// Aborts the exchange when cancelled
    pub cancellation: Option<CancellationToken>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            bearer_token: None,
            expected_status: 200,
            cancellation: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn sends_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT
    }
}

/// Result of one exchange, kept together with what was sent.
///
/// When `error` is set the call failed, whatever `body` holds.
#[derive(Debug)]
pub struct RequestOutcome {
    pub method: Method,
    pub url: String,
    /// Payload actually sent (POST/PUT only)
    pub post_data: Option<String>,
    /// `None` when no response was received
    pub status_code: Option<u16>,
    pub body: Vec<u8>,
    pub error: Option<MoneyButtonError>,
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The raw body of a successful call, or the call's error
    pub fn into_body(self) -> MoneyButtonResult<Vec<u8>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.body),
        }
    }

    /// Decode a successful body; failed outcomes return their error untouched
    pub fn decode<T: DeserializeOwned>(self) -> MoneyButtonResult<T> {
        let body = self.into_body()?;
        serde_json::from_slice(&body).map_err(MoneyButtonError::Decode)
    }
}

/// Performs requests through an [`HttpTransport`] and turns unexpected
/// statuses into [`MoneyButtonError`]s.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    user_agent: HeaderValue,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, user_agent: &str) -> MoneyButtonResult<Self> {
        let user_agent = HeaderValue::from_str(user_agent).map_err(|e| {
            MoneyButtonError::configuration(format!("Invalid user agent: {}", e))
        })?;

        Ok(Self {
            transport,
            user_agent,
        })
    }

    /// Perform exactly one exchange. Never retries; never validates arguments.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> RequestOutcome {
        let sends_body = descriptor.sends_body();
        let RequestDescriptor {
            method,
            url,
            body,
            bearer_token,
            expected_status,
            cancellation,
        } = descriptor;

        let post_data = if sends_body {
            Some(body.unwrap_or_default())
        } else {
            None
        };

        let mut outcome = RequestOutcome {
            method: method.clone(),
            url: url.clone(),
            post_data: post_data.clone(),
            status_code: None,
            body: Vec::new(),
            error: None,
        };

        let headers = match self.build_headers(sends_body, bearer_token.as_deref()) {
            Ok(headers) => headers,
            Err(err) => {
                outcome.error = Some(err.into());
                return outcome;
            }
        };

        debug!(%method, %url, expected_status, "executing MoneyButton request");

        let request = TransportRequest {
            method,
            url,
            headers,
            body: post_data,
        };
        let result = match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("MoneyButton request cancelled by caller");
                    Err(TransportError::cancelled("request cancelled before a response was received"))
                }
                result = self.transport.perform(request) => result,
            },
            None => self.transport.perform(request).await,
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                outcome.status_code = err.status();
                outcome.error = Some(err.into());
                return outcome;
            }
        };

        outcome.status_code = Some(response.status);
        outcome.body = response.body;

        if response.status != expected_status {
            debug!(
                status = response.status,
                expected_status,
                body_len = outcome.body.len(),
                "unexpected response status"
            );
            outcome.error = Some(normalize_failure(response.status, &outcome.body));
        }

        outcome
    }

    fn build_headers(
        &self,
        sends_body: bool,
        bearer_token: Option<&str>,
    ) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());

        if sends_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }

        if let Some(token) = bearer_token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                TransportError::new("invalid bearer token for Authorization header").with_source(e)
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

/// Translate a non-expected status and its body into an error
pub(crate) fn normalize_failure(status: u16, body: &[u8]) -> MoneyButtonError {
    if body.is_empty() {
        return MoneyButtonError::UpstreamOpaque {
            status,
            source: None,
        };
    }

    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(parsed) => MoneyButtonError::Upstream {
            status,
            errors: parsed.errors,
            jsonapi_version: parsed.jsonapi.map(|v| v.version),
        },
        Err(err) => MoneyButtonError::UpstreamOpaque {
            status,
            source: Some(err),
        },
    }
}
