//! MoneyButton API client.

use crate::config::{ClientOptions, Endpoints};
use crate::error::{MoneyButtonError, MoneyButtonResult};
use crate::request::{RequestDescriptor, RequestExecutor};
use crate::transport::{HttpTransport, ReqwestTransport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client for the MoneyButton OAuth2 and REST APIs.
///
/// Cheap to clone; clones share one transport and its connection pool, so a
/// single client can serve concurrent calls from many tasks.
#[derive(Clone)]
pub struct MoneyButtonClient {
    executor: RequestExecutor,
    options: Arc<ClientOptions>,
    cancellation: Option<CancellationToken>,
}

impl MoneyButtonClient {
    /// Create a client backed by a pooled reqwest transport
    pub fn new(options: ClientOptions) -> MoneyButtonResult<Self> {
        options.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&options)?);
        Self::assemble(options, transport)
    }

    /// Create a client with [`ClientOptions::default`]
    pub fn with_defaults() -> MoneyButtonResult<Self> {
        Self::new(ClientOptions::default())
    }

    /// Create a client on top of a custom transport (instrumented, mocked, ...)
    pub fn with_transport(
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> MoneyButtonResult<Self> {
        options.validate()?;
        Self::assemble(options, transport)
    }

    fn assemble(
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> MoneyButtonResult<Self> {
        let executor = RequestExecutor::new(transport, &options.user_agent)?;

        Ok(Self {
            executor,
            options: Arc::new(options),
            cancellation: None,
        })
    }

    /// A handle whose calls abort with a transport error once `token` is
    /// cancelled. The returned client shares this one's transport.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.options.endpoints
    }

    pub fn user_agent(&self) -> &str {
        &self.options.user_agent
    }

    /// Low-level access for calls not covered by the typed operations
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        mut descriptor: RequestDescriptor,
    ) -> MoneyButtonResult<T> {
        if descriptor.cancellation.is_none() {
            descriptor.cancellation = self.cancellation.clone();
        }
        self.executor.execute(descriptor).await.decode()
    }
}

/// Fail with a parameter error when a required argument is empty
pub(crate) fn require(name: &'static str, value: &str) -> MoneyButtonResult<()> {
    if value.is_empty() {
        return Err(MoneyButtonError::missing_parameter(name));
    }
    Ok(())
}
