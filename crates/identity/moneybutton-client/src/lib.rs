//! Client for the MoneyButton OAuth2 and REST APIs.
//!
//! Every operation goes through a single [`RequestExecutor`], which builds the
//! request (form-encoded bodies for POST/PUT, `User-Agent`, optional bearer
//! token), performs one exchange through an [`HttpTransport`] and turns any
//! unexpected status into a [`MoneyButtonError`]. Upstream JSON:API error
//! bodies are preserved as structured [`ApiError`] entries.
//!
//! # Examples
//!
//! ```rust,no_run
//! use moneybutton_client::{ClientOptions, MoneyButtonClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MoneyButtonClient::new(ClientOptions::default())?;
//!
//!     let token = client
//!         .exchange_code("client-id", "auth-code", "https://example.com/callback")
//!         .await?;
//!     let identity = client.get_user_identity(&token.access_token).await?;
//!     let profile = client
//!         .get_profile(&identity.data.id, &token.access_token)
//!         .await?;
//!
//!     println!("signed in as {}", profile.data.attributes.name);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod oauth;
mod request;
mod transport;
mod types;
mod users;


pub use client::MoneyButtonClient;
pub use config::{
    ClientOptions, DEFAULT_API_URL, DEFAULT_OAUTH_URL, Endpoints, RetryConfig, default_user_agent,
    scopes,
};
pub use error::{MoneyButtonError, MoneyButtonResult, TransportError};
pub use request::{RequestDescriptor, RequestExecutor, RequestOutcome};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    ApiError, ErrorResponse, JsonApiVersion, SignInResult, TokenResponse, UserIdentity,
    UserIdentityAttributes, UserIdentityData, UserProfile, UserProfileAttributes, UserProfileData,
};
