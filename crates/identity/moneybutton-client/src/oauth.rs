//! OAuth2 token endpoint operations and authorization URL generation.
//!
//! Endpoint docs: <https://docs.moneybutton.com/docs/api-oauth-endpoints.html>

use crate::client::{MoneyButtonClient, require};
use crate::error::{MoneyButtonError, MoneyButtonResult};
use crate::request::RequestDescriptor;
use crate::types::TokenResponse;
use url::Url;
use url::form_urlencoded::Serializer;
use uuid::Uuid;

const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";
const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

impl MoneyButtonClient {
    /// Exchange an authorization code for an access and refresh token
    ///
    /// Form values are percent-encoded, so a redirect URI of
    /// `http://domain.com` goes on the wire as `redirect_uri=http%3A%2F%2Fdomain.com`.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        auth_code: &str,
        redirect_uri: &str,
    ) -> MoneyButtonResult<TokenResponse> {
        require("client_id", client_id)?;
        require("auth_code", auth_code)?;
        require("redirect_uri", redirect_uri)?;

        let body = Serializer::new(String::new())
            .append_pair("grant_type", GRANT_TYPE_AUTHORIZATION_CODE)
            .append_pair("client_id", client_id)
            .append_pair("code", auth_code)
            .append_pair("redirect_uri", redirect_uri)
            .finish();

        let url = self.endpoints().token_url()?;
        self.fetch(RequestDescriptor::post_form(url, body)).await
    }

    /// Obtain a fresh access token using a refresh token
    pub async fn refresh_access_token(
        &self,
        client_id: &str,
        refresh_token: &str,
    ) -> MoneyButtonResult<TokenResponse> {
        require("client_id", client_id)?;
        require("refresh_token", refresh_token)?;

        let body = Serializer::new(String::new())
            .append_pair("grant_type", GRANT_TYPE_REFRESH_TOKEN)
            .append_pair("client_id", client_id)
            .append_pair("refresh_token", refresh_token)
            .finish();

        let url = self.endpoints().token_url()?;
        self.fetch(RequestDescriptor::post_form(url, body)).await
    }

    /// Build the URL a user must visit to grant access.
    ///
    /// Returns the URL and the `state` value to check on the callback; a
    /// random state is generated when none is given.
    pub fn authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[&str],
        state: Option<&str>,
    ) -> MoneyButtonResult<(String, String)> {
        require("client_id", client_id)?;
        require("redirect_uri", redirect_uri)?;
        if scopes.iter().all(|s| s.is_empty()) {
            return Err(MoneyButtonError::missing_parameter("scopes"));
        }

        let state = match state.filter(|s| !s.is_empty()) {
            Some(state) => state.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let mut url = Url::parse(&self.endpoints().authorize_url()?).map_err(|e| {
            MoneyButtonError::configuration(format!("Invalid authorize URL: {}", e))
        })?;

        let scope = scopes
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &scope)
            .append_pair("state", &state);

        Ok((url.to_string(), state))
    }
}
