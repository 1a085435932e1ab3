//! User identity and profile lookups.

use crate::client::{MoneyButtonClient, require};
use crate::error::MoneyButtonResult;
use crate::request::RequestDescriptor;
use crate::types::{SignInResult, UserIdentity, UserProfile};
use tracing::info;

impl MoneyButtonClient {
    /// Identify the user owning `access_token`.
    ///
    /// Requires the `auth.user_identity:read` scope.
    pub async fn get_user_identity(&self, access_token: &str) -> MoneyButtonResult<UserIdentity> {
        require("access_token", access_token)?;

        let url = self.endpoints().user_identity_url()?;
        self.fetch(RequestDescriptor::get(url).with_bearer_token(access_token))
            .await
    }

    /// Public profile of `user_id`.
    ///
    /// Requires the `users.profiles:read` scope.
    pub async fn get_profile(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> MoneyButtonResult<UserProfile> {
        require("user_id", user_id)?;
        require("access_token", access_token)?;

        let url = self.endpoints().user_profile_url(user_id)?;
        self.fetch(RequestDescriptor::get(url).with_bearer_token(access_token))
            .await
    }

    /// Complete a login: exchange the code, then look up who the user is and
    /// their profile. The first failing step's error is returned as is.
    pub async fn sign_in(
        &self,
        client_id: &str,
        auth_code: &str,
        redirect_uri: &str,
    ) -> MoneyButtonResult<SignInResult> {
        let token = self
            .exchange_code(client_id, auth_code, redirect_uri)
            .await?;
        let identity = self.get_user_identity(&token.access_token).await?;
        let profile = self
            .get_profile(&identity.data.id, &token.access_token)
            .await?;

        info!("Completed MoneyButton sign-in for user {}", identity.data.id);

        Ok(SignInResult {
            token,
            identity,
            profile,
        })
    }
}
