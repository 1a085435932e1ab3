//! Wire types for MoneyButton responses.

use serde::{Deserialize, Deserializer, Serialize};

/// Token endpoint response, returned by both code exchange and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the access token in seconds
    pub expires_in: u32,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
}

impl TokenResponse {
    /// Granted scopes, in the order the server listed them
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonApiVersion {
    #[serde(default)]
    pub version: String,
}

/// Minimal data identifying the owner of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub data: UserIdentityData,
    #[serde(default)]
    pub jsonapi: Option<JsonApiVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentityData {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub attributes: UserIdentityAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentityAttributes {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub data: UserProfileData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileData {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub attributes: UserProfileAttributes,
}

/// Public profile fields; the API omits or nulls fields the user never set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserProfileAttributes {
    #[serde(default, deserialize_with = "nullable_string")]
    pub avatar_url: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub bio: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub default_currency: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub default_language: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub primary_paymail: String,
}

/// Everything gathered by [`crate::MoneyButtonClient::sign_in`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub token: TokenResponse,
    pub identity: UserIdentity,
    pub profile: UserProfile,
}

/// Error body returned with non-success statuses:
///
/// ```json
/// {"errors":[{"id":"..","status":400,"title":"Bad Request","detail":".."}],"jsonapi":{"version":"1.0"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<ApiError>,
    #[serde(default)]
    pub jsonapi: Option<JsonApiVersion>,
}

/// One entry of an [`ErrorResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, deserialize_with = "nullable_string")]
    pub detail: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(default, deserialize_with = "status_code")]
    pub status: u16,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// JSON:API allows the status as a string; this API sends a number.
fn status_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid status code: {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("invalid status code: {}", s))),
        other => Err(D::Error::custom(format!("invalid status code: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_scopes() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"AAA","token_type":"Bearer","expires_in":3599,"refresh_token":"BBB","scope":"users.profiles:read auth.user_identity:read"}"#,
        )
        .unwrap();

        assert_eq!(
            token.scopes(),
            vec!["users.profiles:read", "auth.user_identity:read"]
        );
        assert!(token.has_scope("users.profiles:read"));
        assert!(!token.has_scope("users.balance:read"));
    }

    #[test]
    fn test_token_response_without_refresh_token() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"AAA","token_type":"Bearer","expires_in":60}"#)
                .unwrap();

        assert_eq!(token.refresh_token, "");
        assert!(token.scopes().is_empty());
    }

    #[test]
    fn test_profile_attributes_tolerate_nulls() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"data":{"type":"profiles","id":"123","attributes":{"name":"MrZ","bio":null}}}"#,
        )
        .unwrap();

        assert_eq!(profile.data.kind, "profiles");
        assert_eq!(profile.data.attributes.name, "MrZ");
        assert_eq!(profile.data.attributes.bio, "");
        assert_eq!(profile.data.attributes.primary_paymail, "");
    }

    #[test]
    fn test_error_response_status_formats() {
        let body = r#"{"errors":[{"id":"a","status":400,"title":"Bad Request","detail":"one"},{"status":"401","detail":"two"}]}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.errors.len(), 2);
        assert_eq!(parsed.errors[0].status, 400);
        assert_eq!(parsed.errors[1].status, 401);
        assert_eq!(parsed.errors[1].title, "");
        assert!(parsed.jsonapi.is_none());
    }

    #[test]
    fn test_error_response_requires_errors_field() {
        assert!(serde_json::from_str::<ErrorResponse>(r#"{"message":"nope"}"#).is_err());
        assert!(serde_json::from_str::<ErrorResponse>(r#"{"errors":[{"status":"abc"}]}"#).is_err());
    }
}
