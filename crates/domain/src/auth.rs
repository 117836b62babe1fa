//! Authentication types: credentials, sessions, and auth errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored credential pair: the short-lived access token and the
/// longer-lived refresh token used to renew it.
///
/// The serialized field names are fixed; they are the keys under which the
/// pair is persisted by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Bearer token attached to authenticated requests.
    pub access_token: String,
    /// Token exchanged for a new access token when the current one expires.
    pub refresh_token: String,
}

impl Credential {
    /// Create a credential pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Authorization header value for the access token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Authorization header value carrying the refresh token, used only on
    /// the token renewal call.
    #[must_use]
    pub fn refresh_bearer_header(&self) -> String {
        format!("Bearer {}", self.refresh_token)
    }
}

/// Profile of the signed-in user, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Server-side user identifier.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Display name, if the account has one.
    #[serde(default)]
    pub name: Option<String>,
    /// When the account was created, if the server reports it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload returned by `POST /auth/login`, `/auth/sign-in` and
/// `/auth/sign-up`: the user profile plus a fresh credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// The signed-in user.
    pub user: UserProfile,
    /// Fresh access token.
    pub access_token: String,
    /// Fresh refresh token.
    pub refresh_token: String,
}

impl AuthSession {
    /// The credential pair carried by this session.
    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

/// Request body for `POST /auth/login` and `POST /auth/sign-in`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Request body for `POST /auth/sign-up`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Display name for the new account.
    #[serde(default)]
    pub name: Option<String>,
}

/// Authentication failures.
///
/// This is the outcome type the refresh coordinator transports to every
/// waiter, so it is `Clone`: one exchange failure is delivered to all
/// requests that were queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The token renewal call was rejected by the backend.
    #[error("token refresh rejected (status {status:?}): {message}")]
    RefreshFailed {
        /// HTTP status of the rejection, if one was received.
        status: Option<u16>,
        /// Error description.
        message: String,
    },

    /// No refresh token is available to renew with.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The renewal call failed at the transport level.
    #[error("network error during token refresh: {message}")]
    Network {
        /// Error description.
        message: String,
    },

    /// The in-flight refresh was abandoned before settling.
    #[error("token refresh interrupted")]
    Interrupted,
}
