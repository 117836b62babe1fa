//! Auth endpoint surface: sign-in, sign-up, logout.
//!
//! These flows issue and retire the credential pair the rest of the client
//! runs on. On success the pair is persisted and the header cache primed,
//! so the very next request goes out authenticated.

use serde::Serialize;
use tracing::info;

use atrium_domain::{ApiRequest, AuthSession, SignInRequest, SignUpRequest};

use super::{ApiClient, ApiError};

impl ApiClient {
    /// `POST /auth/login` — authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the session payload cannot be
    /// decoded.
    pub async fn login(&self, request: &SignInRequest) -> Result<AuthSession, ApiError> {
        self.establish_session("/auth/login", request).await
    }

    /// `POST /auth/sign-in` — alternate sign-in route used by the console.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the session payload cannot be
    /// decoded.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<AuthSession, ApiError> {
        self.establish_session("/auth/sign-in", request).await
    }

    /// `POST /auth/sign-up` — create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the session payload cannot be
    /// decoded.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthSession, ApiError> {
        self.establish_session("/auth/sign-up", request).await
    }

    /// `PUT /auth/logout` — invalidate the server-side session.
    ///
    /// Local credentials are cleared whether or not the server call
    /// succeeds; a dead session on the backend must not strand a live
    /// credential on this machine.
    ///
    /// # Errors
    ///
    /// Returns the server error, if any, after the local purge.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.execute(&ApiRequest::put("/auth/logout")).await;
        self.purge_credential().await;
        info!("signed out");
        result.map(|_| ())
    }

    async fn establish_session<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<AuthSession, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.execute(&ApiRequest::post(path, body)).await?;
        let session: AuthSession = response.json()?;

        self.install_credential(&session.credential()).await?;
        info!(user = %session.user.email, "session established");
        Ok(session)
    }
}
