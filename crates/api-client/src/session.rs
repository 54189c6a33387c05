//! Account session helpers
//!
//! Typed wrappers over the authentication and user endpoints. Every call goes
//! through `AuthenticatedClient::send`, so credential recovery and failure
//! notifications behave exactly as for any other request.

use std::sync::Arc;

use api_auth::{
    AuthResponse, CHANGE_PASSWORD_PATH, ChangePasswordRequest, LOGIN_PATH, LoginRequest,
    PASSWORD_CHANGED_MESSAGE, PROFILE_PATH, PROFILE_UPDATED_MESSAGE, REGISTER_PATH,
    REGISTERED_MESSAGE, RegisterRequest, UpdateProfileRequest, UserProfile,
};
use api_transport::RequestDescriptor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::client::AuthenticatedClient;
use crate::error::{ClientError, Result};
use crate::notify::Severity;

/// Sign-in state and account operations on top of one client.
#[derive(Clone)]
pub struct Session {
    client: Arc<AuthenticatedClient>,
}

impl Session {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<AuthenticatedClient> {
        &self.client
    }

    /// Whether a credential is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.client.credential_store().is_authenticated()
    }

    /// Sign in and keep the issued credential.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .exchange(RequestDescriptor::post(LOGIN_PATH), Some(request))
            .await?;
        let credential = response
            .credential()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.client.credential_store().set(credential);
        info!(username = %request.username, "signed in");
        Ok(response)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        let body: Value = self
            .exchange(RequestDescriptor::post(REGISTER_PATH), Some(request))
            .await?;
        self.client.notify(REGISTERED_MESSAGE, Severity::Info);
        Ok(body)
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.exchange::<(), _>(RequestDescriptor::get(PROFILE_PATH), None)
            .await
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<UserProfile> {
        let profile = self
            .exchange(RequestDescriptor::put(PROFILE_PATH), Some(request))
            .await?;
        self.client.notify(PROFILE_UPDATED_MESSAGE, Severity::Info);
        Ok(profile)
    }

    /// Change the password. The server invalidates the current credential, so
    /// the session ends and the user has to sign in again.
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<()> {
        let request = RequestDescriptor::post(CHANGE_PASSWORD_PATH)
            .with_body(request)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        self.client.send(request).await?;
        self.client.credential_store().clear();
        self.client.notify(PASSWORD_CHANGED_MESSAGE, Severity::Info);
        Ok(())
    }

    /// Forget the credential. Purely local; the API has no logout endpoint.
    pub fn logout(&self) {
        self.client.credential_store().clear();
        info!("signed out");
    }

    async fn exchange<B, T>(&self, request: RequestDescriptor, body: Option<&B>) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = match body {
            Some(body) => request
                .with_body(body)
                .map_err(|e| ClientError::InvalidRequest(e.to_string()))?,
            None => request,
        };
        let response = self.client.send(request).await?;
        response
            .json()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
