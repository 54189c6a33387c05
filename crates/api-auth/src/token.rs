//! Token and account payloads
//!
//! Request and response bodies of the authentication and user endpoints.
//! Login and refresh both answer with an `AuthResponse`; refresh leaves the
//! user fields null.

use serde::{Deserialize, Serialize};

use common::Credential;

use crate::error::{Error, Result};

/// Response of the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthResponse {
    /// The issued credential. A blank token is a malformed response.
    pub fn credential(&self) -> Result<Credential> {
        let credential = Credential::new(self.token.trim());
        if credential.is_empty() {
            return Err(Error::EmptyToken);
        }
        Ok(credential)
    }
}

/// Parse a login/refresh response body into the issued credential.
pub fn credential_from_response(body: &[u8]) -> Result<Credential> {
    let response: AuthResponse =
        serde_json::from_slice(body).map_err(|e| Error::TokenParse(e.to_string()))?;
    response.credential()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Partial profile update; absent fields are left unchanged server-side.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Signed-in user's profile as returned by `/user/profile`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}
