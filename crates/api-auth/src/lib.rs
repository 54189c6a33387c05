//! Credential handling for the bookkeeping API
//!
//! Holds the pieces of the authentication contract that the client and the
//! session helpers share: endpoint paths, the credential store the client
//! reads on every request, and the token payloads exchanged with the API.
//!
//! Credential flow:
//! 1. `Session::login()` posts `LoginRequest` to `LOGIN_PATH`
//! 2. The returned `AuthResponse` token is written to the `CredentialStore`
//! 3. Every outgoing request reads the store and sends `Authorization: Bearer <token>`
//! 4. A 401 triggers a single refresh exchange against `REFRESH_PATH`
//! 5. The refreshed token replaces the stored one, or the store is cleared

pub mod constants;
pub mod error;
pub mod store;
pub mod token;

pub use common::Credential;
pub use constants::*;
pub use error::{Error, Result};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use token::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UserProfile, credential_from_response,
};
