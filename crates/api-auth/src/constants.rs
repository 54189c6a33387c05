//! API endpoint paths and user-facing messages
//!
//! Paths are relative to the configured API base URL (the server mounts
//! everything under `/api`).

/// Refresh exchange: trades the presented bearer credential for a new one.
pub const REFRESH_PATH: &str = "/auth/refresh";

pub const LOGIN_PATH: &str = "/auth/login";

pub const REGISTER_PATH: &str = "/auth/register";

pub const PROFILE_PATH: &str = "/user/profile";

pub const CHANGE_PASSWORD_PATH: &str = "/user/change-password";

/// Shown once per failed refresh cycle, or when the refresh endpoint rejects
/// the credential directly.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please sign in again";

/// Fallback when an error response carries no `message` field.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";

pub const NETWORK_ERROR_MESSAGE: &str = "Network error or no response from server";

pub const REGISTERED_MESSAGE: &str = "Registration successful";

pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated";

pub const PASSWORD_CHANGED_MESSAGE: &str = "Password changed, please sign in again";
