//! Types shared across the API client workspace

mod credential;
mod error;

pub use credential::Credential;
pub use error::{Error, Result};
