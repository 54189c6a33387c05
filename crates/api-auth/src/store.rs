//! Credential storage
//!
//! The store is the single source of truth for the current bearer
//! credential. The client reads it at request time and never caches a copy
//! across requests; the refresh coordinator replaces or clears it when a
//! refresh cycle settles.
//!
//! Operations are synchronous: the store lives in memory and its lock is
//! never held across an await point.

use std::sync::{PoisonError, RwLock};

use common::Credential;
use tracing::debug;

/// Holder of the current bearer credential.
pub trait CredentialStore: Send + Sync {
    /// Current credential, if signed in.
    fn get(&self) -> Option<Credential>;

    /// Replace the current credential.
    fn set(&self, credential: Credential);

    /// Forget the current credential (signed out or session expired).
    fn clear(&self);

    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

/// In-memory credential store.
///
/// Reads take the shared lock briefly to clone the credential, so request-time
/// reads don't contend with each other. A blank credential is stored as absent.
#[derive(Default)]
pub struct MemoryCredentialStore {
    current: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start signed in with the given credential.
    pub fn with_credential(credential: Credential) -> Self {
        let store = Self::new();
        store.set(credential);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credential: Credential) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if credential.is_empty() {
            debug!("ignoring blank credential, store cleared");
            *current = None;
        } else {
            debug!("credential replaced");
            *current = Some(credential);
        }
    }

    fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.take().is_some() {
            debug!("credential cleared");
        }
    }
}
