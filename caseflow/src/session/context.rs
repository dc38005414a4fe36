//! Process-wide session state — who is logged in and with what token.
//!
//! Modeled as an explicit shared handle rather than ad-hoc globals:
//! `begin` installs credentials after a successful credential check,
//! `clear` removes them on logout, and every outbound collaborator call
//! consults the same handle.

use std::sync::{Arc, PoisonError, RwLock};

/// Credentials held for the duration of a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

/// Cheap-to-clone handle to the active session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl SessionContext {
    /// A context with nobody logged in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install credentials after a successful credential check.
    pub fn begin(&self, username: &str, token: &str) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Credentials {
            username: username.to_string(),
            token: token.to_string(),
        });
    }

    /// Drop the credentials on logout, returning who was logged in.
    pub fn clear(&self) -> Option<Credentials> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Snapshot of the current credentials, if any.
    pub fn credentials(&self) -> Option<Credentials> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether somebody is logged in.
    pub fn is_active(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
