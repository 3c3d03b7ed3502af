//! Shared session state.
//!
//! A single [`SessionContext`] is created per application shell and shared
//! (via `Arc`) by the navigation guard and the HTTP interceptors. Neither
//! pipeline keeps a private copy of the token or roles.
//!
//! ## Invariants
//!
//! - `token` absent ⇔ the session is unauthenticated.
//! - `roles` is non-empty only after a successful role fetch for the current
//!   token; it is emptied whenever the token is cleared or replaced.
//!
//! Every mutation happens inside one short critical section. The lock is never
//! held across an `.await`, so callers that read, suspend, then write must
//! re-validate (see [`SessionContext::install_roles`]).

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::role::Role;

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: Option<String>,
    roles: Vec<Role>,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Roles have been fetched for the current token.
    pub fn has_roles(&self) -> bool {
        !self.roles.is_empty()
    }
}

/// Persistence for the credential token (cookie, keychain, file...).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// The shared, mutable session owned by the application shell.
pub struct SessionContext {
    state: RwLock<Session>,
    tokens: Arc<dyn TokenStore>,
}

impl core::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let session = self.read();
        f.debug_struct("SessionContext")
            .field("authenticated", &session.is_authenticated())
            .field("roles", &session.roles)
            .finish()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Empty session backed by an in-memory token store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Session::default()),
            tokens: Arc::new(MemoryTokenStore::new()),
        }
    }

    /// Session restored from a persisted token (roles are always re-fetched).
    pub fn restore(tokens: Arc<dyn TokenStore>) -> Self {
        let token = tokens.load().filter(|t| !t.is_empty());
        if token.is_some() {
            tracing::debug!("restored persisted session token");
        }
        Self {
            state: RwLock::new(Session {
                token,
                roles: Vec::new(),
            }),
            tokens,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.read().roles.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn has_roles(&self) -> bool {
        self.read().has_roles()
    }

    /// Store a freshly issued token (login flow). Roles are cleared so the
    /// next guarded navigation re-resolves them.
    pub fn sign_in(&self, token: impl Into<String>) {
        let token = token.into();
        self.tokens.save(&token);
        let mut session = self.write();
        session.token = Some(token);
        session.roles.clear();
    }

    /// Install roles fetched for `expected_token`.
    ///
    /// Fails if the session was reset or re-signed while the fetch was in
    /// flight, leaving the session untouched.
    pub fn install_roles(
        &self,
        expected_token: &str,
        roles: Vec<Role>,
    ) -> Result<(), SessionError> {
        if roles.is_empty() {
            return Err(SessionError::EmptyRoles);
        }
        let mut session = self.write();
        match session.token.as_deref() {
            None => Err(SessionError::Unauthenticated),
            Some(current) if current != expected_token => Err(SessionError::TokenChanged),
            Some(_) => {
                session.roles = roles;
                Ok(())
            }
        }
    }

    /// Log out: drop token and roles, and forget the persisted token.
    pub fn reset(&self) {
        {
            let mut session = self.write();
            session.token = None;
            session.roles.clear();
        }
        self.tokens.clear();
        tracing::info!("session reset");
    }
}
