//! Session and configuration error model.

use thiserror::Error;

/// Rejected session mutation.
///
/// Returned when a write would break the session invariants (roles only ever
/// belong to the token they were fetched for).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session has no token; roles cannot be installed.
    #[error("session is not authenticated")]
    Unauthenticated,

    /// The token changed (reset or re-login) while roles were being fetched.
    #[error("session token changed while roles were being resolved")]
    TokenChanged,

    /// Roles must be a non-empty list.
    #[error("roles must be a non-empty array")]
    EmptyRoles,
}

/// Invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
