//! Role checks for UI elements (show/hide by role).

use thiserror::Error;

use gatehouse_core::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleCheckError {
    #[error("need roles, e.g. [\"admin\", \"editor\"]")]
    NoRequiredRoles,
}

/// True when the session holds at least one of `required`.
///
/// An empty requirement is a caller error rather than "allow all": an element
/// guarded by nothing should not be guarded at all.
pub fn has_any_role(held: &[Role], required: &[Role]) -> Result<bool, RoleCheckError> {
    if required.is_empty() {
        return Err(RoleCheckError::NoRequiredRoles);
    }
    Ok(required.iter().any(|r| held.contains(r)))
}
