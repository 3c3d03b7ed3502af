use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_core::Role;

use crate::{Permission, RouteDescriptor};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("roles must be a non-empty array")]
    EmptyRoles,

    #[error("role at position {0} is blank")]
    BlankRole(usize),
}

/// Produces the permission-gated routes a role set may reach.
///
/// Implementations must be pure: identical role sequences yield identical
/// route tables. The navigation guard relies on that to make route
/// augmentation idempotent.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, roles: &[Role]) -> Result<Vec<RouteDescriptor>, ResolveError>;
}

/// Static permission schema: which role grants which permissions, and which
/// routes exist behind those permissions.
///
/// A role always grants the permission carrying its own name, so a schema can
/// gate routes on role names directly (`requires("admin")`) without listing
/// grants. The wildcard permission grants every route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSchema {
    grants: BTreeMap<Role, Vec<Permission>>,
    routes: Vec<RouteDescriptor>,
}

impl PermissionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, role: impl Into<Role>, permissions: Vec<Permission>) -> Self {
        self.grants.entry(role.into()).or_default().extend(permissions);
        self
    }

    pub fn route(mut self, route: RouteDescriptor) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Effective permissions of a role set.
    pub fn permissions_for(&self, roles: &[Role]) -> BTreeSet<Permission> {
        let mut effective = BTreeSet::new();
        for role in roles {
            effective.insert(Permission::new(role.as_str().to_string()));
            if let Some(granted) = self.grants.get(role) {
                effective.extend(granted.iter().cloned());
            }
        }
        effective
    }

    /// Element-level check: does any of `roles` grant `permission`?
    pub fn is_granted(&self, roles: &[Role], permission: &Permission) -> bool {
        allows(&self.permissions_for(roles), Some(permission))
    }
}

fn allows(effective: &BTreeSet<Permission>, required: Option<&Permission>) -> bool {
    match required {
        None => true,
        Some(required) => {
            effective.contains(required) || effective.iter().any(Permission::is_wildcard)
        }
    }
}

fn filter_routes(
    routes: &[RouteDescriptor],
    effective: &BTreeSet<Permission>,
) -> Vec<RouteDescriptor> {
    routes
        .iter()
        .filter(|route| allows(effective, route.meta.required_permission.as_ref()))
        .map(|route| {
            let mut kept = route.clone();
            kept.children = filter_routes(&route.children, effective);
            kept
        })
        .collect()
}

impl RouteResolver for PermissionSchema {
    fn resolve(&self, roles: &[Role]) -> Result<Vec<RouteDescriptor>, ResolveError> {
        if roles.is_empty() {
            return Err(ResolveError::EmptyRoles);
        }
        if let Some(idx) = roles.iter().position(Role::is_blank) {
            return Err(ResolveError::BlankRole(idx));
        }

        let effective = self.permissions_for(roles);
        let routes = filter_routes(&self.routes, &effective);
        tracing::debug!(
            roles = ?roles,
            generated = routes.len(),
            "generated permission routes"
        );
        Ok(routes)
    }
}
