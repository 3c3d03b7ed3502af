//! Session store actions used by the navigation guard.
//!
//! The guard never talks to the user-info endpoint or the permission schema
//! directly; it goes through [`SessionActions`] so hosts can swap in their own
//! store (and tests can script failures).

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_core::{Role, SessionContext, SessionError};

use crate::{ResolveError, RouteDescriptor, RouteResolver};

/// Current-user profile as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("failed to fetch user info: {0}")]
    UserInfo(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

/// Source of the signed-in user's profile and roles.
#[async_trait]
pub trait UserInfoProvider: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<UserInfo, ActionError>;
}

/// Async store actions consumed by the guard.
#[async_trait]
pub trait SessionActions: Send + Sync {
    /// Fetch the current user and install its canonical roles in the session.
    async fn fetch_current_user(&self) -> Result<Vec<Role>, ActionError>;

    /// Routes the given roles may reach (to be appended to the router).
    async fn generate_permission_routes(
        &self,
        roles: &[Role],
    ) -> Result<Vec<RouteDescriptor>, ActionError>;

    /// Log out.
    async fn reset_session(&self);
}

/// Default [`SessionActions`]: user info from a provider, routes from a
/// [`RouteResolver`], state in the shared [`SessionContext`].
pub struct SessionStore {
    session: Arc<SessionContext>,
    users: Arc<dyn UserInfoProvider>,
    resolver: Arc<dyn RouteResolver>,
    profile: RwLock<Option<UserInfo>>,
    dynamic: RwLock<Vec<RouteDescriptor>>,
}

impl SessionStore {
    pub fn new(
        session: Arc<SessionContext>,
        users: Arc<dyn UserInfoProvider>,
        resolver: Arc<dyn RouteResolver>,
    ) -> Self {
        Self {
            session,
            users,
            resolver,
            profile: RwLock::new(None),
            dynamic: RwLock::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Profile of the last successful `fetch_current_user`.
    ///
    /// Reported only while the session still holds roles, so a reset done
    /// elsewhere (for example by the response pipeline) hides it too.
    pub fn profile(&self) -> Option<UserInfo> {
        if !self.session.has_roles() {
            return None;
        }
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Routes produced by the last `generate_permission_routes`.
    pub fn dynamic_routes(&self) -> Vec<RouteDescriptor> {
        if !self.session.has_roles() {
            return Vec::new();
        }
        self.dynamic
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionActions for SessionStore {
    async fn fetch_current_user(&self) -> Result<Vec<Role>, ActionError> {
        let token = self.session.token().ok_or(ActionError::Unauthenticated)?;

        let info = self.users.current_user(&token).await?;
        if info.roles.is_empty() {
            return Err(SessionError::EmptyRoles.into());
        }

        // The session may have been reset while the request was in flight.
        self.session.install_roles(&token, info.roles.clone())?;
        tracing::info!(user = %info.name, roles = ?info.roles, "resolved session roles");

        let roles = info.roles.clone();
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(info);
        Ok(roles)
    }

    async fn generate_permission_routes(
        &self,
        roles: &[Role],
    ) -> Result<Vec<RouteDescriptor>, ActionError> {
        let routes = self.resolver.resolve(roles)?;
        *self.dynamic.write().unwrap_or_else(PoisonError::into_inner) = routes.clone();
        Ok(routes)
    }

    async fn reset_session(&self) {
        self.session.reset();
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.dynamic
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
