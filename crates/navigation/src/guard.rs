//! Navigation guard: the before/after hook pair run around every transition.
//!
//! The guard decides per transition, in order:
//!
//! 1. no token, public target: allow
//! 2. no token, protected target: redirect to login (`?redirect=<target>`)
//! 3. token, target is the login page: redirect home
//! 4. token, roles resolved: allow
//! 5. token, roles empty: fetch user, generate permission routes, append
//!    them to the router, then defer (re-issue the same request with replace
//!    semantics so the new routes are matched)
//! 6. resolution failed: reset the session, notify, redirect to login; if
//!    the session changed while resolving, defer instead and let the next
//!    pass judge the new session
//!
//! `before_each` signals `start()` on entry. Every outcome other than `Allow`
//! signals `done()` itself; an allowed transition gets its `done()` from
//! `after_each` once it settles.

use std::sync::Arc;

use gatehouse_auth::{ActionError, SessionActions};
use gatehouse_core::{
    NoopNotifier, NoopProgress, Notifier, ProgressIndicator, SessionContext, SessionError,
};

use crate::{Location, NavigationRequest, Router};

/// Fallback notice when a failure carries no message.
pub const FALLBACK_ERROR: &str = "Has Error";

/// Decision for one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Proceed to the requested route unchanged.
    Allow,
    /// Abort and navigate somewhere else.
    Redirect(Location),
    /// Re-enter the guard with this request: routes were added (the request
    /// then replaces), or the session changed while roles were resolving.
    Defer(NavigationRequest),
}

pub struct NavigationGuard {
    session: Arc<SessionContext>,
    actions: Arc<dyn SessionActions>,
    router: Arc<dyn Router>,
    progress: Arc<dyn ProgressIndicator>,
    notifier: Arc<dyn Notifier>,
    login_path: String,
    home_path: String,
}

impl NavigationGuard {
    pub fn new(
        session: Arc<SessionContext>,
        actions: Arc<dyn SessionActions>,
        router: Arc<dyn Router>,
    ) -> Self {
        Self {
            session,
            actions,
            router,
            progress: Arc::new(NoopProgress),
            notifier: Arc::new(NoopNotifier),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressIndicator>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_paths(
        mut self,
        login_path: impl Into<String>,
        home_path: impl Into<String>,
    ) -> Self {
        self.login_path = login_path.into();
        self.home_path = home_path.into();
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Pre-navigation hook.
    pub async fn before_each(&self, to: &NavigationRequest) -> GuardOutcome {
        self.progress.start();

        let session = self.session.snapshot();
        let Some(token) = session.token() else {
            if to.meta.public {
                tracing::debug!(path = %to.path, "public route, no session: allow");
                return GuardOutcome::Allow;
            }
            tracing::debug!(path = %to.path, "protected route, no session: redirect to login");
            return self.settle(GuardOutcome::Redirect(self.login_redirect(to)));
        };

        if to.path == self.login_path {
            tracing::debug!("already signed in: redirect away from login");
            return self.settle(GuardOutcome::Redirect(Location::new(self.home_path.clone())));
        }

        if session.has_roles() {
            return GuardOutcome::Allow;
        }

        match self.resolve_permissions(token).await {
            Ok(added) => {
                tracing::info!(
                    path = %to.path,
                    routes = added,
                    "permissions resolved; re-issuing navigation"
                );
                self.settle(GuardOutcome::Defer(to.clone().replacing()))
            }
            Err(err) if self.session.token().as_deref() != Some(token) => {
                // Signed out or in again meanwhile: that session is not ours to reset.
                tracing::info!(
                    path = %to.path,
                    error = %err,
                    "session changed during role resolution; re-evaluating"
                );
                self.settle(GuardOutcome::Defer(to.clone()))
            }
            Err(err) => {
                tracing::warn!(
                    path = %to.path,
                    error = %err,
                    "role resolution failed; signing out"
                );
                self.actions.reset_session().await;
                let text = err.to_string();
                self.notifier
                    .error(if text.is_empty() { FALLBACK_ERROR } else { text.as_str() });
                self.settle(GuardOutcome::Redirect(self.login_redirect(to)))
            }
        }
    }

    /// Post-navigation hook, run once the transition is committed.
    pub fn after_each(&self, to: &NavigationRequest) {
        tracing::trace!(path = %to.path, "navigation settled");
        self.progress.done();
    }

    fn settle(&self, outcome: GuardOutcome) -> GuardOutcome {
        self.progress.done();
        outcome
    }

    fn login_redirect(&self, to: &NavigationRequest) -> Location {
        Location::new(self.login_path.clone()).with_query("redirect", to.path.clone())
    }

    /// Steps 5a–5c. Returns how many top-level routes were appended.
    async fn resolve_permissions(&self, token: &str) -> Result<usize, ActionError> {
        let roles = self.actions.fetch_current_user().await?;
        if roles.is_empty() {
            return Err(SessionError::EmptyRoles.into());
        }

        let routes = self.actions.generate_permission_routes(&roles).await?;

        // Re-validate after the suspensions: a 401 elsewhere may have reset us.
        if self.session.token().as_deref() != Some(token) {
            return Err(SessionError::TokenChanged.into());
        }

        let added = routes.len();
        self.router.add_routes(routes);
        Ok(added)
    }
}
