//! Router adapter that runs transitions through the guard.
//!
//! `GuardedRouter` turns guard outcomes into router continuations: `Allow`
//! commits the location and runs the after hook, `Redirect` starts a new
//! transition to the redirect target, `Defer` re-enters the guard with the
//! original request (now matched against the freshly added routes).

use std::sync::Arc;

use thiserror::Error;

use crate::{GuardOutcome, Location, NavigationGuard, NavigationRequest, Router};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation to {path} exceeded {hops} redirects")]
    TooManyRedirects { path: String, hops: usize },
}

/// A navigation that reached a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub location: Location,
    pub request: NavigationRequest,
    /// Guard passes it took (1 when allowed on the first try).
    pub passes: usize,
}

pub struct GuardedRouter {
    guard: NavigationGuard,
    router: Arc<dyn Router>,
    max_redirects: usize,
}

impl GuardedRouter {
    pub fn new(guard: NavigationGuard, router: Arc<dyn Router>) -> Self {
        Self {
            guard,
            router,
            max_redirects: 8,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects.max(1);
        self
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    pub async fn push(&self, target: impl Into<Location>) -> Result<Settled, NavigationError> {
        self.navigate(target.into()).await
    }

    pub async fn replace(&self, target: impl Into<Location>) -> Result<Settled, NavigationError> {
        self.navigate(target.into().replacing()).await
    }

    /// Run one navigation to completion, following redirects and re-issues.
    pub async fn navigate(&self, target: Location) -> Result<Settled, NavigationError> {
        let from = self
            .router
            .current()
            .map(|l| l.path)
            .unwrap_or_default();
        let original = target.path.clone();
        let mut request = self.request_for(target, &from);

        for pass in 1..=self.max_redirects + 1 {
            match self.guard.before_each(&request).await {
                GuardOutcome::Allow => {
                    let location = request.location();
                    self.router.commit(&location);
                    self.guard.after_each(&request);
                    tracing::debug!(path = %location.path, passes = pass, "navigation committed");
                    return Ok(Settled {
                        location,
                        request,
                        passes: pass,
                    });
                }
                GuardOutcome::Redirect(location) => {
                    tracing::debug!(from = %request.path, to = %location, "guard redirected");
                    request = self.request_for(location, &from);
                }
                GuardOutcome::Defer(deferred) => {
                    request = self.request_for(deferred.location(), &from);
                }
            }
        }

        // Every non-allow outcome already signalled `done()`.
        tracing::warn!(path = %original, hops = self.max_redirects, "redirect loop aborted");
        Err(NavigationError::TooManyRedirects {
            path: original,
            hops: self.max_redirects,
        })
    }

    fn request_for(&self, location: Location, from: &str) -> NavigationRequest {
        let matched = self.router.match_route(&location.path);
        let request = NavigationRequest::from_location(location, from);
        match matched {
            Some(m) => request.with_meta(m.meta).with_params(m.params),
            None => request,
        }
    }
}
