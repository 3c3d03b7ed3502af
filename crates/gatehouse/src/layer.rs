//! Composition root: one shared session wired into the guard and both
//! interceptor stages.

use std::sync::Arc;

use gatehouse_auth::{
    Permission, PermissionSchema, RoleCheckError, RouteDescriptor, SessionActions, SessionStore,
    UserInfoProvider, has_any_role,
};
use gatehouse_core::{
    ConfigError, ConfirmDialog, GatehouseConfig, MemoryTokenStore, NoopConfirm, NoopNotifier,
    NoopProgress, Notifier, ProgressIndicator, Reloader, Role, SessionContext, TokenStore,
};
use gatehouse_http::{ApiClient, ApiError, HttpUserInfoProvider, ResponseInterceptor};
use gatehouse_navigation::{
    GuardedRouter, Location, NavigationError, NavigationGuard, RouteTable, Settled,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up API client: {0}")]
    Api(#[from] ApiError),
}

/// Reloads the route table, then whatever the host registered.
struct ChainReloader(Vec<Arc<dyn Reloader>>);

impl Reloader for ChainReloader {
    fn reload(&self) {
        for reloader in &self.0 {
            reloader.reload();
        }
    }
}

pub struct AccessLayerBuilder {
    config: GatehouseConfig,
    progress: Arc<dyn ProgressIndicator>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn ConfirmDialog>,
    reloader: Option<Arc<dyn Reloader>>,
    token_store: Arc<dyn TokenStore>,
    user_info: Option<Arc<dyn UserInfoProvider>>,
    schema: PermissionSchema,
    static_routes: Vec<RouteDescriptor>,
}

impl AccessLayerBuilder {
    fn new(config: GatehouseConfig) -> Self {
        Self {
            config,
            progress: Arc::new(NoopProgress),
            notifier: Arc::new(NoopNotifier),
            confirm: Arc::new(NoopConfirm),
            reloader: None,
            token_store: Arc::new(MemoryTokenStore::new()),
            user_info: None,
            schema: PermissionSchema::new(),
            static_routes: Vec::new(),
        }
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressIndicator>) -> Self {
        self.progress = progress;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn confirm(mut self, confirm: Arc<dyn ConfirmDialog>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Extra reload step run after the route table drops its dynamic routes.
    pub fn reloader(mut self, reloader: Arc<dyn Reloader>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    pub fn token_store(mut self, token_store: Arc<dyn TokenStore>) -> Self {
        self.token_store = token_store;
        self
    }

    /// Replace the HTTP user-info source.
    pub fn user_info(mut self, user_info: Arc<dyn UserInfoProvider>) -> Self {
        self.user_info = Some(user_info);
        self
    }

    pub fn schema(mut self, schema: PermissionSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Routes present before any permission resolution (login, home, 404...).
    pub fn static_routes(mut self, routes: Vec<RouteDescriptor>) -> Self {
        self.static_routes = routes;
        self
    }

    pub fn build(self) -> Result<AccessLayer, BuildError> {
        self.config.validate()?;

        let session = Arc::new(SessionContext::restore(self.token_store));
        let routes = Arc::new(RouteTable::new(self.static_routes));

        let mut reloaders: Vec<Arc<dyn Reloader>> = vec![routes.clone()];
        reloaders.extend(self.reloader);

        let responses = ResponseInterceptor::new(session.clone())
            .with_notifier(self.notifier.clone())
            .with_dialog(self.confirm)
            .with_reloader(Arc::new(ChainReloader(reloaders)));
        let api = Arc::new(ApiClient::from_config(
            &self.config,
            session.clone(),
            responses,
        )?);

        let user_info = match self.user_info {
            Some(user_info) => user_info,
            None => Arc::new(HttpUserInfoProvider::new(
                api.clone(),
                self.config.user_info_path.clone(),
            )),
        };
        let schema = Arc::new(self.schema);
        let store = Arc::new(SessionStore::new(session.clone(), user_info, schema.clone()));

        let guard = NavigationGuard::new(session.clone(), store.clone(), routes.clone())
            .with_progress(self.progress)
            .with_notifier(self.notifier)
            .with_paths(&self.config.login_path, &self.config.home_path);
        let navigator =
            GuardedRouter::new(guard, routes.clone()).with_max_redirects(self.config.max_redirects);

        tracing::info!(
            api = %api.base_url(),
            restored = session.is_authenticated(),
            "access layer ready"
        );

        Ok(AccessLayer {
            config: self.config,
            session,
            schema,
            store,
            routes,
            navigator,
            api,
        })
    }
}

/// Navigation guard, API client and session of one application shell.
pub struct AccessLayer {
    config: GatehouseConfig,
    session: Arc<SessionContext>,
    schema: Arc<PermissionSchema>,
    store: Arc<SessionStore>,
    routes: Arc<RouteTable>,
    navigator: GuardedRouter,
    api: Arc<ApiClient>,
}

impl AccessLayer {
    pub fn builder(config: GatehouseConfig) -> AccessLayerBuilder {
        AccessLayerBuilder::new(config)
    }

    /// Headless layer configured from `GATEHOUSE_*` variables.
    pub fn from_env() -> anyhow::Result<Self> {
        use anyhow::Context;

        let config = GatehouseConfig::from_env().context("reading GATEHOUSE_* configuration")?;
        let layer = Self::builder(config)
            .build()
            .context("building access layer")?;
        Ok(layer)
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn navigator(&self) -> &GuardedRouter {
        &self.navigator
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Store a freshly issued token; roles are resolved on the next navigation.
    pub fn sign_in(&self, token: impl Into<String>) {
        self.session.sign_in(token);
    }

    /// Drop the session and its cached profile and routes.
    pub async fn sign_out(&self) {
        self.store.reset_session().await;
    }

    pub async fn navigate(&self, target: impl Into<Location>) -> Result<Settled, NavigationError> {
        self.navigator.push(target).await
    }

    /// Show/hide check for elements restricted to some roles.
    pub fn has_any_role(&self, required: &[Role]) -> Result<bool, RoleCheckError> {
        has_any_role(&self.session.roles(), required)
    }

    pub fn is_granted(&self, permission: &Permission) -> bool {
        self.schema.is_granted(&self.session.roles(), permission)
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::recording::CountingReloader;

    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let config = GatehouseConfig {
            login_path: "login".to_string(),
            ..GatehouseConfig::default()
        };
        assert!(matches!(
            AccessLayer::builder(config).build(),
            Err(BuildError::Config(_))
        ));
    }

    #[test]
    fn restores_persisted_token() {
        let layer = AccessLayer::builder(GatehouseConfig::default())
            .token_store(Arc::new(MemoryTokenStore::with_token("kept")))
            .build()
            .unwrap();
        assert_eq!(layer.session().token().as_deref(), Some("kept"));
        assert!(!layer.session().has_roles());
    }

    #[test]
    fn chained_reload_runs_every_step() {
        let first = Arc::new(CountingReloader::new());
        let second = Arc::new(CountingReloader::new());
        ChainReloader(vec![first.clone(), second.clone()]).reload();
        assert_eq!((first.reloads(), second.reloads()), (1, 1));
    }

    #[test]
    fn role_checks_follow_session_roles() {
        let layer = AccessLayer::builder(GatehouseConfig::default())
            .schema(PermissionSchema::new().grant("editor", vec![Permission::new("posts.write")]))
            .build()
            .unwrap();
        layer.sign_in("token");
        layer
            .session()
            .install_roles("token", vec![Role::new("editor")])
            .unwrap();

        assert_eq!(layer.has_any_role(&[Role::new("editor")]), Ok(true));
        assert_eq!(layer.has_any_role(&[Role::new("admin")]), Ok(false));
        assert!(layer.is_granted(&Permission::new("posts.write")));
        assert!(!layer.is_granted(&Permission::new("posts.delete")));
    }
}
