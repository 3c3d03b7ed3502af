//! `gatehouse-auth` — route permissions and session store actions.
//!
//! Decides which permission-gated routes a role set may reach, and exposes the
//! async store actions (fetch user, generate routes, reset) the navigation
//! guard drives. Decoupled from HTTP and from any concrete router.

pub mod actions;
pub mod check;
pub mod permissions;
pub mod resolver;
pub mod route;

pub use actions::{ActionError, SessionActions, SessionStore, UserInfo, UserInfoProvider};
pub use check::{RoleCheckError, has_any_role};
pub use permissions::Permission;
pub use resolver::{PermissionSchema, ResolveError, RouteResolver};
pub use route::{RouteDescriptor, RouteMeta, join_path};
