//! `gatehouse` — client-side access control for an application shell.
//!
//! [`AccessLayer`] gates page navigation behind the session's authentication
//! and roles, and mediates every API call (credential injection, response
//! classification, forced re-login). The building blocks are re-exported for
//! hosts that wire things themselves.

pub mod layer;

pub use layer::{AccessLayer, AccessLayerBuilder, BuildError};

pub use gatehouse_auth as auth;
pub use gatehouse_http as http;
pub use gatehouse_navigation as navigation;
pub use gatehouse_observability as observability;

pub use gatehouse_auth::{Permission, PermissionSchema, RouteDescriptor, UserInfo};
pub use gatehouse_core::{GatehouseConfig, Role, SessionContext, recording};
pub use gatehouse_http::{ApiClient, ApiError};
pub use gatehouse_navigation::{GuardOutcome, Location, NavigationError, NavigationRequest, Settled};
