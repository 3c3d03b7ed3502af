//! `gatehouse-navigation` — guarded route transitions.
//!
//! The guard itself returns a decision per transition ([`GuardOutcome`]);
//! [`GuardedRouter`] is the adapter that turns decisions into router
//! continuations. Tests can drive either layer without a real router.

pub mod driver;
pub mod guard;
pub mod request;
pub mod router;

pub use driver::{GuardedRouter, NavigationError, Settled};
pub use guard::{FALLBACK_ERROR, GuardOutcome, NavigationGuard};
pub use request::{Location, NavigationRequest};
pub use router::{RouteMatch, RouteTable, Router};
