//! `gatehouse-core` — session state and UI collaborator contracts.
//!
//! This crate contains the state shared by the navigation guard and the HTTP
//! pipeline, plus the traits for the UI pieces both of them signal.
//! No routing and no HTTP here.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod recording;
pub mod role;
pub mod session;

pub use collaborators::{
    ConfirmDialog, DialogKind, DialogOptions, NoopConfirm, NoopNotifier, NoopProgress,
    NoopReloader, Notifier, ProgressIndicator, Reloader, TracingNotifier,
};
pub use config::GatehouseConfig;
pub use error::{ConfigError, SessionError};
pub use role::Role;
pub use session::{MemoryTokenStore, Session, SessionContext, TokenStore};
