//! `gatehouse-http` — request/response interceptors and the API client.
//!
//! Outgoing calls pick up the session token and a per-request nonce; incoming
//! responses are classified by status and envelope, with the matching user
//! notice or dialog, and turned into `Result<Value, ApiError>`.

pub mod client;
pub mod envelope;
pub mod request;
pub mod response;

pub use client::{ApiClient, HttpUserInfoProvider};
pub use envelope::{Envelope, RawResponse, TransportError};
pub use request::{ACCESS_TOKEN_HEADER, NONCE_HEADER, RequestInterceptor};
pub use response::{
    ApiError, FALLBACK_NOTICE, FORBIDDEN_TEXT, FORBIDDEN_TITLE, RELOGIN_TEXT, RELOGIN_TITLE,
    ResponseClass, ResponseInterceptor, forbidden_options, relogin_options,
};
