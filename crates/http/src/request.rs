//! Outgoing request stage: credentials and nonce headers.

use std::sync::Arc;

use gatehouse_core::SessionContext;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use crate::ApiError;

pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";
pub const NONCE_HEADER: &str = "X-Ca-Nonce";

/// Attaches the session token and a fresh nonce to every outgoing request.
#[derive(Debug, Clone)]
pub struct RequestInterceptor {
    session: Arc<SessionContext>,
}

impl RequestInterceptor {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    /// Decorate a built request. A request that failed to build is surfaced
    /// as [`ApiError::Build`] without any header work.
    pub fn intercept(
        &self,
        request: Result<reqwest::Request, reqwest::Error>,
    ) -> Result<reqwest::Request, ApiError> {
        let mut request = request.map_err(|err| {
            tracing::warn!(error = %err, "request could not be built");
            ApiError::Build(err)
        })?;
        self.apply(request.headers_mut())?;
        Ok(request)
    }

    /// Write the auth and nonce headers. The nonce is always set; the two
    /// credential headers only while the session holds a token.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), ApiError> {
        if let Some(token) = self.session.token() {
            headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);
            headers.insert(
                HeaderName::from_static("x-access-token"),
                sensitive(&token)?,
            );
        }

        let nonce = Uuid::new_v4().to_string();
        headers.insert(
            HeaderName::from_static("x-ca-nonce"),
            HeaderValue::from_str(&nonce).map_err(|_| ApiError::InvalidHeader(NONCE_HEADER))?,
        );
        Ok(())
    }
}

fn sensitive(value: &str) -> Result<HeaderValue, ApiError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(ACCESS_TOKEN_HEADER))?;
    value.set_sensitive(true);
    Ok(value)
}
