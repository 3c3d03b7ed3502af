//! Incoming response stage: classify, notify, and map to a result.
//!
//! | response                  | effect                                   | result               |
//! |---------------------------|------------------------------------------|----------------------|
//! | none (transport failure)  | error notice                             | `Transport`          |
//! | 401                       | logout confirm; reset + reload on accept | `SessionExpired`     |
//! | 403                       | permission alert                         | `Forbidden`          |
//! | 200, `Success = false`    | error notice                             | `Domain(envelope)`   |
//! | 200, `Success = true`     | success notice when a message is present | payload              |
//! | 200, not an envelope      | error notice                             | `Decode`             |
//! | anything else             | error notice                             | `UnexpectedStatus`   |

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gatehouse_core::{
    ConfirmDialog, DialogKind, DialogOptions, NoopConfirm, NoopNotifier, NoopReloader, Notifier,
    Reloader, SessionContext,
};
use serde_json::Value;
use thiserror::Error;

use crate::{Envelope, RawResponse, TransportError};

pub const FALLBACK_NOTICE: &str = "Error";

pub const RELOGIN_TEXT: &str =
    "You have been logged out. Cancel to stay on this page, or log in again.";
pub const RELOGIN_TITLE: &str = "Confirm logout";
pub const RELOGIN_CONFIRM: &str = "Log in again";
pub const RELOGIN_CANCEL: &str = "Cancel";

pub const FORBIDDEN_TEXT: &str = "Your permissions are insufficient";
pub const FORBIDDEN_TITLE: &str = "Permission denied";
pub const FORBIDDEN_CONFIRM: &str = "OK";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build request: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("session expired")]
    SessionExpired,

    #[error("permission denied")]
    Forbidden,

    #[error("{}", .0.message().unwrap_or(FALLBACK_NOTICE))]
    Domain(Envelope),

    #[error("response body could not be decoded: {0}")]
    Decode(String),

    #[error("request failed with status {0}")]
    UnexpectedStatus(u16),
}

/// What a received response means, before any side effect runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseClass {
    Success(Envelope),
    DomainFailure(Envelope),
    Undecodable(String),
    SessionExpired,
    Forbidden,
    Unexpected(u16),
}

impl ResponseClass {
    pub fn of(response: &RawResponse) -> Self {
        match response.status {
            200 => match response.envelope() {
                Ok(envelope) if envelope.success => Self::Success(envelope),
                Ok(envelope) => Self::DomainFailure(envelope),
                Err(err) => Self::Undecodable(err.to_string()),
            },
            401 => Self::SessionExpired,
            403 => Self::Forbidden,
            other => Self::Unexpected(other),
        }
    }
}

pub fn relogin_options() -> DialogOptions {
    DialogOptions {
        confirm_text: RELOGIN_CONFIRM.to_string(),
        cancel_text: Some(RELOGIN_CANCEL.to_string()),
        kind: DialogKind::Warning,
    }
}

pub fn forbidden_options() -> DialogOptions {
    DialogOptions {
        confirm_text: FORBIDDEN_CONFIRM.to_string(),
        cancel_text: None,
        kind: DialogKind::Warning,
    }
}

/// Turns responses into `Result`s and drives the user-facing side effects.
pub struct ResponseInterceptor {
    session: Arc<SessionContext>,
    notifier: Arc<dyn Notifier>,
    dialog: Arc<dyn ConfirmDialog>,
    reloader: Arc<dyn Reloader>,
    // Set while a logout confirm is open; concurrent 401s don't stack prompts.
    relogin_open: AtomicBool,
}

impl ResponseInterceptor {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self {
            session,
            notifier: Arc::new(NoopNotifier),
            dialog: Arc::new(NoopConfirm),
            reloader: Arc::new(NoopReloader),
            relogin_open: AtomicBool::new(false),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_dialog(mut self, dialog: Arc<dyn ConfirmDialog>) -> Self {
        self.dialog = dialog;
        self
    }

    pub fn with_reloader(mut self, reloader: Arc<dyn Reloader>) -> Self {
        self.reloader = reloader;
        self
    }

    pub async fn intercept(
        &self,
        outcome: Result<RawResponse, TransportError>,
    ) -> Result<Value, ApiError> {
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "request failed without a response");
                self.notifier.error(non_blank(err.message()));
                return Err(ApiError::Transport(err));
            }
        };

        let status = response.status;
        match ResponseClass::of(&response) {
            ResponseClass::Success(envelope) => {
                if let Some(message) = envelope.message() {
                    self.notifier.success(message);
                }
                Ok(envelope.into_payload())
            }
            ResponseClass::DomainFailure(envelope) => {
                tracing::debug!(message = ?envelope.message, "domain failure");
                self.notifier
                    .error(envelope.message().unwrap_or(FALLBACK_NOTICE));
                Err(ApiError::Domain(envelope))
            }
            ResponseClass::Undecodable(reason) => {
                tracing::warn!(%reason, "200 response is not an envelope");
                self.notifier.error(FALLBACK_NOTICE);
                Err(ApiError::Decode(reason))
            }
            ResponseClass::SessionExpired => {
                self.force_logout().await;
                Err(ApiError::SessionExpired)
            }
            ResponseClass::Forbidden => {
                tracing::info!("request forbidden");
                self.dialog
                    .alert(FORBIDDEN_TEXT, FORBIDDEN_TITLE, &forbidden_options())
                    .await;
                Err(ApiError::Forbidden)
            }
            ResponseClass::Unexpected(_) => {
                tracing::warn!(status, "unexpected response status");
                self.notifier
                    .error(&format!("Request failed with status {status}"));
                Err(ApiError::UnexpectedStatus(status))
            }
        }
    }

    async fn force_logout(&self) {
        if self
            .relogin_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("logout confirm already open");
            return;
        }

        let accepted = {
            let _open = PromptSlot(&self.relogin_open);
            self.dialog
                .confirm(RELOGIN_TEXT, RELOGIN_TITLE, &relogin_options())
                .await
        };

        if accepted {
            tracing::info!("session expired; resetting and reloading");
            self.session.reset();
            self.reloader.reload();
        } else {
            tracing::info!("session expired; user stayed on page");
        }
    }
}

/// Frees the logout prompt slot when the confirm finishes or its future is dropped.
struct PromptSlot<'a>(&'a AtomicBool);

impl Drop for PromptSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn non_blank(text: &str) -> &str {
    if text.trim().is_empty() {
        FALLBACK_NOTICE
    } else {
        text
    }
}
