//! UI collaborators consumed by the guard and the interceptors.
//!
//! Every collaborator is optional for the host: when a shell has no progress
//! bar, toast channel or dialog, it plugs the matching `Noop*` implementation
//! and both pipelines keep working headless.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Navigation progress bar.
pub trait ProgressIndicator: Send + Sync {
    fn start(&self);
    fn done(&self);
}

/// User-visible message channel (toasts).
pub trait Notifier: Send + Sync {
    fn error(&self, text: &str);
    fn success(&self, text: &str);
}

/// Visual style of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Button labels and style passed to a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogOptions {
    pub confirm_text: String,
    pub cancel_text: Option<String>,
    pub kind: DialogKind,
}

/// Modal confirm/alert dialog.
#[async_trait]
pub trait ConfirmDialog: Send + Sync {
    /// Resolves `true` when the user accepts.
    async fn confirm(&self, text: &str, title: &str, options: &DialogOptions) -> bool;

    async fn alert(&self, text: &str, title: &str, options: &DialogOptions);
}

/// Full application reload (drops in-memory route state).
pub trait Reloader: Send + Sync {
    fn reload(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressIndicator for NoopProgress {
    fn start(&self) {}
    fn done(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn error(&self, _text: &str) {}
    fn success(&self, _text: &str) {}
}

/// Dialog stand-in for hosts without one; never confirms.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConfirm;

#[async_trait]
impl ConfirmDialog for NoopConfirm {
    async fn confirm(&self, _text: &str, _title: &str, _options: &DialogOptions) -> bool {
        false
    }

    async fn alert(&self, _text: &str, _title: &str, _options: &DialogOptions) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReloader;

impl Reloader for NoopReloader {
    fn reload(&self) {}
}

/// Notifier that writes to the tracing pipeline instead of a UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, text: &str) {
        tracing::error!(message = text, "user notice");
    }

    fn success(&self, text: &str) {
        tracing::info!(message = text, "user notice");
    }
}
