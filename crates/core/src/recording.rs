//! Collaborators that record what they were asked to show.
//!
//! Used by headless hosts (and tests) to observe the signals the pipelines
//! emit without a UI.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::collaborators::{ConfirmDialog, DialogOptions, Notifier, ProgressIndicator, Reloader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Start,
    Done,
}

#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn starts(&self) -> usize {
        self.count(ProgressEvent::Start)
    }

    pub fn dones(&self) -> usize {
        self.count(ProgressEvent::Done)
    }

    fn count(&self, wanted: ProgressEvent) -> usize {
        self.events().into_iter().filter(|e| *e == wanted).count()
    }

    fn push(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ProgressIndicator for RecordingProgress {
    fn start(&self) {
        self.push(ProgressEvent::Start);
    }

    fn done(&self) {
        self.push(ProgressEvent::Done);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Error(text) => Some(text),
                Notice::Success(_) => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, text: &str) {
        self.push(Notice::Error(text.to_string()));
    }

    fn success(&self, text: &str) {
        self.push(Notice::Success(text.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Confirm,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
    pub title: String,
    pub options: DialogOptions,
}

/// Dialog that answers every confirm with a fixed decision.
#[derive(Debug)]
pub struct ScriptedConfirm {
    answer: bool,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedConfirm {
    pub fn accepting() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, kind: PromptKind, text: &str, title: &str, options: &DialogOptions) {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Prompt {
                kind,
                text: text.to_string(),
                title: title.to_string(),
                options: options.clone(),
            });
    }
}

#[async_trait]
impl ConfirmDialog for ScriptedConfirm {
    async fn confirm(&self, text: &str, title: &str, options: &DialogOptions) -> bool {
        self.record(PromptKind::Confirm, text, title, options);
        self.answer
    }

    async fn alert(&self, text: &str, title: &str, options: &DialogOptions) {
        self.record(PromptKind::Alert, text, title, options);
    }
}

#[derive(Debug, Default)]
pub struct CountingReloader {
    reloads: AtomicUsize,
}

impl CountingReloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Reloader for CountingReloader {
    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}
