//! Test doubles for the engine's collaborators.

use crate::engine::staging::Attachment;
use crate::error::GenerationError;
use crate::generation::{GenerationRequest, GenerationService};
use crate::ui::{BotContent, FileEntry, UiCollaborator};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum UiCall {
    User(String),
    Bot(BotContent),
    FileList(Vec<FileEntry>),
    Busy(bool),
    ShowAnalyzing,
    HideAnalyzing,
    ClearQuery,
}

#[derive(Debug, Default)]
pub struct RecordingUi {
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingUi {
    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: UiCall) {
        self.calls.lock().push(call);
    }
}

impl UiCollaborator for RecordingUi {
    fn render_user_message(&self, text: &str) {
        self.record(UiCall::User(text.to_string()));
    }

    fn render_bot_message(&self, content: BotContent) {
        self.record(UiCall::Bot(content));
    }

    fn render_file_list(&self, attachments: &[Attachment]) {
        self.record(UiCall::FileList(
            attachments.iter().map(FileEntry::from).collect(),
        ));
    }

    fn set_busy(&self, busy: bool) {
        self.record(UiCall::Busy(busy));
    }

    fn show_analyzing_indicator(&self) {
        self.record(UiCall::ShowAnalyzing);
    }

    fn hide_analyzing_indicator(&self) {
        self.record(UiCall::HideAnalyzing);
    }

    fn clear_query_text(&self) {
        self.record(UiCall::ClearQuery);
    }
}

type ErrorFactory = Arc<dyn Fn() -> GenerationError + Send + Sync>;

/// Generation service with a fixed answer. A gated service parks every call
/// until `release` is called.
#[derive(Clone)]
pub struct ScriptedService {
    answer: Result<String, ErrorFactory>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    called: Arc<Notify>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedService {
    pub fn succeeding(code: &str) -> Self {
        Self {
            answer: Ok(code.to_string()),
            requests: Arc::default(),
            called: Arc::default(),
            gate: None,
        }
    }

    pub fn failing(error: impl Fn() -> GenerationError + Send + Sync + 'static) -> Self {
        Self {
            answer: Err(Arc::new(error)),
            ..Self::succeeding("")
        }
    }

    pub fn gated(code: &str) -> Self {
        Self {
            gate: Some(Arc::default()),
            ..Self::succeeding(code)
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub async fn wait_until_called(&self) {
        self.called.notified().await;
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request.clone());
        self.called.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.answer {
            Ok(code) => Ok(code.clone()),
            Err(factory) => Err(factory()),
        }
    }
}
