use crate::engine::staging::Attachment;

pub mod channel;

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to generate code. Please check the generation service and try again.";

/// Structured bot message content. The shell decides how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub enum BotContent {
    Text(String),
    InstantReply {
        response: String,
        suggestion: String,
    },
    /// Rendered with a copy-to-clipboard affordance.
    GeneratedCode { code: String },
    FilesLoaded { count: usize },
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub size_kb: f64,
}

impl From<&Attachment> for FileEntry {
    fn from(attachment: &Attachment) -> Self {
        Self {
            name: attachment.name.clone(),
            size_kb: attachment.size_kb(),
        }
    }
}

/// Presentation surface driven by the engine.
pub trait UiCollaborator: Send + Sync {
    fn render_user_message(&self, text: &str);
    fn render_bot_message(&self, content: BotContent);
    fn render_file_list(&self, attachments: &[Attachment]);
    fn set_busy(&self, busy: bool);
    fn show_analyzing_indicator(&self);
    fn hide_analyzing_indicator(&self);
    fn clear_query_text(&self);
}
