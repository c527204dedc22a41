use crate::engine::staging::Attachment;
use crate::ui::{BotContent, FileEntry};

/// Updates from the engine to the window, drained once per frame.
#[derive(Debug, Clone)]
pub enum AppEvent {
    UserMessage(String),
    BotMessage(BotContent),
    FileList(Vec<FileEntry>),
    Busy(bool),
    Analyzing(bool),
}

/// User actions from the window to the session's command loop.
#[derive(Debug, Clone)]
pub enum Command {
    Input(String),
    /// Composer text as it was when the user submitted.
    Submit(String),
    FilesSelected(Vec<Attachment>),
    FileRemoved(usize),
}
