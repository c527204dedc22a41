use crate::engine::staging::Attachment;
use crate::event::AppEvent;
use crate::ui::{BotContent, FileEntry, UiCollaborator};
use egui::Context;
use parking_lot::Mutex;
use std::sync::{mpsc, Arc};
use tracing::debug;

/// Text of the composer, shared between the window and the engine.
pub type QueryBuffer = Arc<Mutex<String>>;

/// Forwards engine output to the window as `AppEvent`s and wakes it up.
pub struct ChannelUi {
    tx: mpsc::Sender<AppEvent>,
    ctx: Context,
    query: QueryBuffer,
}

impl ChannelUi {
    pub fn new(tx: mpsc::Sender<AppEvent>, ctx: Context, query: QueryBuffer) -> Self {
        Self { tx, ctx, query }
    }

    fn send(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            debug!("window closed; dropping ui event");
            return;
        }
        self.ctx.request_repaint();
    }
}

impl UiCollaborator for ChannelUi {
    fn render_user_message(&self, text: &str) {
        self.send(AppEvent::UserMessage(text.to_string()));
    }

    fn render_bot_message(&self, content: BotContent) {
        self.send(AppEvent::BotMessage(content));
    }

    fn render_file_list(&self, attachments: &[Attachment]) {
        self.send(AppEvent::FileList(
            attachments.iter().map(FileEntry::from).collect(),
        ));
    }

    fn set_busy(&self, busy: bool) {
        self.send(AppEvent::Busy(busy));
    }

    fn show_analyzing_indicator(&self) {
        self.send(AppEvent::Analyzing(true));
    }

    fn hide_analyzing_indicator(&self) {
        self.send(AppEvent::Analyzing(false));
    }

    fn clear_query_text(&self) {
        self.query.lock().clear();
        self.ctx.request_repaint();
    }
}
