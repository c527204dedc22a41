use crate::engine::staging::{Attachment, ACCEPTED_EXTENSIONS};
use crate::event::{AppEvent, Command};
use crate::theme::Theme;
use crate::ui::channel::QueryBuffer;
use crate::ui::{BotContent, FileEntry};
use eframe::egui::{self, DroppedFile, Key, RichText, ScrollArea};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

const COPIED_LABEL_FOR: Duration = Duration::from_secs(2);

const QUICK_ACTIONS: &[(&str, &str)] = &[
    ("Navbar", "responsive navbar"),
    ("Hero", "hero section animation"),
    ("Pricing", "pricing cards"),
    ("Contact", "contact form"),
];

enum ChatEntry {
    User(String),
    Bot(BotContent),
}

pub struct ForgeApp {
    rx: Receiver<AppEvent>,
    commands: UnboundedSender<Command>,
    query: QueryBuffer,
    theme: Theme,
    transcript: Vec<ChatEntry>,
    files: Vec<FileEntry>,
    busy: bool,
    analyzing: bool,
    copied: Option<(usize, Instant)>,
    scroll_to_bottom: bool,
}

impl ForgeApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        commands: UnboundedSender<Command>,
        query: QueryBuffer,
        theme: Theme,
    ) -> Self {
        Self {
            rx,
            commands,
            query,
            theme,
            transcript: Vec::new(),
            files: Vec::new(),
            busy: false,
            analyzing: false,
            copied: None,
            scroll_to_bottom: false,
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("session command loop has stopped");
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("ui event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::UserMessage(text) => {
                self.transcript.push(ChatEntry::User(text));
                self.scroll_to_bottom = true;
            }
            AppEvent::BotMessage(content) => {
                self.transcript.push(ChatEntry::Bot(content));
                self.scroll_to_bottom = true;
            }
            AppEvent::FileList(files) => self.files = files,
            AppEvent::Busy(busy) => self.busy = busy,
            AppEvent::Analyzing(analyzing) => {
                self.analyzing = analyzing;
                self.scroll_to_bottom |= analyzing;
            }
        }
    }

    fn collect_dropped_files(&self, ctx: &egui::Context) {
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let attachments = dropped
            .into_iter()
            .filter_map(dropped_to_attachment)
            .collect::<Vec<_>>();
        self.send(Command::FilesSelected(attachments));
    }

    fn submit(&self) {
        self.send(submit_command(&self.query));
    }

    fn browse_files(&self) {
        let Some(paths) = rfd::FileDialog::new()
            .set_title("Attach project files")
            .add_filter("Project files", ACCEPTED_EXTENSIONS)
            .pick_files()
        else {
            return;
        };
        self.send(Command::FilesSelected(attachments_from_paths(paths)));
    }

    fn render_top_bar(&self, ctx: &egui::Context) {
        let (status, color) = if self.busy {
            ("Generating code...", self.theme.warning)
        } else {
            ("Ready", self.theme.success)
        };
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("forgebot");
                ui.separator();
                ui.label(RichText::new(status).color(color));
            });
        });
    }

    fn render_attachments_panel(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|input| !input.raw.hovered_files.is_empty());
        let mut browse = false;
        egui::SidePanel::left("attachments_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Attachments");
                ui.add_space(self.theme.spacing_4);
                self.theme.drop_zone_frame(hovering).show(ui, |ui| {
                    ui.label(
                        RichText::new("Drop .framer, .json, .zip, .txt, .js, .jsx, .ts or .tsx files here")
                            .color(self.theme.text_muted),
                    );
                    browse = ui.button("Browse…").clicked();
                });

                ui.separator();
                if self.files.is_empty() {
                    ui.label(RichText::new("No files staged").color(self.theme.text_muted));
                    return;
                }

                let mut removed = None;
                for (index, file) in self.files.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(format!("{} ({:.1}KB)", file.name, file.size_kb));
                        if ui.small_button("✕").on_hover_text("Remove").clicked() {
                            removed = Some(index);
                        }
                    });
                }
                if let Some(index) = removed {
                    self.send(Command::FileRemoved(index));
                }
            });

        if browse {
            self.browse_files();
        }
    }

    fn render_bot_content(&mut self, ui: &mut egui::Ui, index: usize, content: &BotContent) {
        match content {
            BotContent::Text(text) => {
                ui.label(text);
            }
            BotContent::InstantReply {
                response,
                suggestion,
            } => {
                ui.label(response);
                ui.label(RichText::new(suggestion).italics().color(self.theme.text_muted));
            }
            BotContent::GeneratedCode { code } => {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Code generated").strong().color(self.theme.success));
                    let copied = self
                        .copied
                        .is_some_and(|(entry, at)| entry == index && at.elapsed() < COPIED_LABEL_FOR);
                    let label = if copied { "Copied!" } else { "Copy Code" };
                    if ui.button(label).clicked() {
                        ui.ctx().copy_text(code.clone());
                        self.copied = Some((index, Instant::now()));
                        ui.ctx().request_repaint_after(COPIED_LABEL_FOR);
                    }
                });
                self.theme.code_frame().show(ui, |ui| {
                    ScrollArea::horizontal()
                        .id_salt(("generated_code", index))
                        .show(ui, |ui| {
                            ui.label(RichText::new(code).monospace());
                        });
                });
            }
            BotContent::FilesLoaded { count } => {
                ui.label(format!("📁 {count} compatible file(s) loaded for analysis!"));
            }
            BotContent::Failure { message } => {
                ui.label(RichText::new(format!("Error: {message}")).color(self.theme.danger));
            }
        }
    }

    fn render_transcript(&mut self, ui: &mut egui::Ui) {
        let transcript = std::mem::take(&mut self.transcript);
        for (index, entry) in transcript.iter().enumerate() {
            match entry {
                ChatEntry::User(text) => {
                    self.theme.bubble_frame(self.theme.user_bubble).show(ui, |ui| {
                        ui.label(RichText::new("You").strong());
                        ui.label(text);
                    });
                }
                ChatEntry::Bot(content) => {
                    let fill = self.theme.surface_2;
                    self.theme.bubble_frame(fill).show(ui, |ui| {
                        self.render_bot_content(ui, index, content);
                    });
                }
            }
        }
        // Events are only applied in `drain_events`, so nothing was added meanwhile.
        self.transcript = transcript;

        if self.analyzing {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    RichText::new("Analyzing your request...").color(self.theme.text_muted),
                );
            });
        }
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            let transcript_height = (ui.available_height() - 190.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    self.render_transcript(ui);
                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            ui.separator();
            ui.horizontal_wrapped(|ui| {
                for (label, query) in QUICK_ACTIONS {
                    if ui.add_enabled(!self.busy, egui::Button::new(*label)).clicked() {
                        *self.query.lock() = (*query).to_string();
                        self.submit();
                    }
                }
            });

            let hint = if self.busy {
                "Waiting for generated code..."
            } else {
                "Describe the component you need (Ctrl+Enter to send)"
            };

            let mut send_now = false;
            let has_text = {
                let mut query = self.query.lock();
                let response = ui.add(
                    egui::TextEdit::multiline(&mut *query)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY)
                        .hint_text(hint),
                );
                if response.changed() {
                    self.send(Command::Input(query.clone()));
                }
                if response.has_focus()
                    && ui.input(|input| input.key_pressed(Key::Enter) && input.modifiers.ctrl)
                {
                    send_now = true;
                }
                !query.trim().is_empty()
            };

            let clicked = ui
                .add_enabled(!self.busy && has_text, egui::Button::new("Generate Code"))
                .clicked();
            send_now |= clicked;

            if send_now && !self.busy {
                self.submit();
            }
        });
    }
}

fn dropped_to_attachment(file: DroppedFile) -> Option<Attachment> {
    if let Some(bytes) = file.bytes {
        let name = if file.name.is_empty() {
            file.path
                .as_ref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            file.name
        };
        return Some(Attachment::from_bytes(name, bytes.to_vec()));
    }

    path_to_attachment(&file.path?)
}

fn path_to_attachment(path: &Path) -> Option<Attachment> {
    match Attachment::from_path(path) {
        Ok(attachment) => Some(attachment),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read selected file");
            None
        }
    }
}

fn attachments_from_paths(paths: Vec<PathBuf>) -> Vec<Attachment> {
    paths
        .iter()
        .filter_map(|path| path_to_attachment(path))
        .collect()
}

/// Snapshots the composer so later keystrokes cannot change what is sent.
fn submit_command(query: &QueryBuffer) -> Command {
    Command::Submit(query.lock().clone())
}

impl eframe::App for ForgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.collect_dropped_files(ctx);
        self.render_top_bar(ctx);
        self.render_attachments_panel(ctx);
        self.render_center_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::{attachments_from_paths, dropped_to_attachment, submit_command};
    use crate::event::Command;
    use crate::ui::channel::QueryBuffer;
    use eframe::egui::DroppedFile;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn dropped_bytes_become_in_memory_attachment() {
        let file = DroppedFile {
            name: "site.framer".to_string(),
            bytes: Some(Arc::from(&b"abc"[..])),
            ..Default::default()
        };
        let attachment = dropped_to_attachment(file).expect("bytes are present");
        assert_eq!(attachment.name, "site.framer");
        assert_eq!(attachment.size_bytes, 3);
    }

    #[test]
    fn unreadable_path_is_skipped() {
        let file = DroppedFile {
            path: Some(PathBuf::from("/nonexistent/forgebot/missing.json")),
            ..Default::default()
        };
        assert!(dropped_to_attachment(file).is_none());
    }

    #[test]
    fn picked_paths_become_attachments_skipping_unreadable_ones() {
        let path = std::env::temp_dir().join(format!(
            "forgebot_app_{}_picked.json",
            std::process::id()
        ));
        fs::write(&path, b"{}").expect("fixture should write");

        let attachments = attachments_from_paths(vec![
            path.clone(),
            PathBuf::from("/nonexistent/forgebot/missing.tsx"),
        ]);

        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].size_bytes, 2);
        assert!(attachments[0].name.ends_with("_picked.json"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn submit_command_is_not_affected_by_later_typing() {
        let query = QueryBuffer::default();
        *query.lock() = "responsive navbar".to_string();

        let command = submit_command(&query);
        query.lock().push_str(" with a dropdown");

        assert!(matches!(command, Command::Submit(ref text) if text == "responsive navbar"));
    }
}
