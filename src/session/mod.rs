use crate::engine::orchestrator::{RequestOrchestrator, SubmitOutcome};
use crate::engine::scheduler::{Clock, Evaluation, LiveAnalysisScheduler};
use crate::engine::staging::{Attachment, SharedStaging};
use crate::error::{StagingError, SubmitError};
use crate::event::Command;
use crate::generation::GenerationService;
use crate::ui::{BotContent, UiCollaborator};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_millis(50);

const WELCOME: &str = "Welcome to forgebot! I analyze your requests as you type. Try:\n• \"responsive navbar\"\n• \"hero section animation\"\n• Drop project files here for analysis";

/// Everything one chat window owns: staged files, the live-analysis
/// schedule, and the request gate.
pub struct Session<S, U, C> {
    ui: Arc<U>,
    staging: SharedStaging,
    scheduler: Mutex<LiveAnalysisScheduler<C>>,
    orchestrator: RequestOrchestrator<S, U>,
}

impl<S, U, C> Session<S, U, C>
where
    S: GenerationService + 'static,
    U: UiCollaborator + 'static,
    C: Clock + 'static,
{
    pub fn new(service: S, ui: Arc<U>, clock: C, debounce: Duration) -> Self {
        let staging = SharedStaging::default();
        Self {
            orchestrator: RequestOrchestrator::new(service, Arc::clone(&ui), staging.clone()),
            scheduler: Mutex::new(LiveAnalysisScheduler::new(clock, debounce)),
            staging,
            ui,
        }
    }

    pub fn welcome(&self) {
        self.ui.render_bot_message(BotContent::Text(WELCOME.to_string()));
    }

    pub fn on_input(&self, text: &str) {
        self.scheduler.lock().on_input(text);
    }

    pub fn tick(&self) -> Option<Evaluation> {
        self.scheduler.lock().poll(&*self.ui)
    }

    pub fn on_files_selected(&self, files: Vec<Attachment>) -> usize {
        let offered = files.len();
        let count = self.staging.add(files);
        info!(offered, staged = count, "files selected");
        self.ui.render_file_list(&self.staging.snapshot());
        self.ui.render_bot_message(BotContent::FilesLoaded { count });
        count
    }

    pub fn on_file_removed(&self, index: usize) -> Result<(), StagingError> {
        let removed = self.staging.remove(index)?;
        debug!(name = %removed.name, "attachment removed");
        self.ui.render_file_list(&self.staging.snapshot());
        Ok(())
    }

    pub async fn on_submit(&self, text: &str) -> Result<SubmitOutcome, SubmitError> {
        self.scheduler.lock().cancel();
        self.orchestrator.submit(text).await
    }

    pub fn dispatch(self: &Arc<Self>, command: Command) {
        match command {
            Command::Input(text) => self.on_input(&text),
            Command::FilesSelected(files) => {
                self.on_files_selected(files);
            }
            Command::FileRemoved(index) => {
                if let Err(err) = self.on_file_removed(index) {
                    warn!(error = %err, "rejected attachment removal");
                }
            }
            Command::Submit(text) => {
                let session = Arc::clone(self);
                tokio::spawn(async move {
                    match session.on_submit(&text).await {
                        Ok(outcome) => debug!(?outcome, "submission finished"),
                        Err(SubmitError::EmptyPrompt) => debug!("empty submission ignored"),
                        Err(err) => debug!(error = %err, "submission did not complete"),
                    }
                });
            }
        }
    }

    #[cfg(test)]
    fn orchestrator(&self) -> &RequestOrchestrator<S, U> {
        &self.orchestrator
    }
}

/// Applies window commands in arrival order and drives the debounce timer.
/// Returns once the window drops its sender.
pub async fn run<S, U, C>(session: Arc<Session<S, U, C>>, mut commands: UnboundedReceiver<Command>)
where
    S: GenerationService + 'static,
    U: UiCollaborator + 'static,
    C: Clock + 'static,
{
    let mut ticker = time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    info!("command channel closed; stopping session");
                    break;
                };
                session.dispatch(command);
            }
            _ = ticker.tick() => {
                if let Some(evaluation) = session.tick() {
                    debug!(text = %evaluation.text, result = ?evaluation.result, "live analysis evaluated");
                }
            }
        }
    }
}
