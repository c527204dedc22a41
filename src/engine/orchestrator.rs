use crate::engine::classifier::{classify, ClassificationResult};
use crate::engine::staging::SharedStaging;
use crate::error::{FailureKind, SubmitError};
use crate::generation::{GenerationRequest, GenerationService};
use crate::ui::{BotContent, UiCollaborator, GENERIC_FAILURE_MESSAGE};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    InFlight,
    Succeeded(String),
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Answered locally with an instant reply; nothing was sent.
    Answered,
    Generated { code: String },
}

/// Owns the single generation request that may be outstanding at a time.
pub struct RequestOrchestrator<S, U> {
    service: S,
    ui: Arc<U>,
    staging: SharedStaging,
    state: Mutex<RequestState>,
}

/// Held for the lifetime of an in-flight request. Dropping it restores the
/// busy indicator and returns the state to `Idle`, whatever the exit path.
struct InFlightGuard<'a, U: UiCollaborator> {
    state: &'a Mutex<RequestState>,
    ui: &'a U,
}

impl<U: UiCollaborator> InFlightGuard<'_, U> {
    fn finish(&self, outcome: RequestState) {
        *self.state.lock() = outcome;
    }
}

impl<U: UiCollaborator> Drop for InFlightGuard<'_, U> {
    fn drop(&mut self) {
        self.ui.set_busy(false);
        let settled = std::mem::replace(&mut *self.state.lock(), RequestState::Idle);
        match settled {
            RequestState::Succeeded(code) => debug!(bytes = code.len(), "request settled"),
            RequestState::Failed(kind) => debug!(?kind, "request settled with failure"),
            RequestState::InFlight | RequestState::Idle => {
                debug!("request abandoned before completion")
            }
        }
    }
}

impl<S: GenerationService, U: UiCollaborator> RequestOrchestrator<S, U> {
    pub fn new(service: S, ui: Arc<U>, staging: SharedStaging) -> Self {
        Self {
            service,
            ui,
            staging,
            state: Mutex::new(RequestState::Idle),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> RequestState {
        self.state.lock().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        *self.state.lock() == RequestState::InFlight
    }

    fn begin(&self) -> Result<InFlightGuard<'_, U>, SubmitError> {
        let mut state = self.state.lock();
        if *state == RequestState::InFlight {
            return Err(SubmitError::InFlight);
        }
        *state = RequestState::InFlight;
        Ok(InFlightGuard {
            state: &self.state,
            ui: &*self.ui,
        })
    }

    pub async fn submit(&self, raw_query: &str) -> Result<SubmitOutcome, SubmitError> {
        let query = raw_query.trim();
        let classification = classify(query);

        if let ClassificationResult::InstantReply(reply) = &classification {
            info!("answered with instant reply");
            self.ui.render_bot_message(BotContent::InstantReply {
                response: reply.response.to_string(),
                suggestion: reply.suggestion.to_string(),
            });
            return Ok(SubmitOutcome::Answered);
        }

        if self.is_in_flight() {
            warn!("submission rejected: request already in flight");
            return Err(SubmitError::InFlight);
        }

        let Some(request) =
            GenerationRequest::build(query, &classification, self.staging.snapshot())
        else {
            return Err(SubmitError::EmptyPrompt);
        };

        let guard = self.begin().inspect_err(|_| {
            warn!("submission rejected: request already in flight");
        })?;

        self.ui.hide_analyzing_indicator();
        self.ui.set_busy(true);
        self.ui.render_user_message(request.prompt());
        self.ui.clear_query_text();
        info!(
            category = ?classification.category(),
            attachments = request.attachments().len(),
            "generation request in flight"
        );

        match self.service.generate(&request).await {
            Ok(code) => {
                info!(bytes = code.len(), "generation succeeded");
                self.ui
                    .render_bot_message(BotContent::GeneratedCode { code: code.clone() });
                self.staging.clear();
                self.ui.render_file_list(&[]);
                guard.finish(RequestState::Succeeded(code.clone()));
                Ok(SubmitOutcome::Generated { code })
            }
            Err(err) => {
                error!(error = %err, "generation failed");
                self.ui.render_bot_message(BotContent::Failure {
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                });
                guard.finish(RequestState::Failed(err.kind()));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::staging::Attachment;
    use crate::error::GenerationError;
    use crate::testing::{RecordingUi, ScriptedService, UiCall};

    fn orchestrator(
        service: ScriptedService,
    ) -> (
        Arc<RequestOrchestrator<ScriptedService, RecordingUi>>,
        Arc<RecordingUi>,
        SharedStaging,
    ) {
        let ui = Arc::new(RecordingUi::default());
        let staging = SharedStaging::default();
        let orchestrator = Arc::new(RequestOrchestrator::new(
            service,
            Arc::clone(&ui),
            staging.clone(),
        ));
        (orchestrator, ui, staging)
    }

    fn staged_names(staging: &SharedStaging) -> Vec<String> {
        staging
            .snapshot()
            .into_iter()
            .map(|attachment| attachment.name)
            .collect()
    }

    #[tokio::test]
    async fn navbar_query_generates_code_and_clears_staging() {
        let service = ScriptedService::succeeding("X");
        let (orchestrator, ui, staging) = orchestrator(service.clone());
        staging.add(vec![Attachment::from_bytes("a.json", b"{}".to_vec())]);

        let outcome = orchestrator
            .submit("responsive navbar")
            .await
            .expect("generation should succeed");

        assert_eq!(outcome, SubmitOutcome::Generated { code: "X".to_string() });
        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt().contains("navbar"));
        assert!(requests[0].prompt().contains("Include:"));
        assert_eq!(requests[0].attachments().len(), 1);
        assert!(ui
            .calls()
            .contains(&UiCall::Bot(BotContent::GeneratedCode { code: "X".to_string() })));
        assert!(staging.snapshot().is_empty());
        assert_eq!(orchestrator.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn ui_feedback_runs_in_order() {
        let (orchestrator, ui, _staging) = orchestrator(ScriptedService::succeeding("code"));
        orchestrator.submit("pricing table").await.expect("succeeds");

        let calls = ui.calls();
        let position = |wanted: &UiCall| {
            calls
                .iter()
                .position(|call| call == wanted)
                .expect("call should be recorded")
        };
        assert!(position(&UiCall::HideAnalyzing) < position(&UiCall::Busy(true)));
        assert!(position(&UiCall::Busy(true)) < position(&UiCall::ClearQuery));
        assert!(matches!(calls.last(), Some(UiCall::Busy(false))));
    }

    #[tokio::test]
    async fn help_query_answers_locally() {
        let service = ScriptedService::succeeding("unused");
        let (orchestrator, ui, _staging) = orchestrator(service.clone());

        let outcome = orchestrator.submit("help").await.expect("instant reply");

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert!(service.requests().is_empty());
        assert_eq!(orchestrator.state(), RequestState::Idle);
        assert!(matches!(
            ui.calls().as_slice(),
            [UiCall::Bot(BotContent::InstantReply { .. })]
        ));
    }

    #[tokio::test]
    async fn failure_keeps_staged_files_for_retry() {
        let service = ScriptedService::failing(|| GenerationError::Status(500));
        let (orchestrator, ui, staging) = orchestrator(service.clone());
        staging.add(vec![Attachment::from_bytes("a.json", b"{}".to_vec())]);

        let error = orchestrator
            .submit("contact form")
            .await
            .expect_err("service failure should surface");

        assert!(matches!(error, SubmitError::Generation(GenerationError::Status(500))));
        assert_eq!(staged_names(&staging), ["a.json"]);
        assert!(ui.calls().contains(&UiCall::Bot(BotContent::Failure {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        })));
        assert!(matches!(ui.calls().last(), Some(UiCall::Busy(false))));
        assert_eq!(orchestrator.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn failure_message_does_not_leak_cause() {
        let service = ScriptedService::failing(|| {
            GenerationError::MalformedResponse("secret-token-123".to_string())
        });
        let (orchestrator, ui, _staging) = orchestrator(service);
        let _ = orchestrator.submit("card grid").await;

        let leaked = ui.calls().iter().any(|call| match call {
            UiCall::Bot(BotContent::Failure { message }) => message.contains("secret"),
            _ => false,
        });
        assert!(!leaked);
    }

    #[tokio::test]
    async fn blank_query_is_a_silent_no_op() {
        let service = ScriptedService::succeeding("unused");
        let (orchestrator, ui, staging) = orchestrator(service.clone());
        staging.add(vec![Attachment::from_bytes("a.json", b"{}".to_vec())]);

        let error = orchestrator.submit("   ").await.expect_err("blank query aborts");

        assert!(matches!(error, SubmitError::EmptyPrompt));
        assert!(service.requests().is_empty());
        assert!(ui.calls().is_empty());
        assert_eq!(orchestrator.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let service = ScriptedService::gated("done");
        let (orchestrator, _ui, _staging) = orchestrator(service.clone());

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.submit("hero banner").await }
        });
        service.wait_until_called().await;
        assert_eq!(orchestrator.state(), RequestState::InFlight);

        let second = orchestrator.submit("navbar").await;
        assert!(matches!(second, Err(SubmitError::InFlight)));
        assert_eq!(orchestrator.state(), RequestState::InFlight);

        service.release();
        let first = first.await.expect("task should join").expect("first succeeds");
        assert_eq!(first, SubmitOutcome::Generated { code: "done".to_string() });
        assert_eq!(service.requests().len(), 1);
        assert_eq!(orchestrator.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn staging_changes_do_not_touch_in_flight_request() {
        let service = ScriptedService::gated("done");
        let (orchestrator, _ui, staging) = orchestrator(service.clone());
        staging.add(vec![Attachment::from_bytes("a.json", b"{}".to_vec())]);

        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.submit("navbar").await }
        });
        service.wait_until_called().await;
        staging.add(vec![Attachment::from_bytes("b.txt", b"b".to_vec())]);
        service.release();
        task.await.expect("task should join").expect("succeeds");

        let requests = service.requests();
        assert_eq!(requests[0].attachments()[0].name, "a.json");
    }

    #[tokio::test]
    async fn dropped_request_still_cleans_up() {
        let service = ScriptedService::gated("never");
        let (orchestrator, ui, _staging) = orchestrator(service.clone());

        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.submit("navbar").await }
        });
        service.wait_until_called().await;
        task.abort();
        let _ = task.await;

        assert_eq!(orchestrator.state(), RequestState::Idle);
        assert!(matches!(ui.calls().last(), Some(UiCall::Busy(false))));
    }

    #[test]
    fn terminal_state_is_visible_until_the_guard_drops() {
        let (orchestrator, ui, _staging) = orchestrator(ScriptedService::succeeding("unused"));

        let guard = orchestrator.begin().expect("idle orchestrator admits a request");
        assert!(matches!(orchestrator.begin(), Err(SubmitError::InFlight)));
        guard.finish(RequestState::Failed(FailureKind::Status(502)));
        assert_eq!(
            orchestrator.state(),
            RequestState::Failed(FailureKind::Status(502))
        );

        drop(guard);
        assert_eq!(orchestrator.state(), RequestState::Idle);
        assert_eq!(ui.calls(), [UiCall::Busy(false)]);
    }
}
