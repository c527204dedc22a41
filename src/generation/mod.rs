use crate::engine::augment::augment;
use crate::engine::classifier::ClassificationResult;
use crate::engine::staging::Attachment;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Immutable payload of one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    attachments: Vec<Attachment>,
}

impl GenerationRequest {
    /// Returns `None` when there is nothing to send: a blank query, or an
    /// instant reply whose augmented prompt is the empty sentinel.
    pub fn build(
        raw_query: &str,
        classification: &ClassificationResult,
        attachments: Vec<Attachment>,
    ) -> Option<Self> {
        if raw_query.trim().is_empty() {
            return None;
        }
        let prompt = augment(raw_query, classification, &attachments);
        if prompt.trim().is_empty() {
            return None;
        }
        Some(Self {
            prompt,
            attachments,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    code: String,
}

/// Posts requests as `multipart/form-data` (`query` plus one `files` part per
/// attachment) and expects `{"code": "..."}` back.
pub struct HttpGenerationService {
    client: Client,
    endpoint: String,
}

impl HttpGenerationService {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    async fn build_form(request: &GenerationRequest) -> Result<Form, GenerationError> {
        let mut form = Form::new().text("query", request.prompt().to_string());
        for attachment in request.attachments() {
            let bytes = attachment
                .read_content()
                .await
                .map_err(|source| GenerationError::Attachment {
                    name: attachment.name.clone(),
                    source,
                })?;
            form = form.part("files", Part::bytes(bytes).file_name(attachment.name.clone()));
        }
        Ok(form)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let form = Self::build_form(request).await?;
        debug!(
            endpoint = %self.endpoint,
            attachments = request.attachments().len(),
            "posting generation request"
        );

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_response(&body)
    }
}

fn parse_response(body: &[u8]) -> Result<String, GenerationError> {
    serde_json::from_slice::<GenerateResponse>(body)
        .map(|payload| payload.code)
        .map_err(|err| GenerationError::MalformedResponse(err.to_string()))
}
