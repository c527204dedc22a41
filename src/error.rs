use std::io;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StagingError {
    #[error("attachment index {index} out of range (staged: {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failure of the remote generation call. The user only ever sees a generic
/// message; these details go to the log.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    MalformedResponse(String),

    #[error("failed to read attachment {name}: {source}")]
    Attachment {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Status(u16),
    MalformedResponse,
    Attachment,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Status(code) => FailureKind::Status(*code),
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::Attachment { .. } => FailureKind::Attachment,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("query is empty; nothing to submit")]
    EmptyPrompt,

    #[error("a generation request is already in flight")]
    InFlight,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
