use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),
}

/// Shown for both upstream and parse failures; the details go to the logs.
pub const TRY_AGAIN_MESSAGE: &str = "Failed to generate flashcards. Please try again.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("upstream error (status {}): {body}", status_label(.status))]
    Upstream { status: Option<u16>, body: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Storage(#[from] CoreError),
}

fn status_label(status: &Option<u16>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string())
}

impl GenerationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GenerationError::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        GenerationError::Parse(msg.into())
    }

    /// Short stable tag used in logs and in the generation audit record.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "configuration",
            GenerationError::Validation(_) => "validation",
            GenerationError::Upstream { .. } => "upstream",
            GenerationError::Parse(_) => "parse",
            GenerationError::Storage(_) => "storage",
        }
    }

    /// Message safe to show next to the input that triggered the failure.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration(msg) | GenerationError::Validation(msg) => msg.clone(),
            GenerationError::Upstream { .. } | GenerationError::Parse(_) => {
                TRY_AGAIN_MESSAGE.to_string()
            }
            GenerationError::Storage(e) => format!("Could not save flashcards: {e}"),
        }
    }
}
