use thiserror::Error;

pub type Result<T, E = IntentError> = core::result::Result<T, E>;

/// Failures on the interpretation path. Every variant is recoverable by
/// falling back to rule-based parsing.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("model response had no candidate text")]
    MissingCandidate,
    #[error("response is not a valid interpretation: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid model output: {0}")]
    InvalidResponse(String),
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("failed to build prompt: {0}")]
    Prompt(String),
}

#[cfg(feature = "gemini")]
impl From<reqwest::Error> for IntentError {
    fn from(err: reqwest::Error) -> Self {
        IntentError::Transport(err.without_url().to_string())
    }
}
