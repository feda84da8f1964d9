use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Missing prompt or childId")]
    Validation,

    #[error("OpenAI API key not configured")]
    #[diagnostic(help("set OPENAI_API_KEY or pass --api-key"))]
    UpstreamUnavailable,

    #[error("OpenAI API error: {status}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
