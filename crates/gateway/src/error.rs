use thiserror::Error;

/// A generation attempt produced no result.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("could not reach generation service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("generation service returned HTTP {status}")]
    Status { status: u16 },
    #[error("malformed generation response: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn malformed<E: std::fmt::Display>(e: E) -> Self {
        Self::Malformed(e.to_string())
    }
}
