//! Client of the remote card generation service.

pub mod error;
pub mod http;

use async_trait::async_trait;
use tashreef_core::GenerationResult;

pub use error::GenerationError;
pub use http::{decode_result, HttpGenerationGateway};

/// Turns a prompt into a generated card. One attempt per call, no retries.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate_card(&self, prompt_text: &str) -> Result<GenerationResult, GenerationError>;
}
