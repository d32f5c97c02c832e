//! Wire types of the generation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::GenerationResult;

/// Path of the generation endpoint, relative to the service base URL.
pub const GENERATE_PATH: &str = "/ts/pattern/generate";

/// Body of `POST /ts/pattern/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateCardRequest {
    /// Prompt text, sent unmodified.
    pub text: String,
}

/// Success body of `POST /ts/pattern/generate`.
///
/// Every field is optional so partial responses still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateCardResponse {
    /// Rendered card markup.
    #[serde(default)]
    pub card_svg: Option<String>,
    /// Parameters the pattern engine used.
    #[serde(default)]
    pub pattern_config: Option<Value>,
    /// Text content placed on the card.
    #[serde(default)]
    pub content_config: Option<Value>,
}

impl From<GenerateCardResponse> for GenerationResult {
    fn from(resp: GenerateCardResponse) -> Self {
        Self {
            artifact: resp.card_svg.unwrap_or_default(),
            pattern_config: resp.pattern_config,
            content_config: resp.content_config,
        }
    }
}
