use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tashreef_core::api::{GenerateCardRequest, GenerateCardResponse, GENERATE_PATH};
use tashreef_core::GenerationResult;
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::GenerationGateway;

/// `GenerationGateway` over `POST {base_url}/ts/pattern/generate`.
///
/// Uses the transport's default timeout.
#[derive(Clone, Debug)]
pub struct HttpGenerationGateway {
    client: Client,
    endpoint: String,
}

impl HttpGenerationGateway {
    /// Gateway for the service at `base_url`, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_path(base_url, GENERATE_PATH)
    }

    pub fn with_path(base_url: &str, path: &str) -> Self {
        Self::with_client(Client::new(), base_url, path)
    }

    pub fn with_client(client: Client, base_url: &str, path: &str) -> Self {
        let endpoint = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationGateway for HttpGenerationGateway {
    async fn generate_card(&self, prompt_text: &str) -> Result<GenerationResult, GenerationError> {
        if prompt_text.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let body = GenerateCardRequest {
            text: prompt_text.to_string(),
        };
        debug!(endpoint = %self.endpoint, chars = prompt_text.chars().count(), "requesting card");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            // Error bodies have no contract; only the status is reported.
            warn!(status = status.as_u16(), "generation service rejected request");
            return Err(GenerationError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(GenerationError::Transport)?;
        let result = decode_result(&bytes)?;
        info!(
            artifact_bytes = result.artifact.len(),
            has_pattern_config = result.pattern_config.is_some(),
            "card generated"
        );
        Ok(result)
    }
}

/// Decodes a success body.
///
/// Accepts the result object itself or a JSON string containing it, which is
/// what the service emits when it serializes its response twice.
pub fn decode_result(body: &[u8]) -> Result<GenerationResult, GenerationError> {
    let value: Value = serde_json::from_slice(body).map_err(GenerationError::malformed)?;
    let value = match value {
        Value::String(inner) => serde_json::from_str(&inner).map_err(GenerationError::malformed)?,
        other => other,
    };
    if !value.is_object() {
        return Err(GenerationError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    let resp: GenerateCardResponse =
        serde_json::from_value(value).map_err(GenerationError::malformed)?;
    Ok(resp.into())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let gw = HttpGenerationGateway::new("http://localhost:8000/");
        assert_eq!(gw.endpoint(), "http://localhost:8000/ts/pattern/generate");
    }

    #[test]
    fn decodes_double_encoded_body() {
        let inner = r#"{"card_svg":"<svg/>","pattern_config":{"engine_type":"l_system"}}"#;
        let body = serde_json::to_vec(&Value::String(inner.into())).unwrap();
        let result = decode_result(&body).unwrap();
        assert_eq!(result.artifact, "<svg/>");
        assert_eq!(result.content_config, None);
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert!(matches!(decode_result(b"[1,2]"), Err(GenerationError::Malformed(_))));
        assert!(matches!(decode_result(b"null"), Err(GenerationError::Malformed(_))));
        assert!(matches!(decode_result(b"\"plain text\""), Err(GenerationError::Malformed(_))));
        assert!(matches!(decode_result(b"<html>"), Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn empty_object_is_an_empty_result() {
        let result = decode_result(b"{}").unwrap();
        assert_eq!(result, GenerationResult::default());
    }
}
