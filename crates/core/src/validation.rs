//! Prompt submission rules.

use thiserror::Error;

/// Prompt length bound enforced before a submission leaves the UI layer.
pub const MAX_PROMPT_CHARS: usize = 500;

/// Reasons a prompt is not submittable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only text.
    #[error("prompt is empty")]
    EmptyPrompt,
    /// Longer than the configured bound.
    #[error("prompt is {len} characters long (limit {max})")]
    PromptTooLong {
        /// Length of the rejected prompt, in characters.
        len: usize,
        /// Configured limit.
        max: usize,
    },
}

/// Checks a prompt against the submission rules.
///
/// Length is counted in characters of the text as typed, not bytes.
pub fn validate_prompt(text: &str, max_chars: usize) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(ValidationError::PromptTooLong {
            len,
            max: max_chars,
        });
    }
    Ok(())
}
