//! Domain types shared by every crate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::EpochMs;
use crate::validation::{validate_prompt, ValidationError};

/// Prefix of every derived display name.
pub const DISPLAY_NAME_PREFIX: &str = "user-";

/// Number of token characters (hyphens stripped) used in a derived display name.
pub const DISPLAY_NAME_TOKEN_CHARS: usize = 5;

/// Label granting the administrative navigation entries.
pub const ADMIN_LABEL: &str = "admin";

/// Stable anonymous identity of a device profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque stable token. Never changes once assigned.
    pub id: String,
    /// Human-facing name, derived from `id` unless set explicitly.
    pub display_name: String,
    /// Role labels for the current session. Not persisted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
}

impl Identity {
    /// Identity with a display name derived from the token.
    pub fn from_token(token: impl Into<String>) -> Self {
        let id = token.into();
        let display_name = derive_display_name(&id);
        Self {
            id,
            display_name,
            labels: BTreeSet::new(),
        }
    }

    /// Replaces the session labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// True if the identity carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// `"user-"` followed by the first five token characters with hyphens stripped.
///
/// Shorter tokens contribute all their characters.
pub fn derive_display_name(token: &str) -> String {
    let short: String = token
        .chars()
        .filter(|c| *c != '-')
        .take(DISPLAY_NAME_TOKEN_CHARS)
        .collect();
    format!("{DISPLAY_NAME_PREFIX}{short}")
}

/// Reference into the host UI's icon set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconRef(pub String);

impl IconRef {
    /// Wraps an icon name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Icon name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single navigable menu entry shown in the application chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationDescriptor {
    /// Stable entry id.
    pub id: String,
    /// Visible label.
    pub label: String,
    /// Route the entry navigates to.
    pub route: String,
    /// Icon shown next to the label.
    pub icon: IconRef,
}

impl NavigationDescriptor {
    /// Builds a descriptor.
    pub fn new(id: &str, label: &str, route: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            route: route.to_string(),
            icon: IconRef::new(icon),
        }
    }
}

/// A validated prompt ready to be sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt_text: String,
}

impl GenerationRequest {
    /// Validates `prompt_text` against `max_chars`. The text is kept unmodified.
    pub fn new(prompt_text: impl Into<String>, max_chars: usize) -> Result<Self, ValidationError> {
        let prompt_text = prompt_text.into();
        validate_prompt(&prompt_text, max_chars)?;
        Ok(Self { prompt_text })
    }

    /// The prompt exactly as submitted.
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }
}

/// Structured output of the generation service for one prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Serialized SVG document of the card. Empty when the service omitted it.
    pub artifact: String,
    /// Pattern engine configuration, passed through untouched.
    #[serde(default)]
    pub pattern_config: Option<Value>,
    /// Card content configuration (texts, colour scheme), passed through untouched.
    #[serde(default)]
    pub content_config: Option<Value>,
}

impl GenerationResult {
    /// True if the service returned a non-empty artifact.
    pub fn has_artifact(&self) -> bool {
        !self.artifact.is_empty()
    }
}

/// Phase of the single active generation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Nothing in flight and no notification showing.
    #[default]
    Idle,
    /// A request is awaiting the service.
    Pending,
    /// The last request produced a result.
    Succeeded,
    /// The last request failed.
    Failed,
}

impl WorkflowPhase {
    /// `Succeeded` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Submission is allowed in every phase except `Pending`.
    pub fn accepts_submission(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Visual flavour of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Request in progress.
    Progress,
    /// Request succeeded.
    Success,
    /// Request failed.
    Failure,
}

/// User-facing message attached to a workflow status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Flavour.
    pub kind: NotificationKind,
    /// Headline.
    pub message: String,
    /// Secondary line. Carries the error diagnostic for failures.
    #[serde(default)]
    pub detail: Option<String>,
    /// When the notification stops being shown. `None` for progress.
    #[serde(default)]
    pub expires_at_ms: Option<EpochMs>,
}

/// Current phase plus its notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    /// Phase.
    pub phase: WorkflowPhase,
    /// Notification to display, if any.
    #[serde(default)]
    pub notification: Option<Notification>,
}

impl WorkflowStatus {
    /// No request, nothing to display.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Request in flight.
    pub fn pending() -> Self {
        Self {
            phase: WorkflowPhase::Pending,
            notification: Some(Notification {
                kind: NotificationKind::Progress,
                message: "Generating your card...".to_string(),
                detail: Some("This may take a few moments".to_string()),
                expires_at_ms: None,
            }),
        }
    }

    /// Result stored; notification shown until `expires_at_ms`.
    pub fn succeeded(expires_at_ms: EpochMs) -> Self {
        Self {
            phase: WorkflowPhase::Succeeded,
            notification: Some(Notification {
                kind: NotificationKind::Success,
                message: "Card generated successfully!".to_string(),
                detail: Some("Check the preview panel".to_string()),
                expires_at_ms: Some(expires_at_ms),
            }),
        }
    }

    /// Request failed with `error`; notification shown until `expires_at_ms`.
    pub fn failed(error: impl Into<String>, expires_at_ms: EpochMs) -> Self {
        Self {
            phase: WorkflowPhase::Failed,
            notification: Some(Notification {
                kind: NotificationKind::Failure,
                message: "Failed to generate card. Please try again.".to_string(),
                detail: Some(error.into()),
                expires_at_ms: Some(expires_at_ms),
            }),
        }
    }

    /// True while a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.phase == WorkflowPhase::Pending
    }

    /// Diagnostic of a failed request.
    pub fn error_message(&self) -> Option<&str> {
        match (&self.phase, &self.notification) {
            (WorkflowPhase::Failed, Some(n)) => n.detail.as_deref().or(Some(n.message.as_str())),
            _ => None,
        }
    }
}
