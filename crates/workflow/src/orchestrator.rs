use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tashreef_core::{
    new_ulid, now_ms, EpochMs, GenerationRequest, GenerationResult, ValidationError,
    WorkflowStatus,
};
use tashreef_gateway::{GenerationError, GenerationGateway};
use tashreef_state::ObservableStateStore;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::config::ClientConfig;

/// Why `submit` did not start a request. The workflow state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("invalid prompt: {0}")]
    Validation(#[from] ValidationError),
    #[error("a generation request is already pending")]
    ConcurrentSubmission,
    #[error("no async runtime to run the request on")]
    NoRuntime,
}

/// Drives one generation request at a time through
/// `Idle -> Pending -> Succeeded | Failed -> Idle`.
///
/// All state lives in the shared store; the orchestrator only keeps the
/// in-flight marker and the expiry timer. Store listeners may call the read
/// methods (`is_pending`, `validate`, `status`) but must not call `submit`
/// synchronously.
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    store: ObservableStateStore,
    gateway: Arc<dyn GenerationGateway>,
    notification_window: Duration,
    max_prompt_chars: usize,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    in_flight: Option<Ulid>,
    // Bumped on every transition; an expiry timer only fires for its own cycle.
    cycle: u64,
    expiry: Option<JoinHandle<()>>,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: ObservableStateStore,
        gateway: Arc<dyn GenerationGateway>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                gateway,
                notification_window: config.notification_window(),
                max_prompt_chars: config.max_prompt_chars,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Starts generating a card for `prompt_text`.
    ///
    /// Moves the workflow to `Pending` and returns at once; the request runs on
    /// the current Tokio runtime. Rejected without any side effect when the
    /// prompt is invalid, another request is pending, or there is no runtime.
    pub fn submit(&self, prompt_text: impl Into<String>) -> Result<Submission, SubmitError> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("submission ignored: no Tokio runtime");
            return Err(SubmitError::NoRuntime);
        };
        let mut control = self.inner.control.lock();
        if let Some(pending) = control.in_flight {
            debug!(pending = %pending, "submission ignored: request already pending");
            return Err(SubmitError::ConcurrentSubmission);
        }
        let request = GenerationRequest::new(prompt_text, self.inner.max_prompt_chars)
            .inspect_err(|e| debug!(error = %e, "submission ignored: invalid prompt"))?;

        let id = new_ulid();
        control.in_flight = Some(id);
        control.cycle += 1;
        if let Some(timer) = control.expiry.take() {
            timer.abort();
        }
        self.inner.store.set_workflow_status(WorkflowStatus::pending());

        let inner = Arc::clone(&self.inner);
        let handle = runtime.spawn(async move {
            let mut guard = FinishGuard {
                inner: &inner,
                id,
                armed: true,
            };
            let outcome = inner.gateway.generate_card(request.prompt_text()).await;
            guard.armed = false;
            inner.finish(id, outcome)
        });
        info!(submission_id = %id, "generation submitted");

        Ok(Submission {
            id,
            handle,
            store: self.inner.store.clone(),
        })
    }

    /// Why `prompt_text` would be rejected, if it would. Lets the UI disable its control.
    pub fn validate(&self, prompt_text: &str) -> Result<(), SubmitError> {
        if self.is_pending() {
            return Err(SubmitError::ConcurrentSubmission);
        }
        tashreef_core::validate_prompt(prompt_text, self.inner.max_prompt_chars)?;
        Ok(())
    }

    /// Reads the store, never the control lock, so listeners can call it mid-write.
    pub fn is_pending(&self) -> bool {
        self.inner.store.workflow_status().is_pending()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.inner.store.workflow_status()
    }

    pub fn store(&self) -> &ObservableStateStore {
        &self.inner.store
    }
}

impl Inner {
    fn finish(
        self: &Arc<Self>,
        id: Ulid,
        outcome: Result<GenerationResult, GenerationError>,
    ) -> WorkflowStatus {
        let outcome = outcome.map_err(|e| e.to_string());
        self.settle(id, outcome)
    }

    fn settle(self: &Arc<Self>, id: Ulid, outcome: Result<GenerationResult, String>) -> WorkflowStatus {
        let mut control = self.control.lock();
        if control.in_flight != Some(id) {
            // Only reachable if a guard fires after a normal finish.
            return self.store.workflow_status();
        }
        control.in_flight = None;
        control.cycle += 1;
        let cycle = control.cycle;
        if let Some(timer) = control.expiry.take() {
            timer.abort();
        }

        let expires_at_ms = now_ms().saturating_add(self.window_ms());
        let status = match outcome {
            Ok(result) => {
                info!(submission_id = %id, "generation succeeded");
                let status = WorkflowStatus::succeeded(expires_at_ms);
                self.store.complete_generation(result, status.clone());
                status
            }
            Err(message) => {
                warn!(submission_id = %id, error = %message, "generation failed");
                let status = WorkflowStatus::failed(message, expires_at_ms);
                self.store.set_workflow_status(status.clone());
                status
            }
        };
        control.expiry = self.schedule_expiry(cycle);
        status
    }

    fn schedule_expiry(self: &Arc<Self>, cycle: u64) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no runtime to schedule notification expiry");
            return None;
        };
        let inner: Weak<Self> = Arc::downgrade(self);
        let window = self.notification_window;
        Some(runtime.spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(cycle);
            }
        }))
    }

    fn expire(&self, cycle: u64) {
        let mut control = self.control.lock();
        if control.cycle != cycle {
            debug!(cycle, current = control.cycle, "stale notification expiry ignored");
            return;
        }
        control.expiry = None;
        self.store.set_workflow_status(WorkflowStatus::idle());
        debug!(cycle, "notification expired");
    }

    fn window_ms(&self) -> EpochMs {
        EpochMs::try_from(self.notification_window.as_millis()).unwrap_or(EpochMs::MAX)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.control.get_mut().expiry.take() {
            timer.abort();
        }
    }
}

/// Settles the request as failed if the gateway call never returns normally
/// (panic or runtime shutdown), so the workflow cannot stay `Pending`.
struct FinishGuard<'a> {
    inner: &'a Arc<Inner>,
    id: Ulid,
    armed: bool,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner
                .settle(self.id, Err("generation was interrupted".to_string()));
        }
    }
}

/// Handle to an accepted submission.
///
/// The workflow completes whether or not this is awaited.
pub struct Submission {
    id: Ulid,
    handle: JoinHandle<WorkflowStatus>,
    store: ObservableStateStore,
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Submission {
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Waits for the terminal status of this submission.
    ///
    /// If the task panicked or was cancelled, its guard already settled the
    /// store, so the store's current status is returned.
    pub async fn outcome(self) -> WorkflowStatus {
        match self.handle.await {
            Ok(status) => status,
            Err(e) => {
                debug!(submission_id = %self.id, error = %e, "generation task did not return");
                self.store.workflow_status()
            }
        }
    }
}
