#![forbid(unsafe_code)]

//! Generation workflow: one in-flight request, its result, and the
//! auto-expiring notification that follows.

pub mod config;
pub mod orchestrator;
pub mod session;

pub use config::ClientConfig;
pub use orchestrator::{SubmitError, Submission, WorkflowOrchestrator};
pub use session::Session;
