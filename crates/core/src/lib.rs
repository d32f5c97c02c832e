#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and validation for the Tashreef card client.

pub mod api;
pub mod model;
pub mod validation;

mod util;

pub use model::*;
pub use util::{new_ulid, now_ms, EpochMs};
pub use validation::{validate_prompt, ValidationError, MAX_PROMPT_CHARS};
