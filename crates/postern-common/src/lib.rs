//! # Postern Common
//!
//! Shared types, errors, and constants used across Postern components.
//!
//! ## Modules
//! - `types` - Core data structures (SubmittedForm, Language, DispatchOutcome)
//! - `error` - Request rejection taxonomy
//! - `constants` - Field names, headers, and policy defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::{ContactError, ContentRejection, ValidationError};
pub use types::*;
