//! Session-scoped form state.
//!
//! This module provides:
//! - Uploaded image validation and thumbnails
//! - Per-session form values and the OCR suggestion
//! - The in-memory session registry with idle expiry

pub mod state;
pub mod store;
pub mod upload;

pub use state::{FormSubmission, SessionState};
pub use store::{SessionId, SessionStore};
