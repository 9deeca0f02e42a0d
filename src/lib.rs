// SPDX-License-Identifier: MIT

//! Condition-driven clinical data collection and weighted diagnosis.
//!
//! - [`workflow::condition`] parses and evaluates the condition language.
//! - [`workflow::script`] walks screens forward and back, skipping screens
//!   whose conditions do not hold.
//! - [`workflow::diagnosis`] scores rules against collected answers.

pub mod error;
pub mod workflow;

pub use error::{DiagnosisError, NavigationError, SyntaxError, TriageError};
