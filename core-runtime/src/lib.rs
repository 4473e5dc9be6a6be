//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the narration engine:
//! - Logging and tracing infrastructure
//! - Event bus for narration and output lifecycle notifications
//! - Shared runtime error type
//!
//! Other workspace crates depend on this one for their logging conventions
//! and event broadcasting.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
