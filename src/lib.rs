//! apee-i - configuration-driven API pipeline runner
//!
//! Given a declarative description of environments, credentials and
//! ordered call sequences, this library authenticates once, runs the
//! sequences over HTTP or WebSocket and reports pass/fail per call.

pub mod auth;
pub mod cli;
pub mod commands;
pub mod common;
pub mod model;
pub mod report;
pub mod runner;
pub mod transport;

// Re-export commonly used types for tests
pub use common::{Error, ErrorKind, Result};
pub use model::{ApiConfig, Environment, RequestDescriptor, RuntimeState};
