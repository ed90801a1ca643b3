//! Resume Guard - checks whether a recorded Claude session can be resumed
//!
//! A session log (`<session-id>.jsonl` in the project's session directory) is
//! resumable when it holds at least one user/assistant message or a summary
//! checkpoint that references a leaf message.
//!
//! # Modules
//!
//! - [`session`] - Session records, project directory resolution and the validator
//! - [`config`] - Configuration and the location of Claude's data directory
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod session;

use std::path::Path;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{
    ClaudeProjectResolver, Diagnostic, Diagnostics, ProjectDirResolver, ResumePoint, SessionCheck,
    SessionId, SessionRecord, SessionValidator, SilentDiagnostics, TracingDiagnostics,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check a session against Claude's default layout using the loaded configuration
pub fn is_session_resumable(session_id: &str, project_root: impl AsRef<Path>) -> Result<bool> {
    let session_id = SessionId::new(session_id)?;
    let config = Config::load()?;
    SessionValidator::from_config(&config)?.is_resumable(&session_id, project_root.as_ref())
}
