//! Diagnostics emitted while checking a session
//!
//! The validator never logs directly; it reports events to an injected sink.

use std::path::PathBuf;

use tracing::debug;

use super::SessionId;

/// An event observed during a session check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The session log does not exist
    SessionFileMissing { path: PathBuf },
    /// A log line is not valid JSON
    MalformedLine { line: usize, error: String },
    /// Final outcome of the check
    Verdict {
        session_id: SessionId,
        resumable: bool,
    },
}

/// Receiver of [`Diagnostic`] events
pub trait Diagnostics {
    fn record(&self, event: &Diagnostic);
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
    fn record(&self, event: &Diagnostic) {
        (**self).record(event)
    }
}

/// Forwards events to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: &Diagnostic) {
        match event {
            Diagnostic::SessionFileMissing { path } => {
                debug!(path = %path.display(), "Session log {} does not exist", path.display());
            }
            Diagnostic::MalformedLine { line, error } => {
                debug!(line, %error, "Malformed JSON at line {}", line);
            }
            Diagnostic::Verdict {
                session_id,
                resumable,
            } => {
                let verdict = if *resumable { "valid" } else { "invalid" };
                debug!(%session_id, resumable, "Session {}: {}", session_id, verdict);
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn record(&self, _event: &Diagnostic) {}
}
