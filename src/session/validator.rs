//! Session validator - decides whether a recorded session can be resumed
//!
//! A session is resumable when its log holds at least one user/assistant
//! message or a summary checkpoint with a leaf identifier.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::session::{
    ClaudeProjectResolver, Diagnostic, Diagnostics, ProjectDirResolver, SessionCheck, SessionId,
    SessionRecord, TracingDiagnostics,
};

/// Checks session logs for a resume point
#[derive(Debug, Clone)]
pub struct SessionValidator<R, D = TracingDiagnostics> {
    resolver: R,
    diagnostics: D,
}

impl SessionValidator<ClaudeProjectResolver> {
    /// Validator for Claude's layout, logging through `tracing`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ClaudeProjectResolver::from_config(config)?,
            TracingDiagnostics,
        ))
    }
}

impl<R, D> SessionValidator<R, D>
where
    R: ProjectDirResolver,
    D: Diagnostics,
{
    /// Create a validator from a resolver and a diagnostics sink
    pub fn new(resolver: R, diagnostics: D) -> Self {
        Self {
            resolver,
            diagnostics,
        }
    }

    /// Path of the log file for a session of the given project
    pub fn session_file(&self, session_id: &SessionId, project_root: &Path) -> PathBuf {
        self.resolver
            .resolve(project_root)
            .join(session_id.log_file_name())
    }

    /// Whether the session can be resumed.
    ///
    /// A missing log or one without a resume point yields `Ok(false)`. Only a
    /// log that exists but cannot be read is an error.
    pub fn is_resumable(&self, session_id: &SessionId, project_root: &Path) -> Result<bool> {
        Ok(self.check(session_id, project_root)?.is_resumable())
    }

    /// Check a session and report where its resume point is
    #[instrument(skip_all, fields(session_id = %session_id, project_root = %project_root.display()))]
    pub fn check(&self, session_id: &SessionId, project_root: &Path) -> Result<SessionCheck> {
        let path = self.session_file(session_id, project_root);

        let mut check = SessionCheck {
            session_id: session_id.clone(),
            path,
            found: false,
            resume_point: None,
            malformed_lines: Vec::new(),
        };

        let Some(content) = self.read_log(&check.path)? else {
            return Ok(check);
        };
        check.found = true;

        for (index, line) in content.split('\n').enumerate() {
            if is_blank(line) {
                continue;
            }

            let line_number = index + 1;
            match SessionRecord::parse(line) {
                Ok(record) => {
                    if let Some(point) = record.resume_point(line_number) {
                        check.resume_point = Some(point);
                        break;
                    }
                }
                Err(e) => {
                    self.diagnostics.record(&Diagnostic::MalformedLine {
                        line: line_number,
                        error: e.to_string(),
                    });
                    check.malformed_lines.push(line_number);
                }
            }
        }

        self.diagnostics.record(&Diagnostic::Verdict {
            session_id: session_id.clone(),
            resumable: check.is_resumable(),
        });

        Ok(check)
    }

    /// Read the whole log, or `None` if it does not exist
    fn read_log(&self, path: &Path) -> Result<Option<String>> {
        let missing = || {
            self.diagnostics.record(&Diagnostic::SessionFileMissing {
                path: path.to_path_buf(),
            });
        };

        if !path.exists() {
            missing();
            return Ok(None);
        }

        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            // Removed between the existence check and the read
            Err(e) if e.kind() == ErrorKind::NotFound => {
                missing();
                Ok(None)
            }
            Err(source) => Err(SessionError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into()),
        }
    }
}

/// Whitespace-only lines, counting a byte-order mark as whitespace
fn is_blank(line: &str) -> bool {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::session::{ResumePoint, Role, SilentDiagnostics};

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Diagnostic>>);

    impl Diagnostics for Recorder {
        fn record(&self, event: &Diagnostic) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    impl Recorder {
        fn events(&self) -> Vec<Diagnostic> {
            self.0.borrow().clone()
        }
    }

    fn fixed_dir(dir: PathBuf) -> impl Fn(&Path) -> PathBuf {
        move |_: &Path| dir.clone()
    }

    fn write_log(dir: &TempDir, id: &str, content: &str) -> SessionId {
        std::fs::write(dir.path().join(format!("{id}.jsonl")), content).unwrap();
        SessionId::new(id).unwrap()
    }

    #[test]
    fn test_session_file_path() {
        let validator = SessionValidator::new(
            ClaudeProjectResolver::new("/home/me/.claude/projects"),
            SilentDiagnostics,
        );
        let id = SessionId::new("abc").unwrap();
        assert_eq!(
            validator.session_file(&id, Path::new("/work/repo")),
            PathBuf::from("/home/me/.claude/projects/-work-repo/abc.jsonl")
        );
    }

    #[test]
    fn test_missing_file_reports_once() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), &recorder);
        let id = SessionId::new("nope").unwrap();

        let check = validator.check(&id, Path::new("/p")).unwrap();
        assert!(!check.found);
        assert!(!check.is_resumable());
        assert_eq!(
            recorder.events(),
            vec![Diagnostic::SessionFileMissing {
                path: dir.path().join("nope.jsonl")
            }]
        );
    }

    #[test]
    fn test_stops_at_first_match() {
        let dir = TempDir::new().unwrap();
        let id = write_log(
            &dir,
            "s1",
            "{\"type\":\"file-history-snapshot\"}\n\
             {\"type\":\"summary\",\"leafUuid\":\"leaf-1\"}\n\
             {broken\n",
        );
        let recorder = Recorder::default();
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), &recorder);

        let check = validator.check(&id, Path::new("/p")).unwrap();
        assert_eq!(
            check.resume_point,
            Some(ResumePoint::Summary {
                line: 2,
                leaf_uuid: "leaf-1".to_string()
            })
        );
        assert!(check.malformed_lines.is_empty());
        assert_eq!(
            recorder.events(),
            vec![Diagnostic::Verdict {
                session_id: id,
                resumable: true
            }]
        );
    }

    #[test]
    fn test_line_numbers_count_blank_lines() {
        let dir = TempDir::new().unwrap();
        let id = write_log(&dir, "s2", "\n   \n{oops\n{\"message\":{\"role\":\"assistant\"}}\n");
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), SilentDiagnostics);

        let check = validator.check(&id, Path::new("/p")).unwrap();
        assert_eq!(check.malformed_lines, vec![3]);
        assert_eq!(
            check.resume_point,
            Some(ResumePoint::Conversation {
                line: 4,
                role: Role::Assistant
            })
        );
    }

    #[test]
    fn test_bom_only_line_is_blank() {
        let dir = TempDir::new().unwrap();
        let id = write_log(&dir, "bom", "\u{feff}\n \u{feff}\t\n");
        let recorder = Recorder::default();
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), &recorder);

        let check = validator.check(&id, Path::new("/p")).unwrap();
        assert!(check.malformed_lines.is_empty());
        assert_eq!(
            recorder.events(),
            vec![Diagnostic::Verdict {
                session_id: id,
                resumable: false
            }]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let dir = TempDir::new().unwrap();
        let id = write_log(&dir, "s3", "{\"type\":\"x\"}\r\n{\"message\":{\"role\":\"user\"}}\r\n");
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), SilentDiagnostics);

        assert!(validator.is_resumable(&id, Path::new("/p")).unwrap());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"{\"message\":{\"role\":\"user\",\"content\":\"caf\xc3\"}}");
        std::fs::write(dir.path().join("s4.jsonl"), bytes).unwrap();
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), SilentDiagnostics);

        let check = validator
            .check(&SessionId::new("s4").unwrap(), Path::new("/p"))
            .unwrap();
        assert_eq!(check.malformed_lines, vec![1]);
        assert!(check.is_resumable());
    }

    #[test]
    fn test_unreadable_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory named like the log exists but cannot be read as a file
        std::fs::create_dir(dir.path().join("s5.jsonl")).unwrap();
        let recorder = Recorder::default();
        let validator = SessionValidator::new(fixed_dir(dir.path().to_path_buf()), &recorder);

        let err = validator
            .is_resumable(&SessionId::new("s5").unwrap(), Path::new("/p"))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::Read { .. })
        ));
        assert!(recorder.events().is_empty());
    }
}
