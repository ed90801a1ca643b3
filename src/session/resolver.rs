//! Project directory resolution
//!
//! Claude keeps one folder per project under `<claude_dir>/projects/`, named
//! after the project's absolute path with every non-alphanumeric character
//! replaced by `-`.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::Result;

/// Maps a project root to the directory holding its session logs
pub trait ProjectDirResolver {
    /// Resolve the session directory for `project_root`. Must not touch the filesystem.
    fn resolve(&self, project_root: &Path) -> PathBuf;
}

impl<F> ProjectDirResolver for F
where
    F: Fn(&Path) -> PathBuf,
{
    fn resolve(&self, project_root: &Path) -> PathBuf {
        self(project_root)
    }
}

/// Resolver for Claude's on-disk layout
#[derive(Debug, Clone)]
pub struct ClaudeProjectResolver {
    projects_dir: PathBuf,
}

impl ClaudeProjectResolver {
    /// Create a resolver rooted at an explicit `projects/` directory
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    /// Create a resolver from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.projects_dir()?))
    }

    /// The `projects/` directory this resolver is rooted at
    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }
}

impl ProjectDirResolver for ClaudeProjectResolver {
    fn resolve(&self, project_root: &Path) -> PathBuf {
        self.projects_dir.join(encode_project_path(project_root))
    }
}

/// Encode a project root as a directory name.
///
/// Relative roots are made absolute against the current directory first,
/// then `.`, `..` and trailing separators are resolved lexically.
/// Characters outside the BMP become two dashes, one per UTF-16 unit.
pub fn encode_project_path(project_root: &Path) -> String {
    let absolute = std::path::absolute(project_root).unwrap_or_else(|_| project_root.to_path_buf());

    let mut encoded = String::new();
    for c in normalize(&absolute).to_string_lossy().chars() {
        if c.is_ascii_alphanumeric() {
            encoded.push(c);
        } else {
            encoded.extend(std::iter::repeat_n('-', c.len_utf16()));
        }
    }
    encoded
}

/// Lexically resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_unix_path() {
        assert_eq!(
            encode_project_path(Path::new("/Users/you/project-a")),
            "-Users-you-project-a"
        );
    }

    #[test]
    fn test_encode_replaces_dots_and_underscores() {
        assert_eq!(
            encode_project_path(Path::new("/home/me/my_app.v2")),
            "-home-me-my-app-v2"
        );
    }

    #[test]
    fn test_encode_non_ascii() {
        assert_eq!(encode_project_path(Path::new("/tmp/café")), "-tmp-caf-");
        assert_eq!(encode_project_path(Path::new("/tmp/🚀")), "-tmp---");
    }

    #[test]
    fn test_encode_trailing_separator() {
        assert_eq!(encode_project_path(Path::new("/work/repo/")), "-work-repo");
        assert_eq!(encode_project_path(Path::new("/work/repo//")), "-work-repo");
    }

    #[test]
    fn test_encode_resolves_dot_components() {
        assert_eq!(encode_project_path(Path::new("/work/sub/../repo")), "-work-repo");
        assert_eq!(encode_project_path(Path::new("/work/./repo")), "-work-repo");
        assert_eq!(encode_project_path(Path::new("/work/a/b/../../repo")), "-work-repo");
    }

    #[test]
    fn test_encode_parent_of_root_stays_at_root() {
        assert_eq!(encode_project_path(Path::new("/../work")), "-work");
        assert_eq!(encode_project_path(Path::new("/")), "-");
    }

    #[test]
    fn test_encode_relative_path_is_absolute() {
        let encoded = encode_project_path(Path::new("relative"));
        assert!(encoded.starts_with('-'));
        assert!(encoded.ends_with("-relative"));
    }

    #[test]
    fn test_resolve_joins_projects_dir() {
        let resolver = ClaudeProjectResolver::new("/home/me/.claude/projects");
        assert_eq!(
            resolver.resolve(Path::new("/work/repo")),
            PathBuf::from("/home/me/.claude/projects/-work-repo")
        );
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            claude_config_dir: Some(PathBuf::from("/srv/claude")),
        };
        let resolver = ClaudeProjectResolver::from_config(&config).unwrap();
        assert_eq!(resolver.projects_dir(), Path::new("/srv/claude/projects"));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |_: &Path| PathBuf::from("/fixed");
        assert_eq!(resolver.resolve(Path::new("/anything")), PathBuf::from("/fixed"));
    }
}
