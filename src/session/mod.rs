//! Session module
//!
//! Provides the resumability check for recorded sessions:
//! - `SessionRecord` - Typed view of one session log line
//! - `ProjectDirResolver` - Where a project's session logs live
//! - `SessionValidator` - Scans a session log for a resume point

mod diagnostics;
mod resolver;
mod types;
mod validator;

pub use diagnostics::*;
pub use resolver::*;
pub use types::*;
pub use validator::*;
