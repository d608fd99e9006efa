//! Entities of the task tracker and their normalization declarations.
//!
//! Normalized properties are in the store's canonical encoding (array literal
//! text for tags, `"t"`/`"f"` for flags, hashed passwords). The `html` scheme
//! turns a normalized model back into display-safe values.

mod task;
mod user;

pub use task::{Task, TaskLimits};
pub use user::{Credentials, User, UserLimits};

/// Name of the scheme that escapes text for HTML output.
pub const HTML: &str = "html";
