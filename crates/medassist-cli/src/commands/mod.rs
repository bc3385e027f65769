//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and drives the
//! medassist-core engine directly.

pub mod patients;
pub mod run;
pub mod server;
pub mod workflow;

/// Shorten `s` to at most `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
