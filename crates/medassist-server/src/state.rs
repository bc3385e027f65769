use std::sync::Arc;

use medassist_core::CaseRunner;

/// Shared state behind every handler.
pub struct AppStateInner {
    pub runner: CaseRunner,
}

impl AppStateInner {
    pub fn new(runner: CaseRunner) -> Self {
        Self { runner }
    }
}

pub type AppState = Arc<AppStateInner>;
