//! MedAssist Core — case workflow engine for the Global MedAssist simulation.
//!
//! A patient case is driven through a fixed chain of agents. Each agent
//! produces one utterance, which is rendered to speech with an emotion-driven
//! prosody profile and an optional ambient bed. The accumulated transcript and
//! audio trail are then assembled into a PDF transcript, a combined audio
//! track and a zip bundle.
//!
//! The crate has **no HTTP framework dependency** by default, so it can be
//! driven from the CLI (`medassist-cli`) or the HTTP server
//! (`medassist-server`).
//!
//! # Feature Flags
//!
//! - `axum` — Enables `IntoResponse` impl on `CaseError` for use in axum handlers.

pub mod artifacts;
pub mod audio;
pub mod config;
pub mod error;
pub mod models;
pub mod retrieval;
pub mod runner;
pub mod speech;
pub mod workflow;

// Convenience re-exports
pub use config::AppConfig;
pub use error::CaseError;
pub use runner::{CaseOutcome, CaseRunner};
