//! MedAssist CLI library — command implementations shared by the binary and
//! the integration tests.

pub mod commands;
