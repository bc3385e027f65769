pub mod ambient;
pub mod emotion;
pub mod patient;

pub use ambient::AmbientContext;
pub use emotion::{Emotion, Prosody, SpeechRate};
pub use patient::{PatientCase, PatientDirectory, Urgency};
