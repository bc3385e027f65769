//! Speech rendering — turns an utterance into a standalone audio artifact.
//!
//! ```text
//! utterance + emotion ──► SSML (prosody) ──► SpeechService ──► <agent>_<id>.wav
//!                                                                   │
//!                          AmbientLibrary (context) ──► overlay ◄───┘
//! ```
//!
//! The `SpeechService` trait is the boundary to the external engine
//! (Google Cloud Text-to-Speech in production, see [`google`]).

pub mod ambient;
pub mod google;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::PcmAudio;
use crate::error::CaseError;
use crate::models::{AmbientContext, Emotion, Prosody};

pub use ambient::{AmbientLibrary, AMBIENT_GAIN_DB};
pub use google::GoogleTtsClient;

/// Audio encodings requested from the speech service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioEncoding {
    /// 16-bit little-endian PCM in a WAV container.
    #[default]
    Linear16,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear16 => "LINEAR16",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Linear16 => "wav",
        }
    }
}

/// Voice configuration key sent to the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub language_code: String,
    pub name: String,
}

impl VoiceConfig {
    pub fn french() -> Self {
        Self {
            language_code: "fr-FR".to_string(),
            name: "fr-FR-Wavenet-A".to_string(),
        }
    }

    pub fn english() -> Self {
        Self {
            language_code: "en-GB".to_string(),
            name: "en-GB-Wavenet-A".to_string(),
        }
    }

    /// `fr` selects the French voice; anything else falls back to English.
    pub fn for_language(language: &str) -> Self {
        if language.trim().eq_ignore_ascii_case("fr") {
            Self::french()
        } else {
            Self::english()
        }
    }
}

/// Contract of the external speech engine: markup in, encoded audio out.
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceConfig,
        encoding: AudioEncoding,
    ) -> Result<Vec<u8>, CaseError>;
}

/// Reference to a rendered audio file in the run workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    pub path: PathBuf,
}

impl AudioArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Everything needed to render one utterance.
#[derive(Debug, Clone)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    pub agent_id: &'a str,
    pub emotion: Emotion,
    pub context: AmbientContext,
    pub language: &'a str,
    /// Directory the artifact is written into (the run workspace).
    pub output_dir: &'a Path,
}

/// Wrap an utterance in SSML carrying the emotion's prosody.
pub fn build_ssml(text: &str, prosody: &Prosody) -> String {
    format!(
        "<speak><prosody rate='{}' pitch='{}'>{}</prosody></speak>",
        prosody.rate.as_str(),
        prosody.pitch_attr(),
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders utterances to audio files, mixing in ambient beds when available.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    service: Arc<dyn SpeechService>,
    ambient: AmbientLibrary,
    encoding: AudioEncoding,
}

impl SpeechSynthesizer {
    pub fn new(service: Arc<dyn SpeechService>, ambient: AmbientLibrary) -> Self {
        Self {
            service,
            ambient,
            encoding: AudioEncoding::default(),
        }
    }

    pub fn ambient(&self) -> &AmbientLibrary {
        &self.ambient
    }

    /// Render one utterance. Service failures are fatal; ambient problems
    /// only downgrade the output to voice-only.
    pub async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<AudioArtifact, CaseError> {
        let prosody = request.emotion.prosody();
        let ssml = build_ssml(request.text, &prosody);
        let voice = VoiceConfig::for_language(request.language);

        debug!(
            "[SpeechSynthesizer] {} → voice={} rate={} pitch={} context={}",
            request.agent_id,
            voice.name,
            prosody.rate.as_str(),
            prosody.pitch_attr(),
            request.context
        );

        let bytes = self.service.synthesize(&ssml, &voice, self.encoding).await?;
        if bytes.is_empty() {
            return Err(CaseError::SynthesisFailure(format!(
                "speech service returned no audio for {}",
                request.agent_id
            )));
        }

        let path = write_unique(request.output_dir, request.agent_id, self.encoding.extension(), &bytes)?;
        info!(
            "[SpeechSynthesizer] Wrote {} ({} bytes)",
            path.display(),
            bytes.len()
        );

        self.mix_ambient(&path, &bytes, request.context)?;

        Ok(AudioArtifact::new(path))
    }

    fn mix_ambient(&self, path: &Path, voice_bytes: &[u8], context: AmbientContext) -> Result<(), CaseError> {
        let bed = match self.ambient.load(context) {
            Ok(Some(bed)) => bed,
            Ok(None) => return Ok(()),
            Err(e) => {
                debug!("[SpeechSynthesizer] Skipping ambient mix: {}", e);
                return Ok(());
            }
        };

        let voice = PcmAudio::from_wav_bytes(voice_bytes).map_err(|e| {
            CaseError::SynthesisFailure(format!("speech service returned undecodable audio: {}", e))
        })?;

        match PcmAudio::overlay(bed, &voice) {
            Ok(mixed) => {
                mixed.write_wav(path)?;
                info!("[SpeechSynthesizer] Mixed {} ambient into {}", context, path.display());
            }
            Err(e) => warn!("[SpeechSynthesizer] Ambient mix failed, keeping voice only: {}", e),
        }
        Ok(())
    }
}

/// Create `<agent>_<random>.<ext>` exclusively, retrying on a name clash so an
/// existing artifact is never overwritten.
fn write_unique(dir: &Path, agent_id: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf, CaseError> {
    const MAX_ATTEMPTS: usize = 8;

    for _ in 0..MAX_ATTEMPTS {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let path = dir.join(format!("{}_{}.{}", agent_id, &suffix[..12], extension));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(CaseError::Artifact(format!(
        "could not allocate a unique audio file name for {}",
        agent_id
    )))
}
