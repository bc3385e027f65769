//! Ambient beds — optional background recordings keyed by context.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::audio::{self, AudioError, PcmAudio};
use crate::models::AmbientContext;

/// Attenuation applied to an ambient bed before the voice is overlaid.
pub const AMBIENT_GAIN_DB: f32 = -12.0;

/// Maps ambient contexts to bed files. Files are resolved by presence-check
/// at synthesis time; a missing file is not an error.
#[derive(Debug, Clone, Default)]
pub struct AmbientLibrary {
    beds: HashMap<AmbientContext, PathBuf>,
}

impl AmbientLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard layout: `ambient_hospital.mp3` and `ambient_airport.mp3`
    /// inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new()
            .with_bed(AmbientContext::Hospital, dir.join("ambient_hospital.mp3"))
            .with_bed(AmbientContext::Airport, dir.join("ambient_airport.mp3"))
    }

    pub fn with_bed(mut self, context: AmbientContext, path: impl Into<PathBuf>) -> Self {
        if context != AmbientContext::None {
            self.beds.insert(context, path.into());
        }
        self
    }

    /// Configured bed path for a context, if any.
    pub fn bed_path(&self, context: AmbientContext) -> Option<&Path> {
        self.beds.get(&context).map(|p| p.as_path())
    }

    /// Load the bed for `context`, attenuated by [`AMBIENT_GAIN_DB`].
    ///
    /// Returns `Ok(None)` when the context has no bed configured, and
    /// `AmbientUnavailable` when the configured file is missing or unreadable.
    pub fn load(&self, context: AmbientContext) -> Result<Option<PcmAudio>, AudioError> {
        let Some(path) = self.bed_path(context) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Err(AudioError::AmbientUnavailable(format!(
                "{} not found",
                path.display()
            )));
        }
        let mut bed = audio::decode_file(path)
            .map_err(|e| AudioError::AmbientUnavailable(format!("{}: {}", path.display(), e)))?;
        bed.apply_gain_db(AMBIENT_GAIN_DB);
        Ok(Some(bed))
    }
}
