use serde::{Deserialize, Serialize};

/// Emotion preset controlling the prosody of synthesized speech.
///
/// Deserialization is lenient: an unknown tag becomes `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Calm,
    Stress,
    Urgent,
    #[default]
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Stress => "stress",
            Self::Urgent => "urgent",
            Self::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "calm" => Self::Calm,
            "stress" => Self::Stress,
            "urgent" => Self::Urgent,
            _ => Self::Neutral,
        }
    }

    /// Fixed emotion → prosody table.
    pub fn prosody(&self) -> Prosody {
        match self {
            Self::Calm => Prosody::new(SpeechRate::Medium, 2),
            Self::Stress => Prosody::new(SpeechRate::Slow, -2),
            Self::Urgent => Prosody::new(SpeechRate::Fast, 0),
            Self::Neutral => Prosody::default(),
        }
    }
}

impl From<String> for Emotion {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Emotion> for String {
    fn from(e: Emotion) -> Self {
        e.as_str().to_string()
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechRate {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl SpeechRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

/// Rate and pitch offset (in semitones) applied to an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Prosody {
    pub rate: SpeechRate,
    pub pitch_semitones: i8,
}

impl Prosody {
    pub fn new(rate: SpeechRate, pitch_semitones: i8) -> Self {
        Self {
            rate,
            pitch_semitones,
        }
    }

    /// SSML pitch attribute, e.g. `+2st`, `-2st`, `+0st`.
    pub fn pitch_attr(&self) -> String {
        format!("{:+}st", self.pitch_semitones)
    }
}
