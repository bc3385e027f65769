use serde::{Deserialize, Serialize};

/// Background audio bed category overlaid onto synthesized speech.
///
/// Deserialization is lenient: an unknown tag becomes `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AmbientContext {
    Hospital,
    Airport,
    #[default]
    None,
}

impl AmbientContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::Airport => "airport",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hospital" => Self::Hospital,
            "airport" => Self::Airport,
            _ => Self::None,
        }
    }
}

impl From<String> for AmbientContext {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<AmbientContext> for String {
    fn from(c: AmbientContext) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for AmbientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
