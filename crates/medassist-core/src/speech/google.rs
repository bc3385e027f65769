//! Google Cloud Text-to-Speech client — invokes the REST API directly.
//!
//! Authentication uses a service-account key: a signed RS256 JWT is exchanged
//! for an OAuth access token, which is cached until shortly before expiry.
//!
//! POST https://texttospeech.googleapis.com/v1/text:synthesize
//! Headers:
//!   Authorization: Bearer {access_token}
//!   content-type: application/json

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{AudioEncoding, SpeechService, VoiceConfig};
use crate::error::CaseError;

const SYNTHESIZE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Output sample rate requested from the service.
pub const SAMPLE_RATE_HZ: u32 = 24_000;

/// Refresh tokens this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service-account JSON key that the client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse the credential blob. Any problem is a `MissingCredential`.
    pub fn from_json(json: &str) -> Result<Self, CaseError> {
        let key: Self = serde_json::from_str(json).map_err(|e| {
            CaseError::MissingCredential(format!("malformed service-account JSON: {}", e))
        })?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(CaseError::MissingCredential(
                "service-account JSON lacks client_email or private_key".to_string(),
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody<'a> {
    input: SynthesisInput<'a>,
    voice: &'a VoiceConfig,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    sample_rate_hertz: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Speech service backed by Google Cloud Text-to-Speech.
pub struct GoogleTtsClient {
    client: reqwest::Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleTtsClient {
    /// Build a client from the raw service-account JSON. The private key is
    /// parsed eagerly so a bad credential fails at startup.
    pub fn from_credentials_json(json: &str) -> Result<Self, CaseError> {
        let key = ServiceAccountKey::from_json(json)?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            CaseError::MissingCredential(format!("invalid service-account private key: {}", e))
        })?;

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            key,
            signing_key,
            token: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    async fn access_token(&self) -> Result<String, CaseError> {
        let mut cached = self.token.lock().await;
        if let Some(ref token) = *cached {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.token.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| CaseError::SynthesisFailure(format!("failed to sign token request: {}", e)))?;

        tracing::info!("[GoogleTts] Requesting access token for {}", self.key.client_email);

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CaseError::SynthesisFailure(format!("token request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CaseError::SynthesisFailure(format!("failed to read token response: {}", e)))?;
        if !status.is_success() {
            return Err(CaseError::SynthesisFailure(format!(
                "token endpoint returned {}: {}",
                status, text
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| CaseError::SynthesisFailure(format!("failed to parse token response: {}", e)))?;

        let token = parsed.access_token.clone();
        *cached = Some(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        });
        Ok(token)
    }
}

#[async_trait]
impl SpeechService for GoogleTtsClient {
    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceConfig,
        encoding: AudioEncoding,
    ) -> Result<Vec<u8>, CaseError> {
        let token = self.access_token().await?;

        let body = SynthesizeBody {
            input: SynthesisInput { ssml },
            voice,
            audio_config: AudioConfig {
                audio_encoding: encoding.as_str(),
                sample_rate_hertz: SAMPLE_RATE_HZ,
            },
        };

        tracing::info!(
            "[GoogleTts] Synthesizing {} chars (voice: {})",
            ssml.len(),
            voice.name
        );

        let response = self
            .client
            .post(SYNTHESIZE_URL)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CaseError::SynthesisFailure(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CaseError::SynthesisFailure(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(CaseError::SynthesisFailure(format!(
                "API returned {}: {}",
                status, text
            )));
        }

        let parsed: SynthesizeResponse = serde_json::from_str(&text)
            .map_err(|e| CaseError::SynthesisFailure(format!("failed to parse response JSON: {}", e)))?;

        base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| CaseError::SynthesisFailure(format!("invalid audioContent: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_missing_credential() {
        let result = ServiceAccountKey::from_json(r#"{"client_email": "", "private_key": ""}"#);
        assert!(matches!(result, Err(CaseError::MissingCredential(_))));

        let result = ServiceAccountKey::from_json("not json");
        assert!(matches!(result, Err(CaseError::MissingCredential(_))));
    }

    #[test]
    fn test_key_defaults_and_redaction() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "tts@example.iam.gserviceaccount.com", "private_key": "secret"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        let debug = format!("{:?}", key);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_invalid_private_key_fails_at_startup() {
        let result = GoogleTtsClient::from_credentials_json(
            r#"{"client_email": "tts@example.iam.gserviceaccount.com", "private_key": "not a pem"}"#,
        );
        assert!(matches!(result, Err(CaseError::MissingCredential(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let voice = VoiceConfig::french();
        let body = SynthesizeBody {
            input: SynthesisInput { ssml: "<speak>x</speak>" },
            voice: &voice,
            audio_config: AudioConfig {
                audio_encoding: AudioEncoding::Linear16.as_str(),
                sample_rate_hertz: SAMPLE_RATE_HZ,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"]["ssml"], "<speak>x</speak>");
        assert_eq!(json["voice"]["languageCode"], "fr-FR");
        assert_eq!(json["voice"]["name"], "fr-FR-Wavenet-A");
        assert_eq!(json["audioConfig"]["audioEncoding"], "LINEAR16");
        assert_eq!(json["audioConfig"]["sampleRateHertz"], 24_000);
    }
}
