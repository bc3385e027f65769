//! OpenAI-compatible language model client — embeddings and chat completions
//! over plain HTTP.
//!
//! POST {base_url}/embeddings
//! POST {base_url}/chat/completions
//! Headers:
//!   Authorization: Bearer {api_key}
//!   content-type: application/json

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::LanguageModel;
use crate::error::CaseError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Connection settings for the OpenAI-compatible backend.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "[REDACTED]" })
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

/// HTTP client for the embeddings and chat-completions endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value, CaseError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CaseError::RetrievalFailure(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| CaseError::RetrievalFailure(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(CaseError::RetrievalFailure(format!(
                "API returned {}: {}",
                status, response_text
            )));
        }

        serde_json::from_str(&response_text)
            .map_err(|e| CaseError::RetrievalFailure(format!("Failed to parse response JSON: {}", e)))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CaseError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url("embeddings");
        let body = serde_json::json!({
            "model": self.config.embedding_model,
            "input": texts,
        });

        tracing::debug!(
            "[OpenAi] Embedding {} texts (model: {})",
            texts.len(),
            self.config.embedding_model
        );

        let json = self.post_json(&url, &body).await?;
        parse_embeddings(&json, texts.len())
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CaseError> {
        let url = self.url("chat/completions");
        let body = serde_json::json!({
            "model": self.config.chat_model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        tracing::info!(
            "[OpenAi] Calling chat completions: {} (model: {})",
            url,
            self.config.chat_model
        );

        let json = self.post_json(&url, &body).await?;

        // OpenAI-compatible response format
        let content = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();
        Ok(content)
    }
}

fn parse_embeddings(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>, CaseError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| CaseError::RetrievalFailure("embedding response has no data".to_string()))?;

    let mut rows: Vec<(u64, Vec<f32>)> = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .unwrap_or(position as u64);
        let vector = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| CaseError::RetrievalFailure("embedding item has no vector".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();
        rows.push((index, vector));
    }
    rows.sort_by_key(|(index, _)| *index);

    if rows.len() != expected {
        return Err(CaseError::RetrievalFailure(format!(
            "expected {} embeddings, got {}",
            expected,
            rows.len()
        )));
    }
    Ok(rows.into_iter().map(|(_, v)| v).collect())
}
