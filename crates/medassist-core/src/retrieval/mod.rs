//! Knowledge retrieval — answers canned questions against small static
//! knowledge domains.
//!
//! Each domain document is split into overlapping windows, embedded, and
//! held in an in-memory [`VectorIndex`]. A question is embedded, the closest
//! chunks are retrieved, and a chat model answers from them.

pub mod chunker;
pub mod index;
pub mod openai;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::CaseError;

pub use chunker::{split_text, CHUNK_OVERLAP, CHUNK_SIZE};
pub use index::{VectorIndex, TOP_K};
pub use openai::{OpenAiClient, OpenAiConfig};

/// The knowledge domains the workflow can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeDomain {
    Hospital,
    Policy,
}

impl KnowledgeDomain {
    pub const ALL: [KnowledgeDomain; 2] = [KnowledgeDomain::Hospital, KnowledgeDomain::Policy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::Policy => "policy",
        }
    }

    /// File name of the domain document inside a knowledge directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Hospital => "hospital_data.txt",
            Self::Policy => "policy_terms.txt",
        }
    }

    pub fn builtin_document(&self) -> &'static str {
        match self {
            Self::Hospital => {
                "Hospital Pasteur is a Level 1 trauma center in Nice, France. ICU facilities included."
            }
            Self::Policy => "Standard policy covers emergencies with repatriation and escort.",
        }
    }
}

impl std::fmt::Display for KnowledgeDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question answering over a knowledge domain.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn ask(&self, domain: KnowledgeDomain, question: &str) -> Result<String, CaseError>;

    /// Prepare every domain ahead of the first question.
    async fn warm_up(&self) -> Result<(), CaseError> {
        Ok(())
    }
}

/// The model operations retrieval needs: embeddings and a single-shot chat.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CaseError>;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CaseError>;
}

/// Where domain documents come from: built-in text, optionally replaced by
/// files in a knowledge directory.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeSource {
    dir: Option<PathBuf>,
}

impl KnowledgeSource {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()) }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// The document for `domain`. A directory without the domain file falls
    /// back to the built-in text.
    pub fn document(&self, domain: KnowledgeDomain) -> Result<String, CaseError> {
        if let Some(ref dir) = self.dir {
            let path = dir.join(domain.file_name());
            if path.is_file() {
                return std::fs::read_to_string(&path).map_err(|e| {
                    CaseError::RetrievalFailure(format!("failed to read {}: {}", path.display(), e))
                });
            }
        }
        Ok(domain.builtin_document().to_string())
    }
}

const SYSTEM_PROMPT: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n";

fn build_system_prompt(chunks: &[&str]) -> String {
    format!("{}{}", SYSTEM_PROMPT, chunks.join("\n\n"))
}

/// Retrieval-augmented retriever with one lazily built index per domain.
///
/// Indices are built at most once and only read afterwards, so a single
/// retriever can serve concurrent runs.
pub struct RagRetriever {
    model: Arc<dyn LanguageModel>,
    source: KnowledgeSource,
    hospital: OnceCell<VectorIndex>,
    policy: OnceCell<VectorIndex>,
}

impl RagRetriever {
    pub fn new(model: Arc<dyn LanguageModel>, source: KnowledgeSource) -> Self {
        Self {
            model,
            source,
            hospital: OnceCell::new(),
            policy: OnceCell::new(),
        }
    }

    fn cell(&self, domain: KnowledgeDomain) -> &OnceCell<VectorIndex> {
        match domain {
            KnowledgeDomain::Hospital => &self.hospital,
            KnowledgeDomain::Policy => &self.policy,
        }
    }

    pub fn is_ready(&self, domain: KnowledgeDomain) -> bool {
        self.cell(domain).initialized()
    }

    async fn index(&self, domain: KnowledgeDomain) -> Result<&VectorIndex, CaseError> {
        self.cell(domain)
            .get_or_try_init(|| self.build_index(domain))
            .await
    }

    async fn build_index(&self, domain: KnowledgeDomain) -> Result<VectorIndex, CaseError> {
        let document = self.source.document(domain)?;
        let chunks = split_text(&document, CHUNK_SIZE, CHUNK_OVERLAP);
        if chunks.is_empty() {
            return Err(CaseError::RetrievalFailure(format!(
                "knowledge domain '{}' has no content",
                domain
            )));
        }

        let embeddings = self.model.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(CaseError::RetrievalFailure(format!(
                "expected {} embeddings for '{}', got {}",
                chunks.len(),
                domain,
                embeddings.len()
            )));
        }

        info!(
            "[KnowledgeRetriever] Indexed '{}' ({} chunks)",
            domain,
            chunks.len()
        );
        Ok(VectorIndex::new(chunks, embeddings))
    }
}

#[async_trait]
impl KnowledgeRetriever for RagRetriever {
    async fn ask(&self, domain: KnowledgeDomain, question: &str) -> Result<String, CaseError> {
        let index = self.index(domain).await?;

        let query = self
            .model
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CaseError::RetrievalFailure("no embedding for question".to_string()))?;

        let hits = index.search(&query, TOP_K);
        debug!(
            "[KnowledgeRetriever] '{}' matched {} chunks for: {}",
            domain,
            hits.len(),
            question
        );

        let answer = self
            .model
            .complete(&build_system_prompt(&hits), question)
            .await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(CaseError::RetrievalFailure(format!(
                "empty answer from '{}' for: {}",
                domain, question
            )));
        }
        Ok(answer.to_string())
    }

    /// Build every domain index now instead of on first question.
    async fn warm_up(&self) -> Result<(), CaseError> {
        for domain in KnowledgeDomain::ALL {
            self.index(domain).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds by keyword presence; answers with the first context line.
    struct KeywordModel {
        embed_calls: AtomicUsize,
        answer: Option<String>,
    }

    impl KeywordModel {
        fn new() -> Self {
            Self {
                embed_calls: AtomicUsize::new(0),
                answer: None,
            }
        }
    }

    #[async_trait]
    impl LanguageModel for KeywordModel {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CaseError> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.contains("trauma") as u8 as f32,
                        t.contains("repatriation") as u8 as f32,
                        1.0,
                    ]
                })
                .collect())
        }

        async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> Result<String, CaseError> {
            if let Some(ref answer) = self.answer {
                return Ok(answer.clone());
            }
            Ok(system_prompt
                .rsplit("----------------\n")
                .next()
                .unwrap_or("")
                .to_string())
        }
    }

    #[tokio::test]
    async fn test_ask_answers_from_domain_document() {
        let retriever = RagRetriever::new(Arc::new(KeywordModel::new()), KnowledgeSource::builtin());
        let answer = retriever
            .ask(KnowledgeDomain::Hospital, "What care level does Hospital Pasteur provide?")
            .await
            .unwrap();
        assert!(answer.contains("Level 1 trauma center"));

        let answer = retriever
            .ask(KnowledgeDomain::Policy, "Is repatriation with escort covered?")
            .await
            .unwrap();
        assert!(answer.contains("repatriation and escort"));
    }

    #[tokio::test]
    async fn test_index_is_built_once() {
        let model = Arc::new(KeywordModel::new());
        let retriever = RagRetriever::new(model.clone(), KnowledgeSource::builtin());
        assert!(!retriever.is_ready(KnowledgeDomain::Hospital));

        retriever.warm_up().await.unwrap();
        assert!(retriever.is_ready(KnowledgeDomain::Hospital));
        assert!(retriever.is_ready(KnowledgeDomain::Policy));
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 2);

        retriever.ask(KnowledgeDomain::Hospital, "ICU?").await.unwrap();
        retriever.ask(KnowledgeDomain::Hospital, "ICU?").await.unwrap();
        // one embedding call per question, none for re-indexing
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_answer_is_retrieval_failure() {
        let model = KeywordModel {
            embed_calls: AtomicUsize::new(0),
            answer: Some("   ".to_string()),
        };
        let retriever = RagRetriever::new(Arc::new(model), KnowledgeSource::builtin());
        let result = retriever.ask(KnowledgeDomain::Policy, "Covered?").await;
        assert!(matches!(result, Err(CaseError::RetrievalFailure(_))));
    }

    #[test]
    fn test_knowledge_dir_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("policy_terms.txt"), "Gold policy covers air ambulance.").unwrap();

        let source = KnowledgeSource::from_dir(dir.path());
        assert_eq!(
            source.document(KnowledgeDomain::Policy).unwrap(),
            "Gold policy covers air ambulance."
        );
        assert_eq!(
            source.document(KnowledgeDomain::Hospital).unwrap(),
            KnowledgeDomain::Hospital.builtin_document()
        );
    }

    #[test]
    fn test_domain_serde() {
        let domain: KnowledgeDomain = serde_json::from_str("\"policy\"").unwrap();
        assert_eq!(domain, KnowledgeDomain::Policy);
        assert_eq!(serde_json::to_string(&KnowledgeDomain::Hospital).unwrap(), "\"hospital\"");
    }
}
