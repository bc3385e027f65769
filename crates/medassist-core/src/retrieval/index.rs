/// Number of chunks handed to the chat model per question.
pub const TOP_K: usize = 4;

/// In-memory vector index over the chunks of one knowledge domain.
///
/// Built once, then only read.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    text: String,
    embedding: Vec<f32>,
}

impl VectorIndex {
    /// Pair chunks with their embeddings. Extra items on either side are ignored.
    pub fn new(chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Self {
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexEntry { text, embedding })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `k` chunk texts, most similar first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<&str> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].text.as_str())
            .collect()
    }
}

/// Cosine similarity; zero when either vector has no magnitude or the
/// dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity_and_limits() {
        let index = VectorIndex::new(
            vec!["icu".into(), "escort".into(), "trauma".into(), "flight".into(), "nurse".into()],
            vec![
                vec![0.9, 0.1],
                vec![0.0, 1.0],
                vec![1.0, 0.0],
                vec![0.5, 0.5],
                vec![0.2, 0.8],
            ],
        );
        let hits = index.search(&[1.0, 0.0], TOP_K);
        assert_eq!(hits, vec!["trauma", "icu", "flight", "nurse"]);
    }

    #[test]
    fn test_search_small_index() {
        let index = VectorIndex::new(vec!["only".into()], vec![vec![1.0]]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.search(&[1.0], TOP_K), vec!["only"]);
    }
}
