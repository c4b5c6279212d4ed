//! Corpus store: the indexed documents both rankers query
//!
//! The retrieval core only sees the [`CorpusStore`] trait: one lexical
//! capability ("top-N matches for text, language, filter") and one vector
//! capability ("top-N neighbors for embedding, filter"). [`DocumentStore`]
//! is the in-memory implementation backed by tantivy and an HNSW graph.

mod keyword_index;
mod store;
mod vector_index;

pub use keyword_index::{KeywordIndex, KeywordIndexError, TermMode};
pub use store::DocumentStore;
pub use vector_index::{cosine_similarity, VectorIndex, VectorIndexError};

use crate::retrieval::{Language, MetadataFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

/// The unit of retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Language the document is written in, reported back as `doc_lang`
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(default)]
    pub file_name: String,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: None,
            lang: None,
            metadata: empty_object(),
            file_name: String::new(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Keyword index error: {0}")]
    Keyword(#[from] KeywordIndexError),

    #[error("Vector index error: {0}")]
    Vector(#[from] VectorIndexError),

    #[error("Store key {0} has no document")]
    DanglingKey(usize),
}

/// Lexical matches for one language variant
#[derive(Debug, Clone, Default)]
pub struct LexicalMatches {
    /// Printable form of the executed query, e.g. `'royalti' & 'song'`
    pub query: String,
    /// Matching documents passing the filter, best first, at most `limit`
    pub hits: Vec<(String, f32)>,
    /// Matches passing the filter before truncation
    pub total: usize,
}

/// The two ranked-query capabilities the retrieval core consumes
pub trait CorpusStore: Send + Sync {
    /// Dimension every stored embedding has
    fn dimension(&self) -> usize;

    /// Number of searchable documents
    fn document_count(&self) -> usize;

    /// Look up a document by id
    fn document(&self, id: &str) -> Option<&Document>;

    /// Top-`limit` lexical matches for `text` in `lang` among documents
    /// passing `filter`
    fn lexical_search(
        &self,
        text: &str,
        lang: Language,
        mode: TermMode,
        filter: &MetadataFilter,
        limit: usize,
    ) -> Result<LexicalMatches, StoreError>;

    /// Top-`limit` cosine neighbors of `embedding` among documents passing
    /// `filter`, as (id, similarity) best first
    fn nearest_neighbors(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        limit: usize,
    ) -> Result<Vec<(String, f32)>, StoreError>;
}

/// Order scored ids by score descending, then id ascending
pub fn sort_scored(hits: &mut [(String, f32)]) {
    hits.sort_by(|a, b| compare_scored(&a.0, a.1, &b.0, b.1));
}

pub(crate) fn compare_scored(a_id: &str, a: f32, b_id: &str, b: f32) -> Ordering {
    b.total_cmp(&a).then_with(|| a_id.cmp(b_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_scored_tie_breaks_by_id() {
        let mut hits = vec![
            ("b".to_string(), 0.5),
            ("c".to_string(), 0.9),
            ("a".to_string(), 0.5),
        ];
        sort_scored(&mut hits);
        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_document_deserialize_defaults() {
        let doc: Document = serde_json::from_value(json!({
            "id": "doc-1",
            "content": "hello"
        }))
        .unwrap();
        assert_eq!(doc.embedding, None);
        assert_eq!(doc.metadata, json!({}));
        assert_eq!(doc.file_name, "");
    }
}
