//! In-memory corpus store

use super::{
    cosine_similarity, sort_scored, CorpusStore, Document, KeywordIndex, LexicalMatches,
    StoreError, TermMode, VectorIndex, VectorIndexError,
};
use crate::config::IndexConfig;
use crate::error::{HybridError, Result};
use crate::retrieval::{Language, MetadataFilter};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Documents plus their lexical and vector indexes.
///
/// Documents become visible to both capabilities together on
/// [`commit`](Self::commit), so the two rankers always see the same corpus.
pub struct DocumentStore {
    documents: Vec<Document>,
    keys: HashMap<String, usize>,
    keyword_index: KeywordIndex,
    vector_index: VectorIndex,
    committed: usize,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let keyword_index = KeywordIndex::new(config.writer_memory_bytes)
            .map_err(|e| HybridError::Index(e.to_string()))?;
        let vector_index = VectorIndex::new(
            config.vector_dim,
            config.hnsw_m,
            config.hnsw_ef_construction,
            config.hnsw_ef_search,
            config.max_elements,
        );

        Ok(Self {
            documents: Vec::new(),
            keys: HashMap::new(),
            keyword_index,
            vector_index,
            committed: 0,
        })
    }

    /// Load a JSON-lines corpus (one [`Document`] per line) and commit it
    pub fn from_jsonl(path: &Path, config: &IndexConfig) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| HybridError::Io {
            source: e,
            context: format!("Failed to open corpus: {:?}", path),
        })?;

        let mut store = Self::new(config)?;
        for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| HybridError::Io {
                source: e,
                context: format!("Failed to read corpus line {}", line_no + 1),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let document: Document = serde_json::from_str(&line).map_err(|e| HybridError::Json {
                source: e,
                context: format!("Invalid document on corpus line {}", line_no + 1),
            })?;
            store.insert(document)?;
        }
        store.commit()?;

        tracing::info!("Loaded {} documents from {:?}", store.len(), path);
        Ok(store)
    }

    /// Stage a document; it becomes searchable after the next commit
    pub fn insert(&mut self, document: Document) -> Result<()> {
        if document.id.is_empty() {
            return Err(HybridError::invalid_parameter("id", "document id cannot be empty"));
        }
        if self.keys.contains_key(&document.id) {
            return Err(HybridError::invalid_parameter(
                "id",
                format!("duplicate document id '{}'", document.id),
            ));
        }
        if let Some(embedding) = &document.embedding {
            if embedding.len() != self.vector_index.dimension() {
                return Err(HybridError::DimensionMismatch {
                    expected: self.vector_index.dimension(),
                    actual: embedding.len(),
                });
            }
            if embedding.iter().any(|x| !x.is_finite()) {
                return Err(HybridError::invalid_parameter(
                    "embedding",
                    format!("document '{}' has a non-finite component", document.id),
                ));
            }
        }

        let key = self.documents.len();
        self.keyword_index
            .insert(key as u64, &document.content)
            .map_err(|e| HybridError::Index(e.to_string()))?;
        if let Some(embedding) = &document.embedding {
            self.vector_index
                .insert(key, embedding)
                .map_err(|e| HybridError::Index(e.to_string()))?;
        }

        self.keys.insert(document.id.clone(), key);
        self.documents.push(document);
        Ok(())
    }

    /// Stage multiple documents
    pub fn insert_batch(&mut self, documents: impl IntoIterator<Item = Document>) -> Result<usize> {
        let mut inserted = 0;
        for document in documents {
            self.insert(document)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Make every staged document searchable
    pub fn commit(&mut self) -> Result<()> {
        self.keyword_index
            .commit()
            .map_err(|e| HybridError::Index(e.to_string()))?;
        self.committed = self.documents.len();
        tracing::debug!(
            "Committed corpus: {} documents, {} embeddings",
            self.committed,
            self.vector_index.len()
        );
        Ok(())
    }

    /// Number of searchable documents
    pub fn len(&self) -> usize {
        self.committed
    }

    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }

    fn visible(&self, key: usize) -> Option<&Document> {
        if key < self.committed {
            self.documents.get(key)
        } else {
            None
        }
    }
}

impl CorpusStore for DocumentStore {
    fn dimension(&self) -> usize {
        self.vector_index.dimension()
    }

    fn document_count(&self) -> usize {
        self.committed
    }

    fn document(&self, id: &str) -> Option<&Document> {
        self.keys.get(id).and_then(|key| self.visible(*key))
    }

    fn lexical_search(
        &self,
        text: &str,
        lang: Language,
        mode: TermMode,
        filter: &MetadataFilter,
        limit: usize,
    ) -> std::result::Result<LexicalMatches, StoreError> {
        let terms = self.keyword_index.analyze(lang, text)?;
        let query = mode.render(&terms);
        let scored = self.keyword_index.search_terms(lang, &terms, mode)?;

        let mut hits = Vec::with_capacity(scored.len());
        for (key, score) in scored {
            let key = key as usize;
            let document = self.visible(key).ok_or(StoreError::DanglingKey(key))?;
            if filter.matches(&document.metadata) {
                hits.push((document.id.clone(), score));
            }
        }

        sort_scored(&mut hits);
        let total = hits.len();
        hits.truncate(limit);

        Ok(LexicalMatches { query, hits, total })
    }

    fn nearest_neighbors(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        limit: usize,
    ) -> std::result::Result<Vec<(String, f32)>, StoreError> {
        if embedding.len() != self.dimension() {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension(),
                actual: embedding.len(),
            }
            .into());
        }

        let allow = |key: usize| {
            self.visible(key)
                .is_some_and(|document| filter.is_match_all() || filter.matches(&document.metadata))
        };
        let candidates = self.vector_index.search(embedding, limit, allow)?;

        // Re-score exactly so ordering does not depend on graph traversal
        let mut hits = Vec::with_capacity(candidates.len());
        for key in candidates {
            let document = self.visible(key).ok_or(StoreError::DanglingKey(key))?;
            let stored = document
                .embedding
                .as_deref()
                .ok_or(StoreError::DanglingKey(key))?;
            hits.push((document.id.clone(), cosine_similarity(embedding, stored)));
        }

        sort_scored(&mut hits);
        hits.truncate(limit);
        Ok(hits)
    }
}
