//! Hybrid retrieval: lexical + vector ranking fused with Reciprocal Rank Fusion
//!
//! A query compiles its metadata filter once, runs both rankers concurrently
//! over the filtered corpus, fuses the two rank lists and assembles the
//! bounded result set.

mod assembler;
mod filter;
mod fusion;
mod hybrid;
mod language;
mod lexical;
mod vector;

pub use assembler::{assemble, DebugResult, FusedResult, QueryDiagnostics, SearchOutcome};
pub use filter::{MetadataFilter, MissingKeyPolicy};
pub use fusion::{contribution, reciprocal_rank_fusion, FusedCandidate, FusionConfig};
pub use hybrid::HybridSearcher;
pub use language::{pick_by_matches, resolve_language, Language, LanguageChoice};
pub use lexical::{rank_lexical, LanguageVariant, LexicalRanking};
pub use vector::rank_vector;

use crate::corpus::compare_scored;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One search invocation.
///
/// Optional fields fall back to the `[search]` configuration. The
/// `p_`-prefixed names of the database procedure are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(alias = "p_query_text")]
    pub query_text: String,

    /// Pre-computed query vector; a `"[0.1,0.2,...]"` literal is accepted too
    #[serde(alias = "p_query_embedding", deserialize_with = "deserialize_embedding")]
    pub query_embedding: Vec<f32>,

    #[serde(default, alias = "p_lang")]
    pub lang: Option<String>,

    #[serde(default, alias = "p_filter")]
    pub filter: Option<Value>,

    #[serde(default, alias = "p_match_count")]
    pub match_count: Option<i64>,

    #[serde(default, alias = "p_full_text_weight")]
    pub full_text_weight: Option<f64>,

    #[serde(default, alias = "p_semantic_weight")]
    pub semantic_weight: Option<f64>,

    #[serde(default, alias = "p_rrf_k")]
    pub rrf_k: Option<f64>,
}

impl SearchRequest {
    pub fn new(query_text: impl Into<String>, query_embedding: Vec<f32>) -> Self {
        Self {
            query_text: query_text.into(),
            query_embedding,
            lang: None,
            filter: None,
            match_count: None,
            full_text_weight: None,
            semantic_weight: None,
            rrf_k: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_match_count(mut self, match_count: i64) -> Self {
        self.match_count = Some(match_count);
        self
    }

    pub fn with_weights(mut self, full_text_weight: f64, semantic_weight: f64) -> Self {
        self.full_text_weight = Some(full_text_weight);
        self.semantic_weight = Some(semantic_weight);
        self
    }

    pub fn with_rrf_k(mut self, rrf_k: f64) -> Self {
        self.rrf_k = Some(rrf_k);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingInput {
    Vector(Vec<f32>),
    Literal(String),
}

fn deserialize_embedding<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    match EmbeddingInput::deserialize(deserializer)? {
        EmbeddingInput::Vector(vector) => Ok(vector),
        EmbeddingInput::Literal(literal) => parse_vector_literal(&literal).map_err(de::Error::custom),
    }
}

/// Parse a `[x,y,z]` vector literal
pub fn parse_vector_literal(literal: &str) -> Result<Vec<f32>, String> {
    let inner = literal
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("expected '[...]' vector literal, got '{}'", literal))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid vector component '{}': {}", part.trim(), e))
        })
        .collect()
}

/// A ranker's view of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub id: String,
    /// 1-based, unique within one ranker's output
    pub rank: usize,
    pub score: f32,
}

/// Assign 1-based ranks by descending score, ties by id ascending
pub fn rank_candidates(mut hits: Vec<(String, f32)>) -> Vec<RankedCandidate> {
    hits.sort_by(|a, b| compare_scored(&a.0, a.1, &b.0, b.1));
    hits.into_iter()
        .enumerate()
        .map(|(i, (id, score))| RankedCandidate {
            id,
            rank: i + 1,
            score,
        })
        .collect()
}
