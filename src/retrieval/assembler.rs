//! Result assembly: ordering, truncation and document join

use super::fusion::compare_fused;
use super::{FusedCandidate, Language, LexicalRanking};
use crate::corpus::CorpusStore;
use crate::error::HybridError;
use serde::Serialize;
use serde_json::Value;

/// One returned document with its fused score and per-signal breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedResult {
    pub id: String,
    pub content: String,
    pub file_name: String,
    pub metadata: Value,
    pub doc_lang: Option<String>,
    pub final_score: f64,
    pub vector_rank: Option<usize>,
    pub vector_score: Option<f32>,
    pub keyword_rank: Option<usize>,
    pub keyword_score: Option<f32>,
}

/// How the lexical side of a query was resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDiagnostics {
    pub used_lang: Language,
    pub used_query: String,
    pub q_en: String,
    pub q_es: String,
    pub r_en: usize,
    pub r_es: usize,
}

impl QueryDiagnostics {
    pub fn from_lexical(ranking: &LexicalRanking) -> Self {
        let variant = |language| {
            ranking
                .variant(language)
                .map(|v| (v.query.clone(), v.matches))
                .unwrap_or_default()
        };
        let (q_en, r_en) = variant(Language::English);
        let (q_es, r_es) = variant(Language::Spanish);

        Self {
            used_lang: ranking.language,
            used_query: ranking.used_query().to_string(),
            q_en,
            q_es,
            r_en,
            r_es,
        }
    }
}

/// Standard result row plus query diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugResult {
    #[serde(flatten)]
    pub result: FusedResult,
    #[serde(flatten)]
    pub diagnostics: QueryDiagnostics,
}

/// Everything one query produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<FusedResult>,
    pub diagnostics: QueryDiagnostics,
}

impl SearchOutcome {
    /// Debug rows: each result annotated with the query diagnostics
    pub fn into_debug(self) -> Vec<DebugResult> {
        let diagnostics = self.diagnostics;
        self.results
            .into_iter()
            .map(|result| DebugResult {
                result,
                diagnostics: diagnostics.clone(),
            })
            .collect()
    }
}

/// Order, truncate to `match_count` and join document fields.
///
/// `match_count <= 0` means no results were requested. No filtering
/// happens here; the rankers already saw only filtered documents.
pub fn assemble(
    store: &dyn CorpusStore,
    mut fused: Vec<FusedCandidate>,
    match_count: i64,
) -> Result<Vec<FusedResult>, HybridError> {
    if match_count <= 0 {
        return Ok(Vec::new());
    }

    fused.sort_by(compare_fused);
    fused.truncate(usize::try_from(match_count).unwrap_or(usize::MAX));

    fused
        .into_iter()
        .map(|candidate| {
            let document = store.document(&candidate.id).ok_or_else(|| {
                HybridError::Index(format!("ranked document '{}' is not in the store", candidate.id))
            })?;

            Ok(FusedResult {
                id: candidate.id,
                content: document.content.clone(),
                file_name: document.file_name.clone(),
                metadata: document.metadata.clone(),
                doc_lang: document.lang.clone(),
                final_score: candidate.final_score,
                vector_rank: candidate.vector.as_ref().map(|c| c.rank),
                vector_score: candidate.vector.as_ref().map(|c| c.score),
                keyword_rank: candidate.keyword.as_ref().map(|c| c.rank),
                keyword_score: candidate.keyword.as_ref().map(|c| c.score),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::corpus::{Document, DocumentStore};
    use crate::retrieval::{LanguageVariant, RankedCandidate};
    use serde_json::json;

    fn store() -> DocumentStore {
        let config = IndexConfig {
            vector_dim: 2,
            ..IndexConfig::default()
        };
        let mut store = DocumentStore::new(&config).unwrap();
        store
            .insert_batch([
                Document::new("a", "alpha").with_file_name("a.pdf").with_lang("en"),
                Document::new("b", "beta").with_metadata(json!({"k": 1})),
                Document::new("c", "gamma"),
            ])
            .unwrap();
        store.commit().unwrap();
        store
    }

    fn candidate(id: &str, score: f64, vector_rank: Option<usize>) -> FusedCandidate {
        FusedCandidate {
            id: id.to_string(),
            final_score: score,
            vector: vector_rank.map(|rank| RankedCandidate {
                id: id.to_string(),
                rank,
                score: 0.5,
            }),
            keyword: None,
        }
    }

    #[test]
    fn test_orders_and_truncates() {
        let fused = vec![
            candidate("c", 0.01, None),
            candidate("b", 0.02, Some(1)),
            candidate("a", 0.02, Some(2)),
        ];
        let results = assemble(&store(), fused, 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[0].file_name, "a.pdf");
        assert_eq!(results[0].doc_lang.as_deref(), Some("en"));
        assert_eq!(results[1].id, "b");
        assert_eq!(results[1].metadata, json!({"k": 1}));
        assert_eq!(results[1].vector_rank, Some(1));
        assert_eq!(results[1].keyword_rank, None);
    }

    #[test]
    fn test_non_positive_match_count_is_empty() {
        for match_count in [0, -3] {
            let results = assemble(&store(), vec![candidate("a", 1.0, None)], match_count).unwrap();
            assert!(results.is_empty());
        }
    }

    #[test]
    fn test_match_count_above_total_returns_all() {
        let results = assemble(&store(), vec![candidate("a", 1.0, None)], 100).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_debug_rows_are_a_superset() {
        let ranking = LexicalRanking {
            language: Language::Spanish,
            candidates: Vec::new(),
            variants: vec![
                LanguageVariant {
                    language: Language::English,
                    query: "'alpha'".to_string(),
                    matches: 1,
                },
                LanguageVariant {
                    language: Language::Spanish,
                    query: "'alph'".to_string(),
                    matches: 2,
                },
            ],
        };
        let results = assemble(&store(), vec![candidate("a", 1.0, Some(1))], 10).unwrap();
        let outcome = SearchOutcome {
            results: results.clone(),
            diagnostics: QueryDiagnostics::from_lexical(&ranking),
        };

        let debug = outcome.into_debug();
        assert_eq!(debug[0].result, results[0]);
        assert_eq!(debug[0].diagnostics.used_query, "'alph'");
        assert_eq!(debug[0].diagnostics.r_en, 1);

        let row = serde_json::to_value(&debug[0]).unwrap();
        assert_eq!(row["used_lang"], json!("es"));
        assert_eq!(row["id"], json!("a"));
        assert_eq!(row["keyword_rank"], Value::Null);
    }
}
