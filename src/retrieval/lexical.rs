//! Lexical ranker with language dispatch

use super::{pick_by_matches, rank_candidates, Language, LanguageChoice, MetadataFilter, RankedCandidate};
use crate::corpus::{CorpusStore, TermMode};
use crate::error::HybridError;

/// One language variant's query and match count over the filtered corpus
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageVariant {
    pub language: Language,
    pub query: String,
    pub matches: usize,
}

/// Output of the lexical ranker
#[derive(Debug, Clone)]
pub struct LexicalRanking {
    /// Variant whose matches were ranked
    pub language: Language,
    pub candidates: Vec<RankedCandidate>,
    /// Every evaluated variant, in [`Language::ALL`] order
    pub variants: Vec<LanguageVariant>,
}

impl LexicalRanking {
    pub fn variant(&self, language: Language) -> Option<&LanguageVariant> {
        self.variants.iter().find(|v| v.language == language)
    }

    /// Printable query of the variant that was used
    pub fn used_query(&self) -> &str {
        self.variant(self.language).map(|v| v.query.as_str()).unwrap_or("")
    }
}

/// Rank documents by lexical relevance.
///
/// Every supported language variant is evaluated so the inferred choice
/// and the diagnostics come from one pass. Blank query text yields an
/// empty ranking without touching the store.
pub fn rank_lexical(
    store: &dyn CorpusStore,
    text: &str,
    choice: LanguageChoice,
    mode: TermMode,
    filter: &MetadataFilter,
    depth: usize,
) -> Result<LexicalRanking, HybridError> {
    let fallback = match choice {
        LanguageChoice::Explicit(lang) => lang,
        LanguageChoice::Infer { default } => default,
    };

    if text.trim().is_empty() {
        return Ok(LexicalRanking {
            language: fallback,
            candidates: Vec::new(),
            variants: Language::ALL
                .iter()
                .map(|&language| LanguageVariant {
                    language,
                    query: String::new(),
                    matches: 0,
                })
                .collect(),
        });
    }

    let mut variants = Vec::with_capacity(Language::ALL.len());
    let mut hits_by_language = Vec::with_capacity(Language::ALL.len());
    for language in Language::ALL {
        let matches = store
            .lexical_search(text, language, mode, filter, depth)
            .map_err(|e| HybridError::ranker_failure("lexical", e.to_string()))?;
        variants.push(LanguageVariant {
            language,
            query: matches.query,
            matches: matches.total,
        });
        hits_by_language.push((language, matches.hits));
    }

    let language = match choice {
        LanguageChoice::Explicit(lang) => lang,
        LanguageChoice::Infer { default } => {
            let counts: Vec<(Language, usize)> =
                variants.iter().map(|v| (v.language, v.matches)).collect();
            pick_by_matches(&counts, default)
        }
    };

    let hits = hits_by_language
        .into_iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, hits)| hits)
        .unwrap_or_default();

    tracing::debug!(
        language = %language,
        candidates = hits.len(),
        "lexical ranking complete"
    );

    Ok(LexicalRanking {
        language,
        candidates: rank_candidates(hits),
        variants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::corpus::{Document, DocumentStore};

    fn store() -> DocumentStore {
        let config = IndexConfig {
            vector_dim: 2,
            ..IndexConfig::default()
        };
        let mut store = DocumentStore::new(&config).unwrap();
        store
            .insert_batch([
                Document::new("en-1", "songwriter royalties are paid quarterly"),
                Document::new("en-2", "royalties for streaming songs"),
                Document::new("es-1", "la canción del verano"),
                Document::new("es-2", "canciones y contratos discográficos"),
                Document::new("es-3", "contrato de canciones"),
            ])
            .unwrap();
        store.commit().unwrap();
        store
    }

    #[test]
    fn test_empty_text_yields_empty_ranking() {
        let ranking = rank_lexical(
            &store(),
            "   ",
            LanguageChoice::Infer {
                default: Language::English,
            },
            TermMode::All,
            &MetadataFilter::match_all(),
            10,
        )
        .unwrap();
        assert!(ranking.candidates.is_empty());
        assert_eq!(ranking.language, Language::English);
        assert_eq!(ranking.used_query(), "");
    }

    #[test]
    fn test_inferred_language_prefers_more_matches() {
        // Only the Spanish stemmer folds "canción" and "canciones" together
        let ranking = rank_lexical(
            &store(),
            "canción",
            LanguageChoice::Infer {
                default: Language::English,
            },
            TermMode::All,
            &MetadataFilter::match_all(),
            10,
        )
        .unwrap();

        assert_eq!(ranking.language, Language::Spanish);
        assert_eq!(ranking.variant(Language::Spanish).unwrap().matches, 3);
        assert_eq!(ranking.candidates.len(), 3);
        assert_eq!(ranking.candidates[0].rank, 1);
    }

    #[test]
    fn test_explicit_language_is_used_even_with_fewer_matches() {
        let ranking = rank_lexical(
            &store(),
            "canciones",
            LanguageChoice::Explicit(Language::English),
            TermMode::All,
            &MetadataFilter::match_all(),
            10,
        )
        .unwrap();
        assert_eq!(ranking.language, Language::English);
        assert_eq!(
            ranking.candidates.len(),
            ranking.variant(Language::English).unwrap().matches
        );
    }

    #[test]
    fn test_depth_bounds_candidates_but_not_counts() {
        let ranking = rank_lexical(
            &store(),
            "canciones",
            LanguageChoice::Explicit(Language::Spanish),
            TermMode::All,
            &MetadataFilter::match_all(),
            2,
        )
        .unwrap();
        assert_eq!(ranking.candidates.len(), 2);
        assert_eq!(ranking.variant(Language::Spanish).unwrap().matches, 3);
    }

    #[test]
    fn test_ranks_follow_scores() {
        let ranking = rank_lexical(
            &store(),
            "royalties",
            LanguageChoice::Explicit(Language::English),
            TermMode::All,
            &MetadataFilter::match_all(),
            10,
        )
        .unwrap();
        for pair in ranking.candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            assert_eq!(pair[0].rank + 1, pair[1].rank);
        }
    }
}
