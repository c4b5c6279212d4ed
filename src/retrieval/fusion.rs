//! Reciprocal Rank Fusion algorithm for combining search results

use super::RankedCandidate;
use crate::error::HybridError;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Configuration for fusion algorithm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// RRF smoothing constant, strictly positive
    pub rrf_k: f64,

    /// Weight for semantic (vector) ranks
    pub semantic_weight: f64,

    /// Weight for full-text (keyword) ranks
    pub full_text_weight: f64,
}

impl FusionConfig {
    pub fn new(rrf_k: f64, semantic_weight: f64, full_text_weight: f64) -> Result<Self, HybridError> {
        if !(rrf_k.is_finite() && rrf_k > 0.0) {
            return Err(HybridError::invalid_parameter(
                "rrf_k",
                format!("must be a positive number, got {}", rrf_k),
            ));
        }

        for (name, weight) in [
            ("semantic_weight", semantic_weight),
            ("full_text_weight", full_text_weight),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(HybridError::invalid_parameter(
                    name,
                    format!("must be a non-negative number, got {}", weight),
                ));
            }
        }

        Ok(Self {
            rrf_k,
            semantic_weight,
            full_text_weight,
        })
    }
}

/// One ranker's contribution: `weight / (rrf_k + rank)`
pub fn contribution(weight: f64, rrf_k: f64, rank: usize) -> f64 {
    weight / (rrf_k + rank as f64)
}

/// A document with its fused score and the per-signal inputs
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub id: String,
    pub final_score: f64,
    pub vector: Option<RankedCandidate>,
    pub keyword: Option<RankedCandidate>,
}

/// Score descending, id ascending
pub(crate) fn compare_fused(a: &FusedCandidate, b: &FusedCandidate) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.id.cmp(&b.id))
}

/// Apply Reciprocal Rank Fusion to the two rankings
///
/// score(id) = semantic_weight / (k + vector_rank) + full_text_weight / (k + keyword_rank)
///
/// A ranking the document is absent from adds nothing.
///
/// # Returns
/// Every document present in either ranking, sorted by fused score
/// descending, ties by id ascending
pub fn reciprocal_rank_fusion(
    semantic_results: &[RankedCandidate],
    keyword_results: &[RankedCandidate],
    config: &FusionConfig,
) -> Vec<FusedCandidate> {
    let mut merged: BTreeMap<&str, (Option<&RankedCandidate>, Option<&RankedCandidate>)> =
        BTreeMap::new();

    for candidate in semantic_results {
        merged.entry(candidate.id.as_str()).or_default().0 = Some(candidate);
    }
    for candidate in keyword_results {
        merged.entry(candidate.id.as_str()).or_default().1 = Some(candidate);
    }

    let mut results: Vec<FusedCandidate> = merged
        .into_iter()
        .map(|(id, (vector, keyword))| {
            // Fixed summation order keeps equal rank pairs bit-identical
            let semantic = vector
                .map(|c| contribution(config.semantic_weight, config.rrf_k, c.rank))
                .unwrap_or(0.0);
            let lexical = keyword
                .map(|c| contribution(config.full_text_weight, config.rrf_k, c.rank))
                .unwrap_or(0.0);

            FusedCandidate {
                id: id.to_string(),
                final_score: semantic + lexical,
                vector: vector.cloned(),
                keyword: keyword.cloned(),
            }
        })
        .collect();

    results.sort_by(compare_fused);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(ids: &[&str]) -> Vec<RankedCandidate> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| RankedCandidate {
                id: id.to_string(),
                rank: i + 1,
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_rrf_formula_scenario() {
        let semantic = ranked(&["doc", "x", "y"]);
        let keyword = ranked(&["y", "x", "doc"]);

        let config = FusionConfig::new(50.0, 1.0, 1.0).unwrap();
        let fused = reciprocal_rank_fusion(&semantic, &keyword, &config);

        let doc = fused.iter().find(|c| c.id == "doc").unwrap();
        assert_eq!(doc.vector.as_ref().unwrap().rank, 1);
        assert_eq!(doc.keyword.as_ref().unwrap().rank, 3);
        assert!((doc.final_score - 0.038476).abs() < 1e-6);
        assert!((doc.final_score - (1.0 / 51.0 + 1.0 / 53.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_basic() {
        let semantic = ranked(&["1", "2", "3"]);
        let keyword = ranked(&["2", "1", "4"]);

        let config = FusionConfig::new(60.0, 1.0, 1.0).unwrap();
        let fused = reciprocal_rank_fusion(&semantic, &keyword, &config);

        assert_eq!(fused.len(), 4);
        // 1 and 2 appear in both lists with mirrored ranks: equal score, id order
        assert_eq!(fused[0].id, "1");
        assert_eq!(fused[1].id, "2");
        assert_eq!(fused[0].final_score, fused[1].final_score);
    }

    #[test]
    fn test_rrf_weighted() {
        let semantic = ranked(&["1"]);
        let keyword = ranked(&["2"]);

        let config = FusionConfig::new(60.0, 0.7, 0.3).unwrap();
        let fused = reciprocal_rank_fusion(&semantic, &keyword, &config);

        assert_eq!(fused[0].id, "1");
    }

    #[test]
    fn test_absent_signal_contributes_nothing() {
        let keyword = ranked(&["only-lexical"]);

        let config = FusionConfig::new(50.0, 1.0, 0.0).unwrap();
        let fused = reciprocal_rank_fusion(&[], &keyword, &config);

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].final_score, 0.0);
        assert!(fused[0].vector.is_none());
    }

    #[test]
    fn test_invalid_parameters() {
        for rrf_k in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(FusionConfig::new(rrf_k, 1.0, 1.0).unwrap_err().kind(), "invalid_parameter");
        }
        assert!(FusionConfig::new(50.0, -0.1, 1.0).is_err());
        assert!(FusionConfig::new(50.0, 1.0, f64::NAN).is_err());
        assert!(FusionConfig::new(50.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_larger_k_flattens_differences() {
        let gap = |k: f64| contribution(1.0, k, 1) - contribution(1.0, k, 2);
        assert!(gap(10.0) > gap(100.0));
    }
}
