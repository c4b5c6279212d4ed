//! Vector ranker

use super::{rank_candidates, MetadataFilter, RankedCandidate};
use crate::corpus::{CorpusStore, StoreError, VectorIndexError};
use crate::error::HybridError;

/// Rank documents by cosine similarity to `embedding`.
///
/// A dimension mismatch is fatal; documents without an embedding are simply
/// absent from the output.
pub fn rank_vector(
    store: &dyn CorpusStore,
    embedding: &[f32],
    filter: &MetadataFilter,
    depth: usize,
) -> Result<Vec<RankedCandidate>, HybridError> {
    if embedding.len() != store.dimension() {
        return Err(HybridError::DimensionMismatch {
            expected: store.dimension(),
            actual: embedding.len(),
        });
    }

    let hits = store
        .nearest_neighbors(embedding, filter, depth)
        .map_err(|e| match e {
            StoreError::Vector(VectorIndexError::InvalidDimension { expected, actual }) => {
                HybridError::DimensionMismatch { expected, actual }
            }
            other => HybridError::ranker_failure("vector", other.to_string()),
        })?;

    tracing::debug!(candidates = hits.len(), "vector ranking complete");

    Ok(rank_candidates(hits))
}
