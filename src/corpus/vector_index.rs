//! HNSW vector index for similarity search
use hnsw_rs::filter::FilterT;
use hnsw_rs::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Non-finite value in vector")]
    NonFinite,
}

/// HNSW vector index wrapper
///
/// Uses cosine distance. Only documents that carry an embedding are ever
/// inserted.
pub struct VectorIndex {
    index: Hnsw<'static, f32, DistCosine>,
    dimension: usize,
    ef_search: usize,
    keys: Vec<usize>,
}

impl VectorIndex {
    /// Create a new vector index
    ///
    /// # Arguments
    /// * `dimension` - Vector dimension (must match embedding dimension)
    /// * `m` - HNSW M parameter (number of connections per layer)
    /// * `ef_construction` - HNSW construction parameter
    /// * `ef_search` - Minimum search breadth
    /// * `max_elements` - Capacity hint
    pub fn new(
        dimension: usize,
        m: usize,
        ef_construction: usize,
        ef_search: usize,
        max_elements: usize,
    ) -> Self {
        let index = Hnsw::<f32, DistCosine>::new(m, max_elements, 16, ef_construction, DistCosine);

        Self {
            index,
            dimension,
            ef_search,
            keys: Vec::new(),
        }
    }

    /// Insert a vector under a store key
    pub fn insert(&mut self, key: usize, vector: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(vector)?;
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(VectorIndexError::NonFinite);
        }

        self.index.insert((vector, key));
        self.keys.push(key);

        Ok(())
    }

    /// Candidate keys for the `k` nearest neighbors accepted by `allow`
    ///
    /// When every accepted key fits in `k` they are all returned and the
    /// graph is not consulted, so recall is exact at the boundary. Otherwise
    /// the filter is applied during graph traversal so rejected keys never
    /// take a result slot. Keys come back unordered; callers re-score.
    pub fn search<F>(&self, query: &[f32], k: usize, allow: F) -> Result<Vec<usize>, VectorIndexError>
    where
        F: Fn(usize) -> bool,
    {
        self.check_dimension(query)?;
        if k == 0 || self.keys.is_empty() {
            return Ok(Vec::new());
        }

        let accepted: Vec<usize> = self.keys.iter().copied().filter(|key| allow(*key)).collect();
        if accepted.len() <= k {
            return Ok(accepted);
        }

        // k < accepted.len() <= len(), so graph buffers stay bounded
        let ef = self.ef_search.max(k);
        let filter = |id: &usize| allow(*id);
        let filter: &dyn FilterT = &filter;
        let neighbours = self.index.search_filter(query, k, ef, Some(filter));

        Ok(neighbours.into_iter().map(|n| n.d_id).collect())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Exact cosine similarity; zero-norm vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}
