//! Hybrid search combining semantic and keyword search

use super::{
    assemble, rank_lexical, rank_vector, reciprocal_rank_fusion, resolve_language, DebugResult,
    FusedResult, FusionConfig, Language, LanguageChoice, MetadataFilter, MissingKeyPolicy,
    QueryDiagnostics, SearchOutcome, SearchRequest,
};
use crate::config::{Config, SearchConfig};
use crate::corpus::{CorpusStore, TermMode};
use crate::error::{HybridError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Validated per-query parameters
struct QueryPlan {
    fusion: FusionConfig,
    match_count: i64,
    choice: LanguageChoice,
    filter: Arc<MetadataFilter>,
    depth: usize,
}

/// Hybrid searcher combining semantic and keyword rankings
pub struct HybridSearcher {
    store: Arc<dyn CorpusStore>,
    config: SearchConfig,
    default_language: Language,
    missing_key_policy: MissingKeyPolicy,
}

impl HybridSearcher {
    /// Create a new hybrid searcher over a committed store
    pub fn new(store: Arc<dyn CorpusStore>, config: &Config) -> Result<Self> {
        let default_language = config.search.default_language.parse()?;

        Ok(Self {
            store,
            config: config.search.clone(),
            default_language,
            missing_key_policy: config.filter.missing_key_policy,
        })
    }

    /// Perform hybrid search
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<FusedResult>> {
        Ok(self.search_with_details(request).await?.results)
    }

    /// Perform hybrid search and annotate every row with query diagnostics
    pub async fn search_debug(&self, request: &SearchRequest) -> Result<Vec<DebugResult>> {
        Ok(self.search_with_details(request).await?.into_debug())
    }

    /// Synchronous entry point.
    ///
    /// Drives the async path on a private runtime, so it must not be called
    /// from inside a tokio runtime.
    pub fn search_blocking(&self, request: &SearchRequest) -> Result<Vec<FusedResult>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HybridError::Io {
                source: e,
                context: "Failed to create tokio runtime".to_string(),
            })?;
        runtime.block_on(self.search(request))
    }

    /// Perform hybrid search, returning results and diagnostics
    pub async fn search_with_details(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let plan = self.plan(request)?;

        // Step 1: both rankers in parallel over the same filtered corpus
        let lexical_task = {
            let store = Arc::clone(&self.store);
            let filter = Arc::clone(&plan.filter);
            let text = request.query_text.clone();
            let (choice, depth, mode) = (plan.choice, plan.depth, self.term_mode());
            tokio::task::spawn_blocking(move || {
                rank_lexical(store.as_ref(), &text, choice, mode, &filter, depth)
            })
        };
        let vector_task = {
            let store = Arc::clone(&self.store);
            let filter = Arc::clone(&plan.filter);
            let embedding = request.query_embedding.clone();
            let depth = plan.depth;
            tokio::task::spawn_blocking(move || {
                rank_vector(store.as_ref(), &embedding, &filter, depth)
            })
        };

        let deadline = Duration::from_millis(self.config.ranker_timeout_ms);
        let (lexical, vector) = tokio::join!(
            join_ranker("lexical", deadline, lexical_task),
            join_ranker("vector", deadline, vector_task)
        );
        let lexical = lexical?;
        let vector = vector?;

        // Step 2: Reciprocal Rank Fusion
        let fused = reciprocal_rank_fusion(&vector, &lexical.candidates, &plan.fusion);

        // Step 3: order, truncate, join documents
        let fused_count = fused.len();
        let results = assemble(self.store.as_ref(), fused, plan.match_count)?;

        tracing::debug!(
            language = %lexical.language,
            keyword_candidates = lexical.candidates.len(),
            vector_candidates = vector.len(),
            fused = fused_count,
            returned = results.len(),
            "hybrid search complete"
        );

        Ok(SearchOutcome {
            results,
            diagnostics: QueryDiagnostics::from_lexical(&lexical),
        })
    }

    /// Validate the request and fill defaults. Nothing is queried until
    /// every parameter is known to be valid.
    fn plan(&self, request: &SearchRequest) -> Result<QueryPlan> {
        let fusion = FusionConfig::new(
            request.rrf_k.unwrap_or(self.config.rrf_k),
            request.semantic_weight.unwrap_or(self.config.semantic_weight),
            request.full_text_weight.unwrap_or(self.config.full_text_weight),
        )?;

        let choice = resolve_language(request.lang.as_deref(), self.default_language)?;

        let filter = MetadataFilter::compile(request.filter.as_ref(), self.missing_key_policy)?;

        let expected = self.store.dimension();
        if request.query_embedding.len() != expected {
            return Err(HybridError::DimensionMismatch {
                expected,
                actual: request.query_embedding.len(),
            });
        }
        if request.query_embedding.iter().any(|x| !x.is_finite()) {
            return Err(HybridError::invalid_parameter(
                "query_embedding",
                "contains a non-finite component",
            ));
        }

        let match_count = request.match_count.unwrap_or(self.config.match_count);
        // No ranker can return more than the corpus holds
        let depth = usize::try_from(match_count.max(1))
            .unwrap_or(usize::MAX)
            .saturating_mul(self.config.candidate_multiplier.max(1))
            .min(self.store.document_count().max(1));

        Ok(QueryPlan {
            fusion,
            match_count,
            choice,
            filter: Arc::new(filter),
            depth,
        })
    }

    fn term_mode(&self) -> TermMode {
        if self.config.require_all_terms {
            TermMode::All
        } else {
            TermMode::Any
        }
    }
}

/// Await one ranker task; failure, panic or timeout aborts the query
async fn join_ranker<T>(
    ranker: &str,
    deadline: Duration,
    task: JoinHandle<Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(HybridError::ranker_failure(
            ranker,
            format!("task failed: {}", join_error),
        )),
        Err(_) => Err(HybridError::ranker_failure(
            ranker,
            format!("timed out after {:?}", deadline),
        )),
    }
}
