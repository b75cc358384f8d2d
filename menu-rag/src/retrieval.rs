//! Retrieval engine: similarity search, hard filters, goal re-ranking,
//! deduplication and the relaxed fallback phase.
//!
//! A turn runs in two phases. The primary phase takes the top `k * m`
//! items by cosine similarity, applies the session's hard filters, adds the
//! goal bonus, re-sorts and deduplicates by name. If that leaves nothing,
//! the fallback phase drops every filter except meal validity and ranks by
//! plain similarity, so a catalog with any meal-valid item always yields a
//! non-empty answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use menu_rag::{CatalogIndex, ConversationState, RagConfig, RetrievalEngine};
//!
//! let engine = RetrievalEngine::builder()
//!     .config(RagConfig::default())
//!     .catalog(Arc::new(catalog))
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let mut state = ConversationState::new();
//! let result = engine.retrieve(&mut state, "vegan dinner, no sprout", 3).await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogIndex, MenuItem};
use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::intent::extract_intent;
use crate::meal::is_actual_meal;
use crate::scoring::goal_bonus;
use crate::similarity::rank_by_similarity;
use crate::state::ConversationState;

/// One recommended item with the parts of its score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    /// Row of the item in the catalog.
    pub index: usize,
    pub item: MenuItem,
    /// Cosine similarity between query and item embeddings.
    pub similarity: f32,
    /// Goal-conditioned bonus; always zero for fallback results.
    pub bonus: f32,
    /// `similarity + bonus`.
    pub score: f32,
}

/// The ordered, deduplicated recommendations of one turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalResult {
    candidates: Vec<ScoredCandidate>,
    used_fallback: bool,
}

impl RetrievalResult {
    /// Wrap an already ranked list, e.g. from a custom ranking.
    pub fn from_candidates(candidates: Vec<ScoredCandidate>) -> Self {
        Self { candidates, used_fallback: false }
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<ScoredCandidate> {
        self.candidates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether the hard filters emptied the pool and the relaxed phase ran.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Ranks the catalog for a query under a session's sticky filters.
///
/// Construct one via [`RetrievalEngine::builder()`]. The engine itself is
/// immutable and may be shared; all per-session state lives in the
/// [`ConversationState`] passed to each call.
pub struct RetrievalEngine {
    config: RagConfig,
    catalog: Arc<CatalogIndex>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl RetrievalEngine {
    /// Create a new [`RetrievalEngineBuilder`].
    pub fn builder() -> RetrievalEngineBuilder {
        RetrievalEngineBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<CatalogIndex> {
        &self.catalog
    }

    /// Run one retrieval turn.
    ///
    /// Extracts the query's intent into `state`, embeds the query and ranks
    /// the catalog. Returns at most `k` items.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] when the embedding provider
    /// fails, whatever error it reported. Returns
    /// [`RagError::PipelineError`] if the query embedding dimension differs
    /// from the catalog's or it holds a non-finite component.
    pub async fn retrieve(
        &self,
        state: &mut ConversationState,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult> {
        let intent = extract_intent(query);
        debug!(?intent, "extracted query intent");
        state.update(&intent);

        let provider = self.embedding_provider.name();
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(provider, error = %e, "embedding failed during retrieval");
            match e {
                upstream @ RagError::EmbeddingError { .. } => upstream,
                other => RagError::EmbeddingError {
                    provider: provider.to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        if !self.catalog.is_empty() && query_embedding.len() != self.catalog.dimensions() {
            return Err(RagError::PipelineError(format!(
                "query embedding has dimension {}, catalog has {}",
                query_embedding.len(),
                self.catalog.dimensions()
            )));
        }
        if query_embedding.iter().any(|x| !x.is_finite()) {
            return Err(RagError::PipelineError(
                "query embedding contains a non-finite value".to_string(),
            ));
        }

        Ok(self.rank(state, &query_embedding, k))
    }

    /// Rank the catalog against an already computed query embedding using
    /// the filters currently held in `state`. Does not modify `state`.
    pub fn rank(
        &self,
        state: &ConversationState,
        query_embedding: &[f32],
        k: usize,
    ) -> RetrievalResult {
        if k == 0 || self.catalog.is_empty() {
            return RetrievalResult::default();
        }

        let ranking = rank_by_similarity(query_embedding, self.catalog.embeddings());
        let multiplier = self.pool_multiplier(state);
        let pool_len = k.saturating_mul(multiplier).min(ranking.len());

        let candidates = self.primary_phase(state, &ranking[..pool_len], k);
        let result = if candidates.is_empty() {
            warn!(pool_len, "filters left no candidates, relaxing to similarity only");
            RetrievalResult { candidates: self.fallback_phase(&ranking, k), used_fallback: true }
        } else {
            RetrievalResult { candidates, used_fallback: false }
        };

        info!(
            result_count = result.len(),
            multiplier,
            fallback = result.used_fallback,
            "retrieval completed"
        );
        result
    }

    /// How many candidates per requested slot to pull before filtering.
    pub fn pool_multiplier(&self, state: &ConversationState) -> usize {
        if state.dietary_requirement().is_some() {
            self.config.dietary_multiplier
        } else if state.nutrition_goal().is_some_and(|goal| goal.needs_wide_pool()) {
            self.config.wide_goal_multiplier
        } else {
            self.config.default_multiplier
        }
    }

    /// Whether an item survives every hard filter in `state`.
    ///
    /// The allow-list runs after the exclude-list and can only narrow it.
    fn passes_filters(&self, state: &ConversationState, item: &MenuItem) -> bool {
        if let Some(requirement) = state.dietary_requirement() {
            if !item.satisfies(requirement) {
                return false;
            }
        }
        if !is_actual_meal(item) {
            return false;
        }
        let restaurant = item.restaurant.as_deref();
        let excluded = state.excluded_restaurants();
        if restaurant.is_some_and(|r| excluded.contains(r)) {
            return false;
        }
        let included = state.included_restaurants();
        if !included.is_empty() && !restaurant.is_some_and(|r| included.contains(r)) {
            return false;
        }
        true
    }

    fn primary_phase(
        &self,
        state: &ConversationState,
        pool: &[(usize, f32)],
        k: usize,
    ) -> Vec<ScoredCandidate> {
        let goal = state.nutrition_goal();
        let mut survivors: Vec<ScoredCandidate> = pool
            .iter()
            .filter_map(|&(index, similarity)| {
                let item = self.catalog.item(index)?;
                if !self.passes_filters(state, item) {
                    return None;
                }
                let bonus = goal_bonus(item, goal);
                Some(ScoredCandidate {
                    index,
                    item: item.clone(),
                    similarity,
                    bonus,
                    score: similarity + bonus,
                })
            })
            .collect();

        // stable, so equal scores keep similarity order
        survivors.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!(pool = pool.len(), survivors = survivors.len(), "primary phase filtered");
        dedup_by_name(survivors, k)
    }

    /// Similarity-only ranking with just the meal-validity filter.
    ///
    /// Scans the top `k * fallback_multiplier` items; when none of those is
    /// meal-valid the scan continues over the rest of the ranking.
    fn fallback_phase(&self, ranking: &[(usize, f32)], k: usize) -> Vec<ScoredCandidate> {
        let pool_len = k.saturating_mul(self.config.fallback_multiplier).min(ranking.len());
        let (pool, rest) = ranking.split_at(pool_len);

        let picked = self.meal_candidates(pool, k);
        if !picked.is_empty() {
            return picked;
        }
        debug!(pool_len, "fallback pool had no meals, widening to full catalog");
        self.meal_candidates(rest, k)
    }

    fn meal_candidates(&self, ranking: &[(usize, f32)], k: usize) -> Vec<ScoredCandidate> {
        let candidates = ranking.iter().filter_map(|&(index, similarity)| {
            let item = self.catalog.item(index)?;
            is_actual_meal(item).then(|| ScoredCandidate {
                index,
                item: item.clone(),
                similarity,
                bonus: 0.0,
                score: similarity,
            })
        });
        dedup_by_name(candidates, k)
    }
}

/// Keep the first occurrence of each item name, stopping at `k` items.
fn dedup_by_name(
    candidates: impl IntoIterator<Item = ScoredCandidate>,
    k: usize,
) -> Vec<ScoredCandidate> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for candidate in candidates {
        if unique.len() >= k {
            break;
        }
        if seen.insert(candidate.item.name.clone()) {
            unique.push(candidate);
        }
    }
    unique
}

/// Builder for constructing a [`RetrievalEngine`].
///
/// The catalog and embedding provider are required; `config` defaults to
/// [`RagConfig::default()`].
#[derive(Default)]
pub struct RetrievalEngineBuilder {
    config: Option<RagConfig>,
    catalog: Option<Arc<CatalogIndex>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl RetrievalEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the catalog to rank.
    pub fn catalog(mut self, catalog: Arc<CatalogIndex>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the provider used to embed queries.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Build the [`RetrievalEngine`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, the
    /// config is invalid, or the provider's dimensionality differs from the
    /// catalog's.
    pub fn build(self) -> Result<RetrievalEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let catalog =
            self.catalog.ok_or_else(|| RagError::ConfigError("catalog is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;

        if !catalog.is_empty() && embedding_provider.dimensions() != catalog.dimensions() {
            return Err(RagError::ConfigError(format!(
                "embedding provider produces {} dimensions but catalog embeddings have {}",
                embedding_provider.dimensions(),
                catalog.dimensions()
            )));
        }

        Ok(RetrievalEngine { config, catalog, embedding_provider })
    }
}
