//! The optimization pipeline end to end: gather candidates, score them,
//! build and rank per-store baskets, try multi-store routes, and assemble
//! the final recommendation.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use kurv_core::{
    AppConfig, Product, RecommendationResult, RelevanceScorer, ScoredCandidate, ShoppingItem,
    StoreLocation,
};
use kurv_provider::cache::{request_key, MemoCache};
use kurv_provider::{PriceIndex, ProductProvider};

use crate::aggregate::{collect_variety, AggregatorConfig, VarietyHarvest};
use crate::basket::{build_store_basket, rank_stores, select_alternatives, RankingConfig};
use crate::combine::{best_route, CombineConfig};
use crate::error::EngineError;
use crate::recommend::recommend;

/// Per-call constraints on one optimization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizeOptions {
    /// Cap on stores per route; the configured cap still applies.
    pub max_stores: Option<usize>,
    /// Drop stores farther than this from the user.
    pub max_distance_m: Option<f64>,
    /// Chains to exclude entirely, matched against the store chain label.
    pub excluded_chains: Vec<String>,
}

/// The decision core. Generic over its collaborators so tests can drive it
/// with in-memory fixtures.
pub struct Optimizer<P, I> {
    provider: P,
    index: I,
    scorer: RelevanceScorer,
    cache: Option<MemoCache<RecommendationResult>>,
    config: AppConfig,
}

impl<P, I> Optimizer<P, I>
where
    P: ProductProvider,
    I: PriceIndex,
{
    #[must_use]
    pub fn new(provider: P, index: I, scorer: RelevanceScorer, config: AppConfig) -> Self {
        Self {
            provider,
            index,
            scorer,
            cache: None,
            config,
        }
    }

    /// Enables result memoization with the configured TTL.
    #[must_use]
    pub fn with_cache(mut self) -> Self {
        let ttl = std::time::Duration::from_secs(self.config.cache_ttl_secs);
        self.cache = Some(MemoCache::new(ttl));
        self
    }

    /// Runs one full optimization over the shopping list and nearby stores.
    ///
    /// Never fails on degraded data: empty lists, no reachable stores, and
    /// no surviving candidates all yield a structured empty result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CacheKey`] only if the request material cannot
    /// be serialized for the memo key.
    pub async fn calculate_optimal_route(
        &self,
        items: &[ShoppingItem],
        stores: &[StoreLocation],
        options: &OptimizeOptions,
    ) -> Result<RecommendationResult, EngineError> {
        if items.is_empty() {
            return Ok(RecommendationResult::empty("shopping list is empty"));
        }

        let key = self.memo_key(items, stores, options)?;
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                debug!(key = %key, "returning memoized recommendation");
                return Ok(hit);
            }
        }

        let stores = filter_stores(stores, options);
        if stores.is_empty() {
            warn!("no stores survive the distance and exclusion filters");
            return Ok(RecommendationResult::empty("no stores available"));
        }

        let queries: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        let chains = distinct_chains(&stores);
        info!(
            items = items.len(),
            stores = stores.len(),
            chains = chains.len(),
            "starting optimization"
        );

        let aggregator = AggregatorConfig {
            max_concurrent: self.config.max_concurrent_searches,
            max_targeted_per_query: self.config.max_targeted_per_query,
            ..AggregatorConfig::default()
        };
        let harvest =
            collect_variety(&self.provider, &self.index, &queries, &chains, &aggregator).await;

        let candidates_by_query = self.score_harvest(&harvest, &queries);
        if candidates_by_query.values().all(Vec::is_empty) {
            warn!("no candidate survived relevance scoring");
            return Ok(RecommendationResult::empty("no matching products found"));
        }

        let ranking = self.ranking_config();
        let mut baskets: Vec<_> = stores
            .iter()
            .map(|store| build_store_basket(store, items, &candidates_by_query, &ranking))
            .collect();
        rank_stores(&mut baskets, &ranking);

        let top = &baskets[..baskets.len().min(ranking.top_candidates)];
        let combine = CombineConfig {
            max_stores: options
                .max_stores
                .map_or(self.config.max_stores_per_route, |m| {
                    m.min(self.config.max_stores_per_route)
                }),
            ..CombineConfig::default()
        };
        let route = best_route(top, items, &baskets[0], &combine);

        let alternatives = select_alternatives(&baskets, &ranking);
        let result = recommend(&baskets, route, alternatives);
        info!(
            decision = ?result.decision,
            reason = %result.reason,
            "optimization complete"
        );

        if let Some(cache) = &self.cache {
            cache.set(&key, result.clone());
        }
        Ok(result)
    }

    /// Scores every harvested candidate per query. Index-sourced candidates
    /// are pre-curated and receive the trusted score unconditionally; live
    /// candidates go through the relevance scorer and its ceiling.
    fn score_harvest(
        &self,
        harvest: &VarietyHarvest,
        queries: &[String],
    ) -> BTreeMap<String, Vec<ScoredCandidate>> {
        let by_id: BTreeMap<&str, &Product> = harvest
            .products
            .iter()
            .map(|p| (p.id.as_str(), p))
            .collect();
        let trusted = self.config.scoring_weights().index_trusted_score;

        let mut out: BTreeMap<String, Vec<ScoredCandidate>> = BTreeMap::new();
        for query in queries {
            let mut accepted: Vec<ScoredCandidate> = Vec::new();
            if let Some(ids) = harvest.query_mapping.get(query) {
                for id in ids {
                    let Some(&product) = by_id.get(id.as_str()) else {
                        continue;
                    };
                    if harvest.index_product_ids.contains(id) {
                        accepted.push(ScoredCandidate {
                            product: product.clone(),
                            score: trusted,
                        });
                        continue;
                    }
                    let score = self.scorer.score(&product.name, query);
                    if self.scorer.accepts(score) {
                        accepted.push(ScoredCandidate {
                            product: product.clone(),
                            score,
                        });
                    }
                }
            }
            debug!(query = %query, accepted = accepted.len(), "scored candidates");
            out.insert(query.clone(), accepted);
        }
        out
    }

    fn ranking_config(&self) -> RankingConfig {
        RankingConfig {
            gap_override: self.config.score_gap_override,
            top_candidates: self.config.top_candidates,
            max_alternatives: self.config.max_alternatives,
            min_alternative_availability: self.config.min_alternative_availability,
            alternative_cost_multiple: self.config.alternative_cost_multiple,
            ..RankingConfig::default()
        }
    }

    fn memo_key(
        &self,
        items: &[ShoppingItem],
        stores: &[StoreLocation],
        options: &OptimizeOptions,
    ) -> Result<String, EngineError> {
        let items = serde_json::to_string(items)?;
        let stores = serde_json::to_string(stores)?;
        let options = serde_json::to_string(options)?;
        Ok(request_key(&[&items, &stores, &options]))
    }
}

fn filter_stores(stores: &[StoreLocation], options: &OptimizeOptions) -> Vec<StoreLocation> {
    let excluded: Vec<String> = options
        .excluded_chains
        .iter()
        .map(|c| kurv_core::matching::normalize_label(c))
        .collect();
    stores
        .iter()
        .filter(|store| {
            options
                .max_distance_m
                .is_none_or(|max| store.distance_from_user_m <= max)
        })
        .filter(|store| {
            let chain = kurv_core::matching::normalize_label(&store.chain);
            !excluded
                .iter()
                .any(|e| chain.contains(e.as_str()) || e.contains(chain.as_str()))
        })
        .cloned()
        .collect()
}

/// Distinct chain labels among the stores, dedup by normalized form, in
/// first-seen order.
fn distinct_chains(stores: &[StoreLocation]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut chains = Vec::new();
    for store in stores {
        let normalized = kurv_core::matching::normalize_label(&store.chain);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized) {
            chains.push(store.chain.clone());
        }
    }
    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurv_core::Coordinates;

    fn store(chain: &str, distance: f64) -> StoreLocation {
        StoreLocation {
            id: format!("{}-{distance}", chain.to_lowercase()),
            name: chain.to_string(),
            chain: chain.to_string(),
            address: None,
            coordinates: Coordinates { lat: 55.68, lng: 12.57 },
            distance_from_user_m: distance,
        }
    }

    #[test]
    fn distance_filter_drops_far_stores() {
        let stores = vec![store("Netto", 400.0), store("Føtex", 2600.0)];
        let options = OptimizeOptions {
            max_distance_m: Some(2000.0),
            ..OptimizeOptions::default()
        };
        let kept = filter_stores(&stores, &options);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chain, "Netto");
    }

    #[test]
    fn excluded_chains_match_by_normalized_containment() {
        let stores = vec![store("REMA_1000", 400.0), store("Netto", 500.0)];
        let options = OptimizeOptions {
            excluded_chains: vec!["rema 1000".to_string()],
            ..OptimizeOptions::default()
        };
        let kept = filter_stores(&stores, &options);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chain, "Netto");
    }

    #[test]
    fn distinct_chains_dedup_by_normalized_label() {
        let stores = vec![
            store("Netto", 100.0),
            store("NETTO", 200.0),
            store("Føtex", 300.0),
        ];
        let chains = distinct_chains(&stores);
        assert_eq!(chains, vec!["Netto".to_string(), "Føtex".to_string()]);
    }
}
