//! Variety aggregation: fan searches out across queries and chains, merge
//! the results, and keep track of which query produced which candidate.
//!
//! Every chain present near the user should get a fair chance to be matched,
//! so after the broad per-query searches the aggregator measures per-chain
//! coverage and issues a bounded number of targeted backfill searches for
//! chains that came back sparse. A failed search for one query or chain
//! never aborts the others — it degrades to an empty result and the rest of
//! the harvest proceeds.

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{self, StreamExt};

use kurv_core::matching::normalize_label;
use kurv_core::{Product, QueryMapping};
use kurv_provider::{PriceIndex, ProductProvider, SearchOptions};

/// Fan-out limits for one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Simultaneously in-flight provider searches.
    pub max_concurrent: usize,
    /// Targeted backfill searches per query.
    pub max_targeted_per_query: usize,
    /// A chain with fewer distinct candidates than this is "sparse".
    pub sparse_chain_threshold: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            max_targeted_per_query: 3,
            sparse_chain_threshold: 2,
        }
    }
}

/// The merged outcome of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct VarietyHarvest {
    /// Deduplicated-by-id candidate products, in deterministic merge order.
    pub products: Vec<Product>,
    /// Query → ids of every candidate returned for that query.
    pub query_mapping: QueryMapping,
    /// Ids sourced from the canonical price index; these are pre-curated and
    /// bypass live relevance scoring.
    pub index_product_ids: BTreeSet<String>,
}

/// Collects candidate products for every query with chain diversity.
///
/// Per query: consult the price index when the query is canonical, always
/// issue a live search, then backfill chains that returned fewer than the
/// sparse threshold with targeted `"{chain} {query}"` searches, capped per
/// query. Searches run concurrently up to `config.max_concurrent`; the
/// merge happens in input order so the harvest is deterministic for
/// identical response data.
pub async fn collect_variety<P, I>(
    provider: &P,
    index: &I,
    queries: &[String],
    chains: &[String],
    config: &AggregatorConfig,
) -> VarietyHarvest
where
    P: ProductProvider,
    I: PriceIndex,
{
    // Phase 1: one broad live search per query, plus index consultation.
    let broad: Vec<(usize, Vec<Product>)> =
        run_searches(provider, config, queries.iter().enumerate().map(|(i, q)| {
            (i, q.clone(), SearchOptions::default())
        }))
        .await;

    let mut per_query: BTreeMap<usize, Vec<Product>> = BTreeMap::new();
    for (i, query) in queries.iter().enumerate() {
        let mut merged: Vec<Product> = Vec::new();
        if index.is_canonical(query) {
            merged.extend(
                index
                    .prices_for(query, None)
                    .into_iter()
                    .map(kurv_provider::IndexEntry::into_product),
            );
        }
        per_query.insert(i, merged);
    }
    let mut index_product_ids: BTreeSet<String> = BTreeSet::new();
    for products in per_query.values() {
        for p in products {
            index_product_ids.insert(p.id.clone());
        }
    }
    for (i, products) in broad {
        if let Some(bucket) = per_query.get_mut(&i) {
            bucket.extend(products);
        }
    }

    // Phase 2: targeted backfill for sparse chains.
    let mut targeted_requests: Vec<(usize, String, SearchOptions)> = Vec::new();
    for (i, query) in queries.iter().enumerate() {
        let bucket = per_query.get(&i).map(Vec::as_slice).unwrap_or_default();
        let sparse = sparse_chains(bucket, chains, config.sparse_chain_threshold);
        for chain in sparse.into_iter().take(config.max_targeted_per_query) {
            targeted_requests.push((
                i,
                format!("{chain} {query}"),
                SearchOptions {
                    chain: Some(chain),
                    limit: None,
                },
            ));
        }
    }
    let targeted = run_searches(provider, config, targeted_requests.into_iter()).await;
    for (i, products) in targeted {
        if let Some(bucket) = per_query.get_mut(&i) {
            bucket.extend(products);
        }
    }

    // Merge: global dedup by id, mapping keeps every id seen per query.
    let mut harvest = VarietyHarvest {
        index_product_ids,
        ..VarietyHarvest::default()
    };
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (i, query) in queries.iter().enumerate() {
        let bucket = per_query.remove(&i).unwrap_or_default();
        let ids = harvest.query_mapping.entry(query.clone()).or_default();
        for product in bucket {
            ids.insert(product.id.clone());
            if seen.insert(product.id.clone()) {
                harvest.products.push(product);
            }
        }
    }
    harvest
}

/// Runs the given `(key, query, options)` searches with bounded concurrency,
/// degrading each failure to an empty result. Results come back sorted by
/// key so callers merge deterministically.
async fn run_searches<P, R>(
    provider: &P,
    config: &AggregatorConfig,
    requests: R,
) -> Vec<(usize, Vec<Product>)>
where
    P: ProductProvider,
    R: Iterator<Item = (usize, String, SearchOptions)>,
{
    let mut results: Vec<(usize, Vec<Product>)> = stream::iter(requests)
        .map(|(key, query, options)| async move {
            match provider.search_products(&query, &options).await {
                Ok(products) => (key, products),
                Err(e) => {
                    tracing::warn!(
                        query = %query,
                        chain = options.chain.as_deref().unwrap_or(""),
                        error = %e,
                        "search failed — continuing without its results"
                    );
                    (key, Vec::new())
                }
            }
        })
        .buffer_unordered(config.max_concurrent.max(1))
        .collect()
        .await;
    results.sort_by_key(|(key, _)| *key);
    results
}

/// Chains from `chains` with fewer than `threshold` distinct candidates in
/// `products`, in input order.
fn sparse_chains(products: &[Product], chains: &[String], threshold: usize) -> Vec<String> {
    chains
        .iter()
        .filter(|chain| {
            let chain_n = normalize_label(chain);
            let count = products
                .iter()
                .filter(|p| {
                    let label = {
                        let c = normalize_label(&p.chain_label);
                        if c.is_empty() {
                            normalize_label(&p.store_label)
                        } else {
                            c
                        }
                    };
                    !label.is_empty() && (label.contains(&chain_n) || chain_n.contains(&label))
                })
                .map(|p| p.id.as_str())
                .collect::<BTreeSet<_>>()
                .len();
            count < threshold
        })
        .cloned()
        .collect()
}
