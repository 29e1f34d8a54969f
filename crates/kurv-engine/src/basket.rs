//! Per-store basket assembly and store ranking.
//!
//! For each candidate store the builder selects the best product per
//! shopping-list item, honoring user locks where possible, and accumulates
//! the basket plus ranking penalties. Ranking across stores follows a strict
//! priority chain: locked items satisfied, availability, penalized cost
//! (with a tolerance before ties), distance.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use kurv_core::matching::{normalize_label, resolve_match_level};
use kurv_core::{
    BasketLine, MatchLevel, MissedPreference, ScoredCandidate, ShoppingItem, StoreBasket,
    StoreLocation,
};

/// Selection and ranking tunables.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Relevance gap at which a more relevant candidate overrides a stronger
    /// match level.
    pub gap_override: i32,
    /// Penalty added to a store's sorting cost when a user lock had to be
    /// substituted.
    pub missed_lock_penalty: f64,
    /// Penalty per item matched only at parent/chain level rather than
    /// branch; biases toward stores with store-specific pricing data.
    pub weak_match_penalty: f64,
    /// Cost difference below which two stores tie on the cost criterion.
    pub cost_tolerance: f64,
    /// Ranked stores fed into route combination.
    pub top_candidates: usize,
    pub max_alternatives: usize,
    pub min_alternative_availability: f64,
    /// Alternatives must cost at most this multiple of the winner's basket.
    pub alternative_cost_multiple: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            gap_override: 60,
            missed_lock_penalty: 25.0,
            weak_match_penalty: 2.0,
            cost_tolerance: 0.01,
            top_candidates: 5,
            max_alternatives: 6,
            min_alternative_availability: 0.5,
            alternative_cost_multiple: 1.5,
        }
    }
}

/// A candidate that matched this store, with its match level resolved.
#[derive(Debug, Clone)]
struct StoreCandidate<'a> {
    candidate: &'a ScoredCandidate,
    level: MatchLevel,
}

/// Assembles one store's basket against the shopping list.
///
/// `candidates_by_query` holds the accepted scored candidates per query,
/// already restricted to each item's query mapping. Items with no candidate
/// matching this store at any level above [`MatchLevel::None`] are recorded
/// as missing.
#[must_use]
pub fn build_store_basket(
    store: &StoreLocation,
    items: &[ShoppingItem],
    candidates_by_query: &BTreeMap<String, Vec<ScoredCandidate>>,
    config: &RankingConfig,
) -> StoreBasket {
    let requested: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
    let mut basket = StoreBasket::empty(store.clone(), &requested);
    basket.missing_items.clear();

    for item in items {
        let matching: Vec<StoreCandidate<'_>> = candidates_by_query
            .get(&item.name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|c| StoreCandidate {
                candidate: c,
                level: resolve_match_level(&c.product, store),
            })
            .filter(|sc| sc.level > MatchLevel::None)
            .collect();

        if matching.is_empty() {
            basket.missing_items.push(item.name.clone());
            if let Some(expected) = lock_description(item) {
                basket.missed_preferences.push(MissedPreference {
                    item_name: item.name.clone(),
                    expected,
                    substituted: None,
                });
            }
            continue;
        }

        let (chosen, lock_satisfied) = select_for_item(item, &matching, store, config);

        if !lock_satisfied {
            if let Some(expected) = lock_description(item) {
                basket.missed_preferences.push(MissedPreference {
                    item_name: item.name.clone(),
                    expected,
                    substituted: Some(chosen.candidate.product.name.clone()),
                });
                basket.sorting_penalty += config.missed_lock_penalty;
            }
        }
        if lock_satisfied {
            basket.locked_items_found += 1;
        }
        if chosen.level < MatchLevel::Branch {
            basket.sorting_penalty += config.weak_match_penalty;
        }

        basket.total_cost += chosen.candidate.product.cost_for(item.quantity);
        basket.lines.push(BasketLine {
            product: chosen.candidate.product.clone(),
            quantity: item.quantity,
            query: item.name.clone(),
            score: chosen.candidate.score,
            lock_satisfied,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    if !items.is_empty() {
        basket.availability = basket.lines.len() as f64 / items.len() as f64;
    }
    basket
}

/// Picks the product for one item: lock resolution first, then
/// best-relevance selection. Returns the choice and whether it satisfied the
/// item's lock.
fn select_for_item<'a, 'b>(
    item: &ShoppingItem,
    matching: &'b [StoreCandidate<'a>],
    store: &StoreLocation,
    config: &RankingConfig,
) -> (&'b StoreCandidate<'a>, bool) {
    if let Some(id) = &item.locked_product_id {
        if let Some(found) = matching.iter().find(|sc| &sc.candidate.product.id == id) {
            return (found, store_lock_holds(item, store));
        }
    } else if let Some(brand) = &item.locked_brand_name {
        let brand_n = normalize_label(brand);
        if let Some(found) = matching
            .iter()
            .find(|sc| normalize_label(&sc.candidate.product.name).contains(&brand_n))
        {
            return (found, store_lock_holds(item, store));
        }
    } else if item.locked_store_name.is_some() {
        // Store-only lock: any best match counts as satisfied when the store
        // itself is the pinned one.
        return (best_by_relevance(matching, config), store_lock_holds(item, store));
    }

    (best_by_relevance(matching, config), false)
}

/// `true` unless the item pins a store and this is not it.
fn store_lock_holds(item: &ShoppingItem, store: &StoreLocation) -> bool {
    match &item.locked_store_name {
        None => true,
        Some(wanted) => {
            let wanted_n = normalize_label(wanted);
            let name_n = normalize_label(&store.name);
            !wanted_n.is_empty() && (name_n.contains(&wanted_n) || wanted_n.contains(&name_n))
        }
    }
}

/// Best-relevance selection: a large relevance gap overrides match level;
/// otherwise higher match level wins; otherwise lower price; finally product
/// id for a deterministic total order.
fn best_by_relevance<'a, 'b>(
    matching: &'b [StoreCandidate<'a>],
    config: &RankingConfig,
) -> &'b StoreCandidate<'a> {
    let mut best = &matching[0];
    for sc in &matching[1..] {
        if compare_candidates(sc, best, config.gap_override) == Ordering::Less {
            best = sc;
        }
    }
    best
}

fn compare_candidates(a: &StoreCandidate<'_>, b: &StoreCandidate<'_>, gap: i32) -> Ordering {
    let score_diff = a.candidate.score - b.candidate.score;
    if score_diff.abs() >= gap {
        return a.candidate.score.cmp(&b.candidate.score);
    }
    b.level
        .cmp(&a.level)
        .then_with(|| a.candidate.product.price.total_cmp(&b.candidate.product.price))
        .then_with(|| a.candidate.product.id.cmp(&b.candidate.product.id))
}

fn lock_description(item: &ShoppingItem) -> Option<String> {
    item.locked_product_id
        .clone()
        .or_else(|| item.locked_brand_name.clone())
        .or_else(|| item.locked_store_name.clone())
}

/// Sorts baskets best-first by the strict ranking chain: locked items
/// satisfied desc, availability desc, penalized cost asc (tolerance before
/// ties), distance asc, store id as the final deterministic tie-break.
pub fn rank_stores(baskets: &mut [StoreBasket], config: &RankingConfig) {
    baskets.sort_by(|a, b| {
        b.locked_items_found
            .cmp(&a.locked_items_found)
            .then_with(|| b.availability.total_cmp(&a.availability))
            .then_with(|| {
                let (ca, cb) = (a.penalized_cost(), b.penalized_cost());
                if (ca - cb).abs() <= config.cost_tolerance {
                    Ordering::Equal
                } else {
                    ca.total_cmp(&cb)
                }
            })
            .then_with(|| a.distance_m().total_cmp(&b.distance_m()))
            .then_with(|| a.store.id.cmp(&b.store.id))
    });
}

/// Runner-up stores worth showing next to the winner: minimum availability,
/// bounded cost multiple of the best basket, one store per chain, capped.
#[must_use]
pub fn select_alternatives(ranked: &[StoreBasket], config: &RankingConfig) -> Vec<StoreBasket> {
    let Some(best) = ranked.first() else {
        return Vec::new();
    };
    let mut chains_seen: BTreeSet<String> = BTreeSet::new();
    chains_seen.insert(normalize_label(&best.store.chain));

    let mut alternatives = Vec::new();
    for basket in &ranked[1..] {
        if alternatives.len() >= config.max_alternatives {
            break;
        }
        if basket.availability < config.min_alternative_availability {
            continue;
        }
        if best.total_cost > 0.0
            && basket.total_cost > best.total_cost * config.alternative_cost_multiple
        {
            continue;
        }
        if !chains_seen.insert(normalize_label(&basket.store.chain)) {
            continue;
        }
        alternatives.push(basket.clone());
    }
    alternatives
}
