//! Recommendation assembly.
//!
//! Turns a ranked store list and an optional multi-store route into the
//! final [`RecommendationResult`], with a human-readable justification.

use kurv_core::{Decision, RecommendationResult, RouteCandidate, StoreBasket};

/// Builds the final recommendation from the ranked stores, the optional
/// winning route, and the pre-selected alternatives.
///
/// A route, when present, has already passed the strict-improvement rule
/// against the best single store, so its presence alone decides multi.
#[must_use]
pub fn recommend(
    ranked: &[StoreBasket],
    route: Option<RouteCandidate>,
    alternatives: Vec<StoreBasket>,
) -> RecommendationResult {
    let Some(best_single) = ranked.first() else {
        return RecommendationResult::empty("no stores available");
    };

    if let Some(route) = route {
        let reason = multi_reason(&route, best_single);
        return RecommendationResult {
            decision: Decision::Multi,
            single_store: Some(best_single.clone()),
            multi_store: Some(route),
            reason,
            alternatives,
        };
    }

    RecommendationResult {
        decision: Decision::Single,
        reason: single_reason(best_single),
        single_store: Some(best_single.clone()),
        multi_store: None,
        alternatives,
    }
}

fn single_reason(best: &StoreBasket) -> String {
    let found = best.items_found();
    let total = best.items_found() + best.missing_items.len();
    if best.missing_items.is_empty() {
        format!(
            "{} covers all {} items for {:.2} kr",
            best.store.name, total, best.total_cost
        )
    } else {
        format!(
            "{} covers {} of {} items for {:.2} kr; missing: {}",
            best.store.name,
            found,
            total,
            best.total_cost,
            best.missing_items.join(", ")
        )
    }
}

fn multi_reason(route: &RouteCandidate, best_single: &StoreBasket) -> String {
    let stores: Vec<&str> = route
        .stops
        .iter()
        .filter(|stop| !stop.lines.is_empty())
        .map(|stop| stop.store.name.as_str())
        .collect();
    let stores = stores.join(" and ");

    if route.locked_items_found > best_single.locked_items_found {
        return format!(
            "Splitting across {} satisfies {} pinned items instead of {}",
            stores, route.locked_items_found, best_single.locked_items_found
        );
    }
    if route.items_found > best_single.items_found() {
        return format!(
            "Splitting across {} covers {} items instead of {}",
            stores,
            route.items_found,
            best_single.items_found()
        );
    }
    let percent = if best_single.total_cost > 0.0 {
        route.savings_vs_best_single / best_single.total_cost * 100.0
    } else {
        0.0
    };
    format!(
        "Splitting across {} saves {:.2} kr ({:.0}%) vs {}",
        stores, route.savings_vs_best_single, percent, best_single.store.name
    )
}
