//! Multi-store route combination.
//!
//! Enumerates subsets of the top-ranked single-store options, allocates
//! every shopping item to exactly one store per subset, and keeps the best
//! subset under an ordered comparison. The candidate pool is capped
//! upstream, so brute enumeration stays cheap: at most C(5,2)+C(5,3) = 20
//! subsets at the defaults. A multi-store route must earn its complexity —
//! it is rejected unless it strictly beats the best single store.

use kurv_core::matching::normalize_label;
use kurv_core::{BasketLine, RouteCandidate, RouteStop, ShoppingItem, StoreBasket};

/// Route combination tunables.
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// Maximum stores in one route.
    pub max_stores: usize,
    /// A subset only counts as strictly cheaper when it undercuts by more
    /// than this buffer.
    pub cost_buffer: f64,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            max_stores: 3,
            cost_buffer: 1.0,
        }
    }
}

/// Aggregate numbers an allocation is judged by.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SubsetStats {
    locked_items_found: usize,
    items_found: usize,
    total_cost: f64,
}

/// Finds the best multi-store route over `candidates`, or `None` when no
/// combination beats `best_single`.
///
/// Allocation per item prefers a store that satisfies the item's lock
/// (further preferring the pinned store name), otherwise the store offering
/// the lowest line cost. Subsets are compared by locks satisfied desc,
/// items found desc, then cost asc with the buffer. The winning subset is
/// rejected if fewer than two stores received items, or if it fails the
/// strict-improvement rule against the best single store.
#[must_use]
pub fn best_route(
    candidates: &[StoreBasket],
    items: &[ShoppingItem],
    best_single: &StoreBasket,
    config: &CombineConfig,
) -> Option<RouteCandidate> {
    if candidates.len() < 2 || items.is_empty() {
        return None;
    }

    let max_size = config.max_stores.min(candidates.len());
    let mut best: Option<(SubsetStats, Vec<Vec<BasketLine>>, Vec<usize>)> = None;

    for size in 2..=max_size {
        for subset in k_subsets(candidates.len(), size) {
            let allocation = allocate_items(candidates, &subset, items);
            let stats = stats_for(&allocation);
            let replace = match &best {
                None => true,
                Some((current, _, _)) => beats(&stats, current, config.cost_buffer),
            };
            if replace {
                best = Some((stats, allocation, subset));
            }
        }
    }

    let (stats, allocation, subset) = best?;

    let stops: Vec<RouteStop> = subset
        .iter()
        .zip(allocation)
        .map(|(&idx, lines)| {
            let cost = lines.iter().map(BasketLine::cost).sum();
            RouteStop {
                store: candidates[idx].store.clone(),
                lines,
                cost,
            }
        })
        .collect();

    let route = RouteCandidate {
        total_distance_m: stops.iter().map(|s| s.store.distance_from_user_m).sum(),
        savings_vs_best_single: (best_single.total_cost - stats.total_cost).max(0.0),
        locked_items_found: stats.locked_items_found,
        items_found: stats.items_found,
        total_cost: stats.total_cost,
        stops,
    };

    if route.occupied_stops() < 2 {
        return None;
    }
    if !improves_on_single(&route, best_single, config.cost_buffer) {
        return None;
    }
    Some(route)
}

/// Strict-improvement rule: the route must be better than the best single
/// store on locks or coverage while costing no more, or be strictly cheaper
/// while no worse on either coverage count.
fn improves_on_single(route: &RouteCandidate, single: &StoreBasket, buffer: f64) -> bool {
    let more_locks = route.locked_items_found > single.locked_items_found;
    let more_items = route.items_found > single.items_found();
    let no_worse_cost = route.total_cost <= single.total_cost;
    let cheaper = route.total_cost < single.total_cost - buffer;
    let no_worse_coverage = route.locked_items_found >= single.locked_items_found
        && route.items_found >= single.items_found();

    ((more_locks || more_items) && no_worse_cost) || (cheaper && no_worse_coverage)
}

/// Ordered subset comparison: locks desc, items desc, cost asc with buffer.
/// `a` replaces `b` only when strictly better.
fn beats(a: &SubsetStats, b: &SubsetStats, buffer: f64) -> bool {
    if a.locked_items_found != b.locked_items_found {
        return a.locked_items_found > b.locked_items_found;
    }
    if a.items_found != b.items_found {
        return a.items_found > b.items_found;
    }
    a.total_cost < b.total_cost - buffer
}

/// Allocates every item to exactly one store of the subset. Returns one
/// line list per subset member, in subset order.
fn allocate_items(
    candidates: &[StoreBasket],
    subset: &[usize],
    items: &[ShoppingItem],
) -> Vec<Vec<BasketLine>> {
    let mut allocation: Vec<Vec<BasketLine>> = vec![Vec::new(); subset.len()];

    for item in items {
        // Lines this subset's stores hold for the item, in subset order.
        let offers: Vec<(usize, &BasketLine)> = subset
            .iter()
            .enumerate()
            .filter_map(|(pos, &idx)| {
                candidates[idx]
                    .lines
                    .iter()
                    .find(|line| line.query == item.name)
                    .map(|line| (pos, line))
            })
            .collect();
        if offers.is_empty() {
            continue;
        }

        let chosen = choose_offer(&offers, item, candidates, subset);
        allocation[chosen.0].push(chosen.1.clone());
    }

    allocation
}

/// Lock-satisfying offers win; among those, one at the pinned store name
/// wins. Otherwise the cheapest line, subset order breaking ties.
fn choose_offer<'a>(
    offers: &[(usize, &'a BasketLine)],
    item: &ShoppingItem,
    candidates: &[StoreBasket],
    subset: &[usize],
) -> (usize, &'a BasketLine) {
    let locked: Vec<&(usize, &BasketLine)> =
        offers.iter().filter(|(_, line)| line.lock_satisfied).collect();

    if !locked.is_empty() {
        if let Some(wanted) = &item.locked_store_name {
            let wanted_n = normalize_label(wanted);
            if let Some(found) = locked.iter().find(|(pos, _)| {
                let name_n = normalize_label(&candidates[subset[*pos]].store.name);
                name_n.contains(&wanted_n) || wanted_n.contains(&name_n)
            }) {
                return **found;
            }
        }
        return *locked[0];
    }

    let mut best = offers[0];
    for &offer in &offers[1..] {
        if offer.1.cost() < best.1.cost() {
            best = offer;
        }
    }
    best
}

fn stats_for(allocation: &[Vec<BasketLine>]) -> SubsetStats {
    let mut stats = SubsetStats {
        locked_items_found: 0,
        items_found: 0,
        total_cost: 0.0,
    };
    for lines in allocation {
        for line in lines {
            stats.items_found += 1;
            if line.lock_satisfied {
                stats.locked_items_found += 1;
            }
            stats.total_cost += line.cost();
        }
    }
    stats
}

/// All k-element index subsets of `0..n` in lexicographic order, generated
/// iteratively.
fn k_subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 || k > n {
        return Vec::new();
    }
    let mut subsets = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        subsets.push(indices.clone());
        // Advance to the next combination: bump the rightmost index that can
        // still move, then reset everything after it.
        let mut i = k;
        loop {
            if i == 0 {
                return subsets;
            }
            i -= 1;
            if indices[i] < n - k + i {
                break;
            }
        }
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurv_core::{Coordinates, Product, StoreLocation};

    fn make_store(id: &str, name: &str, distance: f64) -> StoreLocation {
        StoreLocation {
            id: id.to_string(),
            name: name.to_string(),
            chain: name.to_string(),
            address: None,
            coordinates: Coordinates { lat: 55.68, lng: 12.57 },
            distance_from_user_m: distance,
        }
    }

    fn line(query: &str, price: f64, lock_satisfied: bool) -> BasketLine {
        BasketLine {
            product: Product {
                id: format!("{query}-{price}"),
                name: query.to_string(),
                price,
                store_label: String::new(),
                chain_label: String::new(),
                address: None,
                image_url: None,
                ingredients: vec![],
            },
            quantity: 1.0,
            query: query.to_string(),
            score: -40,
            lock_satisfied,
        }
    }

    fn basket(id: &str, lines: Vec<BasketLine>, total_items: usize) -> StoreBasket {
        #[allow(clippy::cast_precision_loss)]
        let availability = if total_items == 0 {
            0.0
        } else {
            lines.len() as f64 / total_items as f64
        };
        let total_cost = lines.iter().map(BasketLine::cost).sum();
        let locked_items_found = lines.iter().filter(|l| l.lock_satisfied).count();
        StoreBasket {
            store: make_store(id, id, 500.0),
            lines,
            total_cost,
            availability,
            missing_items: vec![],
            missed_preferences: vec![],
            locked_items_found,
            sorting_penalty: 0.0,
        }
    }

    fn items(names: &[&str]) -> Vec<ShoppingItem> {
        names.iter().map(|n| ShoppingItem::new(*n, 1.0)).collect()
    }

    // -----------------------------------------------------------------------
    // subset generation
    // -----------------------------------------------------------------------

    #[test]
    fn k_subsets_counts_match_binomials() {
        assert_eq!(k_subsets(5, 2).len(), 10);
        assert_eq!(k_subsets(5, 3).len(), 10);
        assert_eq!(k_subsets(4, 4).len(), 1);
        assert!(k_subsets(3, 4).is_empty());
        assert!(k_subsets(3, 0).is_empty());
    }

    #[test]
    fn k_subsets_lexicographic_and_distinct() {
        let subsets = k_subsets(4, 2);
        assert_eq!(
            subsets,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3],
            ]
        );
    }

    // -----------------------------------------------------------------------
    // route selection
    // -----------------------------------------------------------------------

    #[test]
    fn complementary_stores_combine_to_full_coverage() {
        // Each store covers half of 4 items; combined they cover all 4 and
        // undercut the partial best single.
        let shopping = items(&["mælk", "æg", "rugbrød", "smør"]);
        let a = basket(
            "a",
            vec![line("mælk", 8.0, false), line("æg", 20.0, false)],
            4,
        );
        let b = basket(
            "b",
            vec![line("rugbrød", 15.0, false), line("smør", 18.0, false)],
            4,
        );
        let candidates = vec![a.clone(), b];
        let route = best_route(&candidates, &shopping, &a, &CombineConfig::default())
            .expect("complementary stores should combine");

        assert_eq!(route.items_found, 4);
        assert_eq!(route.occupied_stops(), 2);
        assert!((route.total_cost - 61.0).abs() < 1e-9);
    }

    #[test]
    fn items_go_to_the_cheaper_store() {
        let shopping = items(&["mælk", "æg"]);
        let a = basket(
            "a",
            vec![line("mælk", 8.0, false), line("æg", 25.0, false)],
            2,
        );
        let b = basket(
            "b",
            vec![line("mælk", 12.0, false), line("æg", 18.0, false)],
            2,
        );
        let candidates = vec![a.clone(), b];
        let allocation = allocate_items(&candidates, &[0, 1], &shopping);
        assert_eq!(allocation[0].len(), 1, "store a should get mælk");
        assert_eq!(allocation[1].len(), 1, "store b should get æg");
        assert!((allocation[0][0].cost() - 8.0).abs() < 1e-9);
        assert!((allocation[1][0].cost() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn lock_satisfying_store_wins_allocation_even_when_pricier() {
        let mut shopping = items(&["mælk"]);
        shopping[0].locked_product_id = Some("pinned".to_string());
        let a = basket("a", vec![line("mælk", 6.0, false)], 1);
        let b = basket("b", vec![line("mælk", 14.0, true)], 1);
        let candidates = vec![a, b];
        let allocation = allocate_items(&candidates, &[0, 1], &shopping);
        assert!(allocation[0].is_empty());
        assert_eq!(allocation[1].len(), 1);
        assert!(allocation[1][0].lock_satisfied);
    }

    #[test]
    fn single_occupied_stop_is_rejected() {
        // Store a dominates every item; the "combination" collapses to one
        // store and must be rejected.
        let shopping = items(&["mælk", "æg"]);
        let a = basket(
            "a",
            vec![line("mælk", 8.0, false), line("æg", 18.0, false)],
            2,
        );
        let b = basket(
            "b",
            vec![line("mælk", 12.0, false), line("æg", 25.0, false)],
            2,
        );
        let candidates = vec![a.clone(), b];
        assert!(best_route(&candidates, &shopping, &a, &CombineConfig::default()).is_none());
    }

    #[test]
    fn route_not_better_than_single_is_rejected() {
        // Both stores full coverage; split saves nothing beyond the buffer.
        let shopping = items(&["mælk", "æg"]);
        let a = basket(
            "a",
            vec![line("mælk", 8.0, false), line("æg", 18.0, false)],
            2,
        );
        let b = basket(
            "b",
            vec![line("mælk", 7.8, false), line("æg", 18.1, false)],
            2,
        );
        let candidates = vec![a.clone(), b];
        assert!(best_route(&candidates, &shopping, &a, &CombineConfig::default()).is_none());
    }

    #[test]
    fn returned_route_never_regresses_on_both_coverage_and_cost() {
        let shopping = items(&["mælk", "æg", "rugbrød"]);
        let full = basket(
            "full",
            vec![
                line("mælk", 10.0, false),
                line("æg", 20.0, false),
                line("rugbrød", 15.0, false),
            ],
            3,
        );
        let partial_a = basket("pa", vec![line("mælk", 9.0, false)], 3);
        let partial_b = basket("pb", vec![line("æg", 19.0, false)], 3);
        let candidates = vec![full.clone(), partial_a, partial_b];
        if let Some(route) = best_route(&candidates, &shopping, &full, &CombineConfig::default()) {
            let coverage_worse = route.items_found <= full.items_found()
                && route.locked_items_found <= full.locked_items_found;
            let cost_worse = route.total_cost >= full.total_cost;
            assert!(
                !(coverage_worse && cost_worse),
                "rejection rule bypassed: {route:?}"
            );
        }
    }

    #[test]
    fn coverage_gain_at_higher_cost_is_rejected() {
        let shopping = items(&["mælk", "æg", "rugbrød"]);
        // Split covers 3 items but costs far more than single's 2-item
        // basket; extra coverage alone does not justify the route.
        let single = basket(
            "s",
            vec![line("mælk", 8.0, false), line("æg", 18.0, false)],
            3,
        );
        let a = basket(
            "a",
            vec![line("mælk", 9.0, false), line("æg", 19.0, false)],
            3,
        );
        let b = basket("b", vec![line("rugbrød", 40.0, false)], 3);
        let candidates = vec![a, b];
        // 3 items at 68.0 vs single's 2 items at 26.0: more coverage but not
        // cheaper, so the no-worse-cost arm fails and the route is rejected.
        assert!(best_route(&candidates, &shopping, &single, &CombineConfig::default()).is_none());
    }
}
