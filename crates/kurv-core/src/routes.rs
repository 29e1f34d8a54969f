use serde::{Deserialize, Serialize};

use crate::baskets::{BasketLine, StoreBasket};
use crate::stores::StoreLocation;

/// One store visit inside a multi-store route, with the items and cost
/// allocated to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub store: StoreLocation,
    pub lines: Vec<BasketLine>,
    pub cost: f64,
}

/// A combination of stores that together cover the shopping list better
/// than any single store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub stops: Vec<RouteStop>,
    pub total_cost: f64,
    pub total_distance_m: f64,
    /// Best-single-store cost minus this route's cost, floored at zero.
    pub savings_vs_best_single: f64,
    pub locked_items_found: usize,
    pub items_found: usize,
}

impl RouteCandidate {
    /// Stores that actually received at least one item.
    #[must_use]
    pub fn occupied_stops(&self) -> usize {
        self.stops.iter().filter(|s| !s.lines.is_empty()).count()
    }
}

/// Whether the recommendation is to shop at one store or split the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Single,
    Multi,
}

/// The optimizer's final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub decision: Decision,
    /// Best single-store basket; `None` only when no store matched anything.
    pub single_store: Option<StoreBasket>,
    /// Best multi-store route, present only when it survived the
    /// strict-improvement rejection rule.
    pub multi_store: Option<RouteCandidate>,
    /// Human-readable justification; presentation detail, not contract.
    pub reason: String,
    /// Runner-up single-store options for display, capped by configuration.
    pub alternatives: Vec<StoreBasket>,
}

impl RecommendationResult {
    /// Structured empty result for no-stores / no-candidates conditions.
    /// These are not errors; the caller always gets a result object.
    #[must_use]
    pub fn empty(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Single,
            single_store: None,
            multi_store: None,
            reason: reason.into(),
            alternatives: Vec::new(),
        }
    }
}
