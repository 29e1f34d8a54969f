use serde::{Deserialize, Serialize};

use crate::products::Product;
use crate::stores::StoreLocation;

/// One matched shopping-list item inside a store basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketLine {
    pub product: Product,
    pub quantity: f64,
    /// The shopping-list query this line satisfies.
    pub query: String,
    /// Relevance score the product had under `query` when selected.
    pub score: i32,
    /// Whether this line satisfied a user lock for the item.
    pub lock_satisfied: bool,
}

impl BasketLine {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.product.cost_for(self.quantity)
    }
}

/// A user preference that could not be honored at this store; the basket
/// records what was substituted instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissedPreference {
    pub item_name: String,
    /// The pinned product id, brand, or store the user asked for.
    pub expected: String,
    /// What the basket holds instead, if anything.
    pub substituted: Option<String>,
}

/// Everything one store can offer against the shopping list; the
/// single-store option fed into ranking and route combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreBasket {
    pub store: StoreLocation,
    pub lines: Vec<BasketLine>,
    pub total_cost: f64,
    /// `found / requested`, in `[0, 1]`.
    pub availability: f64,
    pub missing_items: Vec<String>,
    pub missed_preferences: Vec<MissedPreference>,
    /// Count of user-locked items this store actually satisfies.
    pub locked_items_found: usize,
    /// Ranking penalty accumulated from weak matches and missed locks.
    /// Never shown to the user; only biases store ordering.
    pub sorting_penalty: f64,
}

impl StoreBasket {
    /// An empty basket for a store that matched nothing.
    #[must_use]
    pub fn empty(store: StoreLocation, requested: &[String]) -> Self {
        Self {
            store,
            lines: Vec::new(),
            total_cost: 0.0,
            availability: 0.0,
            missing_items: requested.to_vec(),
            missed_preferences: Vec::new(),
            locked_items_found: 0,
            sorting_penalty: 0.0,
        }
    }

    #[must_use]
    pub fn items_found(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn distance_m(&self) -> f64 {
        self.store.distance_from_user_m
    }

    /// Cost plus accumulated ranking penalties; the value the ranking
    /// engine's cost criterion compares.
    #[must_use]
    pub fn penalized_cost(&self) -> f64 {
        self.total_cost + self.sorting_penalty
    }
}
