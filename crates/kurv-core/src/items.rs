use serde::{Deserialize, Serialize};

/// One entry on the user's shopping list, as produced by upstream query
/// parsing. Immutable for the duration of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// Free-text item name, already normalized by the caller (e.g. `"mælk"`).
    pub name: String,
    /// Requested quantity; always positive.
    pub quantity: f64,
    /// Exact product id the user pinned for this item, if any.
    #[serde(default)]
    pub locked_product_id: Option<String>,
    /// Brand name the user pinned for this item, if any.
    #[serde(default)]
    pub locked_brand_name: Option<String>,
    /// Store name the user prefers to buy this item at, if any.
    #[serde(default)]
    pub locked_store_name: Option<String>,
}

impl ShoppingItem {
    /// Returns a plain unlocked item.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            locked_product_id: None,
            locked_brand_name: None,
            locked_store_name: None,
        }
    }

    /// Returns `true` if the user pinned a product id, brand, or store for
    /// this item.
    #[must_use]
    pub fn has_lock(&self) -> bool {
        self.locked_product_id.is_some()
            || self.locked_brand_name.is_some()
            || self.locked_store_name.is_some()
    }
}
