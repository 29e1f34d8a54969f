use serde::{Deserialize, Serialize};

/// A grocery offer returned by a product provider or the canonical price
/// index, normalized for comparison across chains.
///
/// Ephemeral: lives only for the duration of one search/optimization call.
/// Relevance is never stored on the product itself — scoring wraps products
/// in [`ScoredCandidate`] records instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Provider-assigned opaque id, unique per provider.
    pub id: String,
    pub name: String,
    /// Unit price in the provider's currency; always positive.
    pub price: f64,
    /// Provider's free-text store/vendor label, e.g. `"REMA_1000 Nørrebro"`.
    ///
    /// Products sourced from the canonical price index carry the store's raw
    /// identifier here, which the match resolver treats as a branch-exact tie.
    pub store_label: String,
    /// Provider's chain label, e.g. `"REMA 1000"`. May be empty.
    pub chain_label: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Ingredient/allergen strings as supplied by the provider.
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl Product {
    /// Total cost for `quantity` units of this product.
    #[must_use]
    pub fn cost_for(&self, quantity: f64) -> f64 {
        self.price * quantity
    }
}

/// A product paired with its relevance score for one specific query.
///
/// Lower scores are better; the scorer accumulates cost-like penalties.
/// The same product may carry different scores under different queries, so
/// candidates are always grouped per query, never flattened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub product: Product,
    pub score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(price: f64) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Letmælk 1L".to_string(),
            price,
            store_label: "Netto Østerbro".to_string(),
            chain_label: "Netto".to_string(),
            address: None,
            image_url: None,
            ingredients: vec![],
        }
    }

    #[test]
    fn cost_for_multiplies_price_by_quantity() {
        let product = make_product(8.5);
        let cost = product.cost_for(3.0);
        assert!((cost - 25.5).abs() < f64::EPSILON);
    }

    #[test]
    fn serde_roundtrip_product() {
        let product = make_product(12.95);
        let json = serde_json::to_string(&product).expect("serialize");
        let decoded: Product = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.id, product.id);
        assert_eq!(decoded.name, product.name);
        assert!((decoded.price - product.price).abs() < f64::EPSILON);
    }

    #[test]
    fn product_without_optional_fields_deserializes() {
        let decoded: Product = serde_json::from_str(
            r#"{"id":"x","name":"Æg 10 stk","price":24.0,"store_label":"Bilka","chain_label":"Bilka"}"#,
        )
        .expect("deserialize");
        assert!(decoded.address.is_none());
        assert!(decoded.ingredients.is_empty());
    }
}
