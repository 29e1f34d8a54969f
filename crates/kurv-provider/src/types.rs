//! Wire types for the live product provider API, plus conversion into
//! the core domain shapes.

use kurv_core::{Coordinates, Product, StoreLocation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub products: Vec<WireProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresResponse {
    pub stores: Vec<WireStore>,
}

/// A product exactly as the provider returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Provider's free-text store/vendor name; inconsistent across chains.
    pub store: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl From<WireProduct> for Product {
    fn from(wire: WireProduct) -> Self {
        Product {
            id: wire.id,
            name: wire.name,
            price: wire.price,
            store_label: wire.store,
            chain_label: wire.chain,
            address: wire.address,
            image_url: wire.image_url,
            ingredients: wire.ingredients,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireStore {
    pub id: String,
    pub name: String,
    pub chain: String,
    #[serde(default)]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl WireStore {
    /// Converts to a [`StoreLocation`], computing the distance from `user`.
    #[must_use]
    pub fn into_store_location(self, user: Coordinates) -> StoreLocation {
        let coordinates = Coordinates {
            lat: self.lat,
            lng: self.lng,
        };
        StoreLocation {
            id: self.id,
            name: self.name,
            chain: self.chain,
            address: self.address,
            coordinates,
            distance_from_user_m: user.distance_m(&coordinates),
        }
    }
}
