//! External collaborator contracts.
//!
//! The decision core is generic over these traits so unit tests can drive it
//! with in-memory fixtures and production wires in the HTTP client. Neither
//! trait holds mutable state; implementations must be read-only during one
//! optimization call.

use kurv_core::{Coordinates, Product, StoreLocation};

use crate::error::ProviderError;
use crate::index::IndexEntry;

/// Options for a single provider search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Restrict results to one chain, when the provider supports it.
    pub chain: Option<String>,
    /// Maximum result count; provider default when `None`.
    pub limit: Option<u32>,
}

/// A live grocery product search provider.
#[allow(async_fn_in_trait)]
pub trait ProductProvider {
    /// Searches products by free-text query.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or decoding failure; callers
    /// degrade per-query failures rather than aborting a whole optimization.
    async fn search_products(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Product>, ProviderError>;

    /// Lists store branches within `radius_km` of `location`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or decoding failure.
    async fn get_stores_nearby(
        &self,
        location: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<StoreLocation>, ProviderError>;

    /// Fetches one product by its provider id.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] for unknown ids, or any transport
    /// or decoding failure.
    async fn get_product_by_id(&self, id: &str) -> Result<Product, ProviderError>;
}

/// The canonical price index: pre-vetted prices for normalized grocery
/// concepts, keyed by canonical item name.
pub trait PriceIndex {
    /// Whether `name` maps to a known canonical grocery item.
    fn is_canonical(&self, name: &str) -> bool;

    /// Pre-vetted entries for a canonical item, optionally filtered by chain.
    /// Empty when the item is not canonical.
    fn prices_for(&self, name: &str, chain_filter: Option<&str>) -> Vec<IndexEntry>;
}
