//! Optimization command handlers.
//!
//! These are called from `main` after configuration is loaded. The engine
//! itself degrades gracefully; errors here are setup problems — a missing
//! provider URL, an unreadable fixture file, a malformed index.

use std::path::Path;

use serde::Deserialize;

use kurv_core::{
    AppConfig, Coordinates, Product, RelevanceScorer, RuleTable, ShoppingItem, StoreLocation,
};
use kurv_engine::{OptimizeOptions, Optimizer};
use kurv_provider::{
    HttpProductProvider, ProductProvider, ProviderError, SearchOptions, YamlPriceIndex,
};

/// On-disk shopping list shape.
#[derive(Debug, Deserialize)]
struct ShoppingListFile {
    items: Vec<ShoppingItem>,
    location: Coordinates,
    #[serde(default = "default_radius_km")]
    radius_km: f64,
}

fn default_radius_km() -> f64 {
    2.0
}

/// On-disk store fixture shape; distances are computed from the list's
/// location at load time.
#[derive(Debug, Deserialize)]
struct StoreFixtureFile {
    stores: Vec<StoreFixture>,
}

#[derive(Debug, Deserialize)]
struct StoreFixture {
    id: String,
    name: String,
    chain: String,
    #[serde(default)]
    address: Option<String>,
    lat: f64,
    lng: f64,
}

impl StoreFixture {
    fn into_store_location(self, user: Coordinates) -> StoreLocation {
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

/// On-disk product fixture shape: `responses: {query: [products]}`.
#[derive(Debug, Deserialize)]
struct ProductFixtureFile {
    responses: std::collections::BTreeMap<String, Vec<Product>>,
}

/// Offline provider answering searches from a fixture file. Unknown queries
/// return empty results, like a live provider with no hits.
struct FixtureProvider {
    responses: std::collections::BTreeMap<String, Vec<Product>>,
}

impl ProductProvider for FixtureProvider {
    async fn search_products(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Product>, ProviderError> {
        let mut products = self.responses.get(query).cloned().unwrap_or_default();
        if let Some(chain) = &options.chain {
            products.retain(|p| &p.chain_label == chain);
        }
        if let Some(limit) = options.limit {
            products.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(products)
    }

    async fn get_stores_nearby(
        &self,
        _location: Coordinates,
        _radius_km: f64,
    ) -> Result<Vec<StoreLocation>, ProviderError> {
        Ok(Vec::new())
    }

    async fn get_product_by_id(&self, id: &str) -> Result<Product, ProviderError> {
        self.responses
            .values()
            .flatten()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound { url: id.to_owned() })
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {what} {}: {e}", path.display()))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("malformed {what} {}: {e}", path.display()))
}

fn build_http_provider(config: &AppConfig) -> anyhow::Result<HttpProductProvider> {
    let base_url = config
        .provider_base_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("KURV_PROVIDER_BASE_URL is not set"))?;
    Ok(HttpProductProvider::new(
        base_url,
        config.http_timeout_secs,
        &config.provider_user_agent,
        config.max_retries,
        config.backoff_base_ms,
    )?)
}

fn build_index(config: &AppConfig) -> anyhow::Result<YamlPriceIndex> {
    match &config.index_path {
        Some(path) => Ok(YamlPriceIndex::load(path)?),
        None => Ok(YamlPriceIndex::default()),
    }
}

fn build_scorer(config: &AppConfig) -> anyhow::Result<RelevanceScorer> {
    let rules = match &config.rules_path {
        Some(path) => RuleTable::load(path)?,
        None => RuleTable::danish_default(),
    };
    Ok(RelevanceScorer::new(config.scoring_weights(), rules))
}

/// Run one optimization over the shopping list and print the recommendation
/// as JSON. Stores and products come from fixture files when given,
/// otherwise from the live provider.
pub(crate) async fn run_optimize(
    config: &AppConfig,
    list_path: &Path,
    stores_path: Option<&Path>,
    products_path: Option<&Path>,
    options: &OptimizeOptions,
) -> anyhow::Result<()> {
    let list: ShoppingListFile = load_yaml(list_path, "shopping list")?;

    let stores = match stores_path {
        Some(path) => {
            let fixture: StoreFixtureFile = load_yaml(path, "store fixture")?;
            fixture
                .stores
                .into_iter()
                .map(|s| s.into_store_location(list.location))
                .collect()
        }
        None => {
            let provider = build_http_provider(config)?;
            provider
                .get_stores_nearby(list.location, list.radius_km)
                .await?
        }
    };
    tracing::info!(
        stores = stores.len(),
        radius_km = list.radius_km,
        "resolved nearby stores"
    );

    let index = build_index(config)?;
    let scorer = build_scorer(config)?;
    let result = match products_path {
        Some(path) => {
            let fixture: ProductFixtureFile = load_yaml(path, "product fixture")?;
            let provider = FixtureProvider {
                responses: fixture.responses,
            };
            Optimizer::new(provider, index, scorer, config.clone())
                .calculate_optimal_route(&list.items, &stores, options)
                .await?
        }
        None => {
            let provider = build_http_provider(config)?;
            Optimizer::new(provider, index, scorer, config.clone())
                .calculate_optimal_route(&list.items, &stores, options)
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// List nearby store branches for the list file's location.
pub(crate) async fn run_stores(config: &AppConfig, list_path: &Path) -> anyhow::Result<()> {
    let list: ShoppingListFile = load_yaml(list_path, "shopping list")?;
    let provider = build_http_provider(config)?;
    let stores = provider
        .get_stores_nearby(list.location, list.radius_km)
        .await?;

    if stores.is_empty() {
        println!("no stores within {} km", list.radius_km);
        return Ok(());
    }
    for store in stores {
        println!(
            "{}\t{}\t{:.0} m\t{}",
            store.id,
            store.name,
            store.distance_from_user_m,
            store.address.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
