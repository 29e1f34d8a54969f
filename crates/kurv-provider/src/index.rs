//! File-backed canonical price index.
//!
//! The index maps normalized grocery concepts ("mælk") to curated per-store
//! price entries. Entries are pre-vetted, so the engine treats them as
//! trusted candidates that bypass live relevance scoring. A background job
//! maintains the file; this module only reads it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use kurv_core::{matching::normalize_label, Product};

use crate::error::ProviderError;
use crate::provider::PriceIndex;

/// One curated price entry for a canonical item at a specific store branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    /// Store graph id of the branch this price was verified at.
    pub store_id: String,
    pub chain_label: String,
}

impl IndexEntry {
    /// Converts to a [`Product`]. The store graph id becomes the product's
    /// store label, which the match resolver recognizes as a branch-exact tie.
    #[must_use]
    pub fn into_product(self) -> Product {
        Product {
            id: self.product_id,
            name: self.name,
            price: self.price,
            store_label: self.store_id,
            chain_label: self.chain_label,
            address: None,
            image_url: None,
            ingredients: vec![],
        }
    }
}

/// YAML file shape: `canonical_items: {name: [entries]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexFile {
    canonical_items: BTreeMap<String, Vec<IndexEntry>>,
}

/// In-memory canonical price index loaded from a YAML file.
#[derive(Debug, Clone, Default)]
pub struct YamlPriceIndex {
    items: BTreeMap<String, Vec<IndexEntry>>,
}

impl YamlPriceIndex {
    /// Loads the index from a YAML file, normalizing item keys.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::IndexIo`] if the file cannot be read and
    /// [`ProviderError::IndexParse`] if it is not valid index YAML.
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ProviderError::IndexIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ProviderError::IndexParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parses index YAML. Keys are normalized so lookups are
    /// case/whitespace-insensitive.
    ///
    /// # Errors
    ///
    /// Returns the underlying YAML error for malformed input.
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let file: IndexFile = serde_yaml::from_str(raw)?;
        let items = file
            .canonical_items
            .into_iter()
            .map(|(k, v)| (normalize_label(&k), v))
            .collect();
        Ok(Self { items })
    }
}

impl PriceIndex for YamlPriceIndex {
    fn is_canonical(&self, name: &str) -> bool {
        self.items.contains_key(&normalize_label(name))
    }

    fn prices_for(&self, name: &str, chain_filter: Option<&str>) -> Vec<IndexEntry> {
        let Some(entries) = self.items.get(&normalize_label(name)) else {
            return Vec::new();
        };
        match chain_filter {
            None => entries.clone(),
            Some(chain) => {
                let chain = normalize_label(chain);
                entries
                    .iter()
                    .filter(|e| normalize_label(&e.chain_label) == chain)
                    .cloned()
                    .collect()
            }
        }
    }
}
