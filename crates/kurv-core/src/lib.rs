use thiserror::Error;

pub mod app_config;
pub mod baskets;
pub mod config;
pub mod items;
pub mod matching;
pub mod products;
pub mod relevance;
pub mod routes;
pub mod stores;

pub use app_config::{AppConfig, Environment};
pub use baskets::{BasketLine, MissedPreference, StoreBasket};
pub use config::{load_app_config, load_app_config_from_env};
pub use items::ShoppingItem;
pub use matching::{resolve_match_level, MatchLevel};
pub use products::{Product, ScoredCandidate};
pub use relevance::{CategoryRule, RelevanceScorer, RuleTable, ScoringWeights};
pub use routes::{Decision, RecommendationResult, RouteCandidate, RouteStop};
pub use stores::{Coordinates, StoreLocation};

/// Which search produced which candidate: normalized query → product ids
/// returned for it. A flat product list loses the query origin, so the
/// mapping travels alongside the candidates. BTree containers keep
/// iteration deterministic for tie-breaking downstream.
pub type QueryMapping =
    std::collections::BTreeMap<String, std::collections::BTreeSet<String>>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read rule table from {path}: {source}")]
    RuleTableIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule table from {path}: {source}")]
    RuleTableParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
