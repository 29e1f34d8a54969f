use std::path::PathBuf;

use crate::relevance::ScoringWeights;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration for the optimizer and its collaborators.
///
/// Every tunable the decision core exposes lives here: the relevance
/// acceptance ceiling, the score-gap override, fan-out limits, retry
/// policy, and route-combination caps.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the live product provider; `None` means fixture-only use.
    pub provider_base_url: Option<String>,
    pub provider_user_agent: String,
    /// Canonical price index file; `None` disables index consultation.
    pub index_path: Option<PathBuf>,
    /// Category rule table file; `None` uses the built-in Danish table.
    pub rules_path: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Simultaneously in-flight provider searches.
    pub max_concurrent_searches: usize,
    /// Targeted backfill searches per query for sparse chains.
    pub max_targeted_per_query: usize,
    pub accept_ceiling: i32,
    pub score_gap_override: i32,
    pub max_stores_per_route: usize,
    /// Single-store candidates fed into route combination.
    pub top_candidates: usize,
    pub max_alternatives: usize,
    pub min_alternative_availability: f64,
    pub alternative_cost_multiple: f64,
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    /// Scoring weights with the configured ceiling and gap override applied.
    #[must_use]
    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights {
            accept_ceiling: self.accept_ceiling,
            gap_override: self.score_gap_override,
            ..ScoringWeights::default()
        }
    }
}
