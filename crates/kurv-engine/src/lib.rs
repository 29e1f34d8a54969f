pub mod aggregate;
pub mod basket;
pub mod combine;
pub mod error;
pub mod optimizer;
pub mod recommend;

pub use aggregate::{collect_variety, AggregatorConfig, VarietyHarvest};
pub use basket::{build_store_basket, rank_stores, select_alternatives, RankingConfig};
pub use combine::{best_route, CombineConfig};
pub use error::EngineError;
pub use optimizer::{OptimizeOptions, Optimizer};
pub use recommend::recommend;
