use thiserror::Error;

/// Engine-level failures.
///
/// Degraded data (failed sub-searches, empty candidate pools, missing
/// stores) never surfaces here — those conditions produce structured empty
/// results. Only genuinely unexpected faults become errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to serialize cache key material: {0}")]
    CacheKey(#[from] serde_json::Error),
}
