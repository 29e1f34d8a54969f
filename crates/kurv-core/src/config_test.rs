use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "KURV_ENV"));
}

#[test]
fn empty_env_yields_all_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let config = build_app_config(lookup_from_map(&map)).expect("defaults should build");
    assert_eq!(config.env, Environment::Development);
    assert_eq!(config.http_timeout_secs, 8);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.max_concurrent_searches, 5);
    assert_eq!(config.accept_ceiling, 100);
    assert_eq!(config.score_gap_override, 60);
    assert_eq!(config.max_stores_per_route, 3);
    assert_eq!(config.top_candidates, 5);
    assert_eq!(config.max_alternatives, 6);
    assert!(config.provider_base_url.is_none());
    assert!(config.index_path.is_none());
}

#[test]
fn overrides_are_applied() {
    let mut map = HashMap::new();
    map.insert("KURV_ENV", "production");
    map.insert("KURV_PROVIDER_BASE_URL", "https://api.example.dk");
    map.insert("KURV_MAX_CONCURRENT_SEARCHES", "2");
    map.insert("KURV_ACCEPT_CEILING", "80");
    map.insert("KURV_SCORE_GAP_OVERRIDE", "45");
    let config = build_app_config(lookup_from_map(&map)).expect("config should build");
    assert_eq!(config.env, Environment::Production);
    assert_eq!(
        config.provider_base_url.as_deref(),
        Some("https://api.example.dk")
    );
    assert_eq!(config.max_concurrent_searches, 2);
    assert_eq!(config.accept_ceiling, 80);
    assert_eq!(config.score_gap_override, 45);
}

#[test]
fn invalid_numeric_value_fails() {
    let mut map = HashMap::new();
    map.insert("KURV_MAX_RETRIES", "plenty");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KURV_MAX_RETRIES"),
        "expected InvalidEnvVar(KURV_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn invalid_float_value_fails() {
    let mut map = HashMap::new();
    map.insert("KURV_ALTERNATIVE_COST_MULTIPLE", "one-and-a-half");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KURV_ALTERNATIVE_COST_MULTIPLE"
    ));
}

#[test]
fn scoring_weights_carry_configured_thresholds() {
    let mut map = HashMap::new();
    map.insert("KURV_ACCEPT_CEILING", "90");
    map.insert("KURV_SCORE_GAP_OVERRIDE", "50");
    let config = build_app_config(lookup_from_map(&map)).expect("config should build");
    let weights = config.scoring_weights();
    assert_eq!(weights.accept_ceiling, 90);
    assert_eq!(weights.gap_override, 50);
}
