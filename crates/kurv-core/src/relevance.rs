//! Query/product relevance scoring.
//!
//! Scores express how well a product name satisfies a search query as a
//! cost-like signed integer: lower is better. The single most important rule
//! is the embedded-substring disqualification — a query that occurs only
//! inside a larger word ("æg" in "æggekage") must push the product past the
//! acceptance ceiling, whatever else the name has going for it.
//!
//! Category byproduct tables (which words mark a product as NOT the pure
//! staple the user asked for) are data, not logic: loaded from YAML per
//! deployment/locale, with a compiled-in Danish default.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::normalize_label;
use crate::products::{Product, ScoredCandidate};
use crate::CoreError;

/// Tunable score magnitudes. Lower score is better; penalties are positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Product name equals the query exactly.
    pub exact_bonus: i32,
    /// Query is a prefix of the name, ending at a word boundary.
    pub prefix_bonus: i32,
    /// Query occurs as a standalone word somewhere in the name.
    pub word_bonus: i32,
    /// Query occurs only inside a larger word. Must exceed `accept_ceiling`
    /// on its own so such products are always dropped.
    pub embedded_penalty: i32,
    /// Per matching category disqualifier word found in the name.
    pub disqualifier_penalty: i32,
    /// Query occurs only after a "med"/"with" style preposition.
    pub modifier_penalty: i32,
    /// A category staple marker (plain/raw packaging signal) is present.
    pub staple_bonus: i32,
    /// Per word the name is longer than the query; favors purer names.
    pub per_word_penalty: i32,
    /// Scores above this are dropped before ranking.
    pub accept_ceiling: i32,
    /// Relevance gap at which a more relevant product overrides a stronger
    /// match level during basket selection.
    pub gap_override: i32,
    /// Score assigned to pre-curated price-index candidates, which bypass
    /// live scoring.
    pub index_trusted_score: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_bonus: -100,
            prefix_bonus: -50,
            word_bonus: -30,
            embedded_penalty: 500,
            disqualifier_penalty: 400,
            modifier_penalty: 150,
            staple_bonus: -10,
            per_word_penalty: 2,
            accept_ceiling: 100,
            gap_override: 60,
            index_trusted_score: -80,
        }
    }
}

/// Byproduct/staple word lists for one semantic category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Canonical category name, e.g. `"milk"`.
    pub category: String,
    /// Query terms this rule applies to, in normalized form.
    pub queries: Vec<String>,
    /// Words marking the product as a byproduct or flavored variant rather
    /// than the staple itself.
    #[serde(default)]
    pub disqualifiers: Vec<String>,
    /// Words marking plain/raw staple packaging, rewarded with a small bonus.
    #[serde(default)]
    pub staple_markers: Vec<String>,
}

/// Per-locale category rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    pub categories: Vec<CategoryRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::danish_default()
    }
}

impl RuleTable {
    /// Loads a rule table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RuleTableIo`] if the file cannot be read and
    /// [`CoreError::RuleTableParse`] if it is not valid rule-table YAML.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::RuleTableIo {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| CoreError::RuleTableParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Built-in rule table for the Danish grocery locale.
    #[must_use]
    pub fn danish_default() -> Self {
        let rule = |category: &str, queries: &[&str], disq: &[&str], staple: &[&str]| CategoryRule {
            category: category.to_string(),
            queries: queries.iter().map(|s| (*s).to_string()).collect(),
            disqualifiers: disq.iter().map(|s| (*s).to_string()).collect(),
            staple_markers: staple.iter().map(|s| (*s).to_string()).collect(),
        };
        Self {
            categories: vec![
                rule(
                    "milk",
                    &["mælk", "milk"],
                    &[
                        "kakao",
                        "chokolade",
                        "chocolate",
                        "drik",
                        "drink",
                        "yoghurt",
                        "dessert",
                        "pulver",
                    ],
                    &["økologisk", "1 l", "frisk"],
                ),
                rule(
                    "egg",
                    &["æg", "egg"],
                    &["kage", "cake", "pasta", "nudler", "mayonnaise", "salat"],
                    &["stk", "bakke", "skrabe"],
                ),
                rule(
                    "butter",
                    &["smør", "butter"],
                    &["blandingsprodukt", "cookie", "kiks", "popcorn"],
                    &["saltet", "usaltet"],
                ),
                rule(
                    "juice",
                    &["juice", "appelsinjuice"],
                    &["saftevand", "koncentrat", "pulver", "slik"],
                    &["friskpresset"],
                ),
            ],
        }
    }

    /// Returns the rule covering `query` (already normalized), if any.
    #[must_use]
    pub fn rule_for_query(&self, query: &str) -> Option<&CategoryRule> {
        self.categories
            .iter()
            .find(|rule| rule.queries.iter().any(|q| normalize_label(q) == query))
    }
}

/// Pure relevance scorer: weights plus a category rule table.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    pub weights: ScoringWeights,
    pub rules: RuleTable,
}

impl RelevanceScorer {
    #[must_use]
    pub fn new(weights: ScoringWeights, rules: RuleTable) -> Self {
        Self { weights, rules }
    }

    /// Scores `product_name` against `query`. Lower is better.
    ///
    /// Pure and stable: identical inputs always produce identical scores.
    #[must_use]
    pub fn score(&self, product_name: &str, query: &str) -> i32 {
        let name = normalize_label(product_name);
        let q = normalize_label(query);
        if name.is_empty() || q.is_empty() {
            return self.weights.embedded_penalty;
        }

        let w = &self.weights;
        let mut score = 0i32;

        if name == q {
            score += w.exact_bonus;
        } else if is_boundary_prefix(&name, &q) {
            score += w.prefix_bonus;
        } else if word_occurs(&name, &q) {
            score += w.word_bonus;
            if occurs_only_after_modifier(&name, &q) {
                score += w.modifier_penalty;
            }
        } else if name.contains(&q) {
            // The anti-false-positive rule: "æg" inside "æggekage" must never
            // survive filtering.
            score += w.embedded_penalty;
        }

        if let Some(rule) = self.rules.rule_for_query(&q) {
            for word in &rule.disqualifiers {
                if word_occurs(&name, &normalize_label(word)) {
                    score += w.disqualifier_penalty;
                }
            }
            if rule
                .staple_markers
                .iter()
                .any(|m| word_occurs(&name, &normalize_label(m)))
            {
                score += w.staple_bonus;
            }
        }

        let name_words = name.split_whitespace().count();
        let query_words = q.split_whitespace().count();
        score += w.per_word_penalty
            * i32::try_from(name_words.saturating_sub(query_words)).unwrap_or(i32::MAX);

        score
    }

    /// Returns `true` if `score` passes the acceptance ceiling.
    #[must_use]
    pub fn accepts(&self, score: i32) -> bool {
        score <= self.weights.accept_ceiling
    }

    /// Scores every product against `query` and keeps only accepted ones,
    /// in input order.
    #[must_use]
    pub fn score_candidates(&self, products: &[Product], query: &str) -> Vec<ScoredCandidate> {
        products
            .iter()
            .map(|p| ScoredCandidate {
                product: p.clone(),
                score: self.score(&p.name, query),
            })
            .filter(|c| self.accepts(c.score))
            .collect()
    }
}

/// `true` if `name` starts with `query` followed by a non-word character.
fn word_boundary_regex(query: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(query))).ok()
}

fn is_boundary_prefix(name: &str, query: &str) -> bool {
    name.strip_prefix(query)
        .is_some_and(|rest| rest.starts_with(|c: char| !c.is_alphanumeric()))
}

/// `true` if `query` occurs as a standalone word (or word sequence) in `name`.
fn word_occurs(name: &str, query: &str) -> bool {
    word_boundary_regex(query).is_some_and(|re| re.is_match(name))
}

/// `true` if every standalone occurrence of `query` in `name` directly
/// follows a "with"-style preposition ("havregrød med mælk").
fn occurs_only_after_modifier(name: &str, query: &str) -> bool {
    const MODIFIERS: &[&str] = &["med ", "with ", "m. "];
    let Some(re) = word_boundary_regex(query) else {
        return false;
    };
    let mut any = false;
    for m in re.find_iter(name) {
        any = true;
        let before = &name[..m.start()];
        if !MODIFIERS.iter().any(|prep| before.ends_with(prep)) {
            return false;
        }
    }
    any
}
