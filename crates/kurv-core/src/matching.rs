//! Product/store identity matching.
//!
//! Providers label the same physical store inconsistently (`"REMA_1000"`,
//! `"REMA 1000 Nørrebro"`, `"Rema"`). This module normalizes both sides and
//! classifies how specifically a product offer is tied to a store branch.

use crate::products::Product;
use crate::stores::StoreLocation;

/// How specifically a product offer is tied to a physical store.
///
/// Ordered: `Branch` is the most specific, `None` means no relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum MatchLevel {
    /// No recognizable relationship.
    None,
    /// Both belong to chains under the same retail holding group.
    ParentGroup,
    /// Same chain banner, branch unknown.
    Chain,
    /// Same physical branch (store-specific label, address overlap, or a
    /// price-index store id tie).
    Branch,
}

/// Retail holding groups and the chain banners they operate. Labels are in
/// normalized form (lowercase, single spaces).
const PARENT_GROUPS: &[(&str, &[&str])] = &[
    ("salling group", &["netto", "bilka", "føtex", "fotex", "salling"]),
    (
        "coop danmark",
        &[
            "kvickly",
            "superbrugsen",
            "dagli'brugsen",
            "brugsen",
            "fakta",
            "coop 365",
            "365discount",
        ],
    ),
    ("reitan", &["rema 1000", "rema"]),
    ("dagrofa", &["meny", "spar", "min købmand", "let-køb"]),
];

/// Normalizes a store/chain label for comparison: underscores become spaces,
/// whitespace collapses to single spaces, everything is lowercased.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the holding group a normalized label belongs to, if any.
fn parent_group_of(normalized: &str) -> Option<&'static str> {
    if normalized.is_empty() {
        return None;
    }
    for (group, members) in PARENT_GROUPS {
        if members.iter().any(|m| normalized.contains(m)) {
            return Some(group);
        }
    }
    None
}

/// Classifies the identity relationship between a product offer and a store.
///
/// Checks, in priority order: branch (store-name equality/containment,
/// address overlap, or a raw store-id tie from the price index), chain
/// (mutual containment of chain labels, so `"REMA 1000"` matches `"REMA"`),
/// parent group (static holding-group table), else [`MatchLevel::None`].
///
/// Total and deterministic: a pure function of the normalized labels and
/// addresses, never fails.
#[must_use]
pub fn resolve_match_level(product: &Product, store: &StoreLocation) -> MatchLevel {
    let label = normalize_label(&product.store_label);
    let store_name = normalize_label(&store.name);

    // Price-index-sourced products carry the store's raw identifier as their
    // store label; that is a branch-exact tie by construction.
    if product.store_label.trim() == store.id.trim() && !store.id.trim().is_empty() {
        return MatchLevel::Branch;
    }

    if !label.is_empty() && !store_name.is_empty() && (label == store_name || label.contains(&store_name))
    {
        return MatchLevel::Branch;
    }

    if let (Some(product_addr), Some(store_addr)) = (&product.address, &store.address) {
        let pa = normalize_label(product_addr);
        let sa = normalize_label(store_addr);
        if !pa.is_empty() && !sa.is_empty() && (pa.contains(&sa) || sa.contains(&pa)) {
            return MatchLevel::Branch;
        }
    }

    // Prefer the explicit chain label; fall back to the store label, which
    // many providers fill with the chain name.
    let product_chain = {
        let c = normalize_label(&product.chain_label);
        if c.is_empty() {
            label.clone()
        } else {
            c
        }
    };
    let store_chain = normalize_label(&store.chain);

    if !product_chain.is_empty()
        && !store_chain.is_empty()
        && (product_chain.contains(&store_chain) || store_chain.contains(&product_chain))
    {
        return MatchLevel::Chain;
    }

    match (parent_group_of(&product_chain), parent_group_of(&store_chain)) {
        (Some(a), Some(b)) if a == b => MatchLevel::ParentGroup,
        _ => MatchLevel::None,
    }
}
