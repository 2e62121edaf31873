//! Keyword-driven question routing.
//!
//! Classifies an incoming question as portfolio-wide ([`Route::Global`])
//! or about a single store ([`Route::StoreSpecific`]), and global
//! questions further into an intent that decides how context is
//! assembled. Classification is case-insensitive substring matching
//! against fixed Portuguese keyword lists; there is no scoring and no
//! failure mode, since unmatched questions fall through to the
//! store-specific route.

/// Primary routing decision for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Global(GlobalIntent),
    StoreSpecific,
}

/// Sub-intent for portfolio-wide questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalIntent {
    /// Contract expiration dates; answered from aggregated metadata.
    Expiration,
    /// Store areas; answered from aggregated metadata.
    Area,
    /// Anything else portfolio-wide; answered from bounded retrieval.
    General,
}

/// Keywords whose presence marks a question as portfolio-wide.
const GLOBAL_KEYWORDS: &[&str] = &[
    "todos",
    "todas",
    "quantos",
    "quantas",
    "total",
    "geral",
    "shopping",
    "contratos",
];

/// Ordered intent rules for global questions, first match wins.
///
/// The expiration stem is checked before the area stems. A question
/// matching both (rare, but possible) therefore routes to Expiration;
/// the ordering is part of the routing contract and covered by tests.
const INTENT_RULES: &[(&[&str], GlobalIntent)] = &[
    (&["venc"], GlobalIntent::Expiration),
    (&["área", "area"], GlobalIntent::Area),
];

/// Classify a question into its route.
pub fn classify(question: &str) -> Route {
    let lowered = question.to_lowercase();

    let is_global = GLOBAL_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    if !is_global {
        return Route::StoreSpecific;
    }

    for (stems, intent) in INTENT_RULES {
        if stems.iter().any(|stem| lowered.contains(stem)) {
            return Route::Global(*intent);
        }
    }

    Route::Global(GlobalIntent::General)
}
