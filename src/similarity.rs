//! Best-match resolution for unrecognized symbol names.
//!
//! The cascade is deliberately a handful of cheap, explainable heuristics
//! rather than general edit-distance search: model-generated near-misses of
//! a known vocabulary are dominated by case errors, doubled letters, and
//! trailing extra characters.

use log::debug;
use strsim::damerau_levenshtein;

const MAX_DIST: usize = 1;

/// Resolve `name` against the valid symbols of its namespace, in registry
/// order. Tries, stopping at the first success:
///
/// 1. exact match ignoring case;
/// 2. substring containment either direction, ignoring case; the first
///    valid symbol in registry order wins;
/// 3. collapse every maximal run of a repeated character, retry step 1;
/// 4. drop the final character (names longer than two chars), retry step 1.
///
/// `None` means no heuristic matched and the name must be left as written.
pub fn resolve<'a>(name: &str, symbols: &'a [String]) -> Option<&'a str> {
    let name_lower = name.to_lowercase();

    if let Some(symbol) = case_fold_match(&name_lower, symbols) {
        return Some(symbol);
    }

    let contained: Vec<&String> = symbols
        .iter()
        .filter(|symbol| {
            let symbol_lower = symbol.to_lowercase();
            symbol_lower.contains(&name_lower) || name_lower.contains(&symbol_lower)
        })
        .collect();
    if let Some(first) = contained.first() {
        if contained.len() > 1 {
            // Known ambiguity (e.g. PV vs PVC); registry order is the
            // documented tie-break.
            debug!(
                "containment match for '{}' is ambiguous ({:?}), taking '{}'",
                name, contained, first
            );
        }
        return Some(first.as_str());
    }

    let collapsed = collapse_runs(name);
    if collapsed != name {
        if let Some(symbol) = case_fold_match(&collapsed.to_lowercase(), symbols) {
            return Some(symbol);
        }
    }

    if name.chars().count() > 2 {
        let mut chars = name.chars();
        chars.next_back();
        let trimmed = chars.as_str();
        if let Some(symbol) = case_fold_match(&trimmed.to_lowercase(), symbols) {
            return Some(symbol);
        }
    }

    None
}

/// Advisory probe for the diagnostic channel: a valid symbol within
/// Damerau-Levenshtein distance 1 of `name`. Never used for rewriting.
pub fn near_miss<'a>(name: &str, symbols: &'a [String]) -> Option<&'a str> {
    symbols
        .iter()
        .find(|symbol| damerau_levenshtein(symbol, name) <= MAX_DIST)
        .map(|symbol| symbol.as_str())
}

fn case_fold_match<'a>(name_lower: &str, symbols: &'a [String]) -> Option<&'a str> {
    symbols
        .iter()
        .find(|symbol| symbol.to_lowercase() == name_lower)
        .map(|symbol| symbol.as_str())
}

/// Collapse every maximal run of a repeated character to a single
/// occurrence ("Lambdaa" -> "Lambda"). Case-sensitive, like the typo class
/// it targets.
fn collapse_runs(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last = None;
    for c in name.chars() {
        if last != Some(c) {
            out.push(c);
        }
        last = Some(c);
    }
    out
}
