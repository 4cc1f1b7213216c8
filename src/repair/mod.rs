//! The repair engine: rewrites untrusted generated source so every
//! namespaced reference resolves to a valid, correctly-cased symbol.

use log::{info, warn};
use regex::{NoExpand, Regex};
use std::sync::Arc;

use crate::corrections;
use crate::import_scanner;
use crate::similarity;
use crate::vocabulary::Vocabulary;

/// One symbol rewrite the engine performed, for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFix {
    pub namespace: String,
    pub original: String,
    pub resolved: String,
}

/// Deterministic post-processor over generated program text.
///
/// Pure and synchronous: the vocabulary and correction tables are read-only
/// after initialization, every invocation works on its own buffer, and the
/// engine can be shared across threads freely.
#[derive(Debug, Clone)]
pub struct RepairEngine {
    vocabulary: Arc<Vocabulary>,
}

impl RepairEngine {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        RepairEngine { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Repair `source` as far as the tables and heuristics allow.
    ///
    /// Never fails: if the text does not pass the import scan, the literal
    /// and pattern corrections still apply and the rest is left as written.
    /// Unresolvable symbols are deliberately passed through untouched so
    /// the execution failure downstream names the exact bad symbol.
    ///
    /// Repairing already-repaired text is a no-op.
    pub fn repair(&self, source: &str) -> String {
        self.repair_with_report(source).0
    }

    /// Like [`repair`](Self::repair), also returning the symbol rewrites
    /// that were applied.
    pub fn repair_with_report(&self, source: &str) -> (String, Vec<AppliedFix>) {
        let mut text = corrections::apply_corrections(source);

        let references = match import_scanner::scan(&text, &self.vocabulary) {
            Ok(references) => references,
            Err(err) => {
                warn!("import scan unavailable ({}), keeping table fixes only", err);
                return (text, Vec::new());
            }
        };

        let mut applied = Vec::new();
        for reference in references {
            let symbols = match self.vocabulary.symbols(&reference.namespace) {
                Some(symbols) => symbols,
                None => continue,
            };
            if symbols.iter().any(|s| *s == reference.symbol) {
                continue;
            }

            match similarity::resolve(&reference.symbol, symbols) {
                Some(valid) => {
                    info!(
                        "auto-fixing {}: {} -> {}",
                        reference.namespace, reference.symbol, valid
                    );
                    text = replace_whole_identifier(&text, &reference.symbol, valid);
                    applied.push(AppliedFix {
                        namespace: reference.namespace,
                        original: reference.symbol,
                        resolved: valid.to_string(),
                    });
                }
                None => match similarity::near_miss(&reference.symbol, symbols) {
                    Some(close) => warn!(
                        "unresolved symbol '{}' in {} (close to '{}'), leaving as written",
                        reference.symbol, reference.namespace, close
                    ),
                    None => warn!(
                        "unresolved symbol '{}' in {}, leaving as written",
                        reference.symbol, reference.namespace
                    ),
                },
            }
        }

        (text, applied)
    }
}

impl Default for RepairEngine {
    fn default() -> Self {
        RepairEngine::new(Vocabulary::builtin())
    }
}

/// Rewrite every occurrence of `old` as a whole identifier, declaration and
/// usage sites alike. Substrings of longer identifiers are left alone.
fn replace_whole_identifier(text: &str, old: &str, new: &str) -> String {
    // `old` is regex-escaped, so the pattern always compiles.
    match Regex::new(&format!(r"\b{}\b", regex::escape(old))) {
        Ok(pattern) => pattern.replace_all(text, NoExpand(new)).into_owned(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests;
