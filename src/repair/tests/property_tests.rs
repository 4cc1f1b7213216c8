//! Property coverage for the engine's idempotence and do-no-harm
//! contracts, over generated near-program texts shaped like the typo
//! population the resolver targets.

use proptest::prelude::*;

use crate::repair::RepairEngine;
use crate::vocabulary::Vocabulary;

/// Every (namespace, symbol) pair of the builtin vocabulary, minus the
/// ElastiCache anomaly (the literal table normalizes its casing on sight).
fn builtin_pairs() -> Vec<(String, String)> {
    Vocabulary::builtin()
        .entries()
        .flat_map(|(namespace, symbols)| {
            symbols
                .iter()
                .filter(|s| *s != "ElastiCache")
                .map(move |s| (namespace.to_string(), s.clone()))
        })
        .collect()
}

/// The typo classes the cascade exists for: case errors, doubled letters,
/// trailing extra characters. Kind 3 leaves the symbol valid.
fn corrupt(symbol: &str, kind: u8) -> String {
    match kind % 4 {
        0 => symbol.to_lowercase(),
        1 => symbol.to_uppercase(),
        2 => {
            let mut s = symbol.to_string();
            if let Some(last) = symbol.chars().last() {
                s.push(last);
            }
            s
        }
        _ => symbol.to_string(),
    }
}

fn program(parts: &[((String, String), u8)]) -> String {
    let mut imports = String::new();
    let mut body = String::new();
    for (i, ((namespace, symbol), kind)) in parts.iter().enumerate() {
        let written = corrupt(symbol, *kind);
        imports.push_str(&format!("from {} import {}\n", namespace, written));
        body.push_str(&format!("n{} = {}(\"node {}\")\n", i, written, i));
    }
    format!("{}\n{}", imports, body)
}

proptest! {
    #[test]
    fn repair_is_idempotent(
        parts in proptest::collection::vec(
            (proptest::sample::select(builtin_pairs()), any::<u8>()),
            1..6,
        )
    ) {
        let engine = RepairEngine::default();
        let source = program(&parts);
        let once = engine.repair(&source);
        prop_assert_eq!(engine.repair(&once), once);
    }

    #[test]
    fn valid_references_are_never_altered(
        parts in proptest::collection::vec(
            proptest::sample::select(builtin_pairs()),
            1..6,
        )
    ) {
        let engine = RepairEngine::default();
        let untouched: Vec<((String, String), u8)> =
            parts.into_iter().map(|pair| (pair, 3u8)).collect();
        let source = program(&untouched);
        prop_assert_eq!(engine.repair(&source), source);
    }

    #[test]
    fn corrupted_references_resolve_to_vocabulary_symbols(
        parts in proptest::collection::vec(
            (proptest::sample::select(builtin_pairs()), any::<u8>()),
            1..4,
        )
    ) {
        let engine = RepairEngine::default();
        let vocab = Vocabulary::builtin();
        let source = program(&parts);
        let repaired = engine.repair(&source);

        // Whatever the cascade decided, every import of a vocabulary
        // namespace must now reference a valid symbol: the corruption
        // classes above are all within reach of the heuristics.
        for line in repaired.lines() {
            if let Some(rest) = line.strip_prefix("from ") {
                let mut halves = rest.splitn(2, " import ");
                let namespace = halves.next().unwrap_or("");
                let symbol = halves.next().unwrap_or("").trim();
                if let Some(symbols) = vocab.symbols(namespace) {
                    prop_assert!(
                        symbols.iter().any(|s| s == symbol),
                        "unresolved import survived: {}", line
                    );
                }
            }
        }
    }
}
