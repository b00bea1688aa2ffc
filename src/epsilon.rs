use std::hash::Hash;

use fnv::FnvHashSet;
use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::grammar::ContextFreeGrammar;
use crate::production::{Production, Symbol};

/// Nonterminals that can derive the empty string, computed by fixpoint
/// iteration: a head is nullable if some alternative is empty or consists
/// entirely of already-nullable nonterminals.
pub(crate) fn nullable_set<N, T>(grammar: &ContextFreeGrammar<N, T>) -> FnvHashSet<N>
where
    N: Hash + Eq + Clone,
    T: Hash + Eq,
{
    let mut nullable = FnvHashSet::default();
    let mut changed = true;
    while changed {
        changed = false;
        for (head, alts) in grammar.rules() {
            if nullable.contains(head) {
                continue;
            }
            let derives_empty = alts.iter().any(|prod| {
                prod.rhs.iter().all(|sym| match sym {
                    Symbol::NonTerminal(nt) => nullable.contains(nt),
                    Symbol::Terminal(_) => false,
                })
            });
            if derives_empty {
                nullable.insert(head.clone());
                changed = true;
            }
        }
    }
    nullable
}

/// Removes epsilon productions. For every non-empty body, every subset of
/// its nullable positions is expanded into a variant with that subset
/// deleted; the variant that would empty the whole body is discarded.
///
/// This emits up to 2^k variants for a body of length k, so input
/// productions are expected to stay short.
///
/// Known limitation: a nullable start symbol loses its ability to derive
/// the empty string. The recognizer compensates by rejecting empty input
/// outright instead of answering incorrectly.
pub fn eliminate_epsilon<N, T>(grammar: &ContextFreeGrammar<N, T>) -> ContextFreeGrammar<N, T>
where
    N: Hash + Eq + Clone,
    T: Hash + Eq + Clone,
{
    let nullable = nullable_set(grammar);
    tracing::debug!(nullable = nullable.len(), "eliminating epsilon productions");

    let mut rules: IndexMap<N, Vec<Production<N, T>>> = IndexMap::new();
    for (head, alts) in grammar.rules() {
        let out = rules.entry(head.clone()).or_default();
        for prod in alts {
            if prod.is_empty() {
                continue;
            }
            let nullable_positions: Vec<usize> = prod
                .rhs
                .iter()
                .enumerate()
                .filter(|(_, sym)| {
                    matches!(sym, Symbol::NonTerminal(nt) if nullable.contains(nt))
                })
                .map(|(i, _)| i)
                .collect();
            for dropped in nullable_positions.iter().copied().powerset() {
                let rhs: SmallVec<[Symbol<N, T>; 4]> = prod
                    .rhs
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !dropped.contains(i))
                    .map(|(_, sym)| sym.clone())
                    .collect();
                if rhs.is_empty() {
                    continue;
                }
                let variant = Production {
                    lhs: head.clone(),
                    rhs,
                };
                if !out.contains(&variant) {
                    out.push(variant);
                }
            }
        }
    }
    ContextFreeGrammar::from_parts(grammar.start().clone(), rules)
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(s: &str) -> ContextFreeGrammar<String, String> {
        s.parse().unwrap()
    }

    #[test]
    fn test_nullable_fixpoint_is_transitive() {
        let grammar = parse("S -> A B\nA ->\nB -> A");
        let nullable = nullable_set(&grammar);
        assert!(nullable.contains("A"));
        assert!(nullable.contains("B"));
        assert!(nullable.contains("S"));
    }

    #[test]
    fn test_terminal_bodies_are_not_nullable() {
        let grammar = parse("S -> A\nA -> a |");
        let nullable = nullable_set(&grammar);
        assert!(nullable.contains("A"));
        assert!(nullable.contains("S"));

        let grammar = parse("S -> a");
        assert!(nullable_set(&grammar).is_empty());
    }

    #[test]
    fn test_variants_cover_nullable_subsets() {
        let grammar = parse("S -> A b A\nA -> a |");
        let stripped = eliminate_epsilon(&grammar);
        assert!(stripped.is_epsilon_free());

        let bodies: Vec<String> = stripped
            .productions_of(&"S".to_string())
            .iter()
            .map(|p| p.to_string())
            .collect();
        // Both A positions are independently deletable.
        assert_eq!(bodies.len(), 4);
        assert!(bodies.contains(&"S -> A \"b\" A".to_string()));
        assert!(bodies.contains(&"S -> \"b\" A".to_string()));
        assert!(bodies.contains(&"S -> A \"b\"".to_string()));
        assert!(bodies.contains(&"S -> \"b\"".to_string()));
    }

    #[test]
    fn test_whole_body_deletion_is_discarded() {
        let grammar = parse("S -> A A\nA -> a |");
        let stripped = eliminate_epsilon(&grammar);
        for prod in stripped.productions() {
            assert!(!prod.is_empty());
        }
        // S -> A A, S -> A (deduplicated across both single-A subsets).
        assert_eq!(stripped.productions_of(&"S".to_string()).len(), 2);
    }

    #[test]
    fn test_start_nullability_is_forfeited() {
        let grammar = parse("S -> A B |\nA -> a\nB -> b");
        let stripped = eliminate_epsilon(&grammar);
        assert!(stripped.is_epsilon_free());
        assert_eq!(stripped.productions_of(&"S".to_string()).len(), 1);
    }

    #[test]
    fn test_epsilon_only_head_keeps_its_key() {
        let grammar = parse("S -> A a\nA ->");
        let stripped = eliminate_epsilon(&grammar);
        assert!(stripped.is_nonterminal(&"A".to_string()));
        assert!(stripped.productions_of(&"A".to_string()).is_empty());
        // S keeps the variant with A dropped.
        let bodies: Vec<String> = stripped
            .productions_of(&"S".to_string())
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert!(bodies.contains(&"S -> \"a\"".to_string()));
    }
}
