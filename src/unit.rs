use std::hash::Hash;

use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::grammar::ContextFreeGrammar;
use crate::production::Production;

/// Provenance left behind by unit elimination: for every production that
/// was hoisted into a new head, the chain of heads it travelled through,
/// from the importing head down to the original owner.
///
/// The derivation builder replays these chains so that collapsed unit
/// steps reappear as single-child nodes in the tree.
pub type UnitChains<N, T> = FnvHashMap<Production<N, T>, Vec<N>>;

/// Removes unit productions (`A -> B` with `B` a nonterminal).
///
/// Direct unit pairs are closed transitively to a fixpoint; the pair set is
/// finite and each pair is added at most once, so cyclic unit chains
/// terminate. Each head then keeps its own non-unit alternatives and
/// imports the non-unit alternatives of every unit-reachable head,
/// deduplicated in declaration order. Heads left unreachable by this are
/// not pruned.
pub fn eliminate_units<N, T>(
    grammar: &ContextFreeGrammar<N, T>,
) -> (ContextFreeGrammar<N, T>, UnitChains<N, T>)
where
    N: Hash + Eq + Clone,
    T: Hash + Eq + Clone,
{
    let pairs = unit_pairs(grammar);
    tracing::debug!(pairs = pairs.len(), "eliminating unit productions");

    let mut rules: IndexMap<N, Vec<Production<N, T>>> = IndexMap::new();
    let mut chains: UnitChains<N, T> = UnitChains::default();
    for (head, alts) in grammar.rules() {
        let mut out: Vec<Production<N, T>> = alts
            .iter()
            .filter(|p| p.as_unit().is_none())
            .map(|p| (**p).clone())
            .collect();

        for ((from, to), path) in &pairs {
            if from != head {
                continue;
            }
            for prod in grammar.productions_of(to) {
                if prod.as_unit().is_some() {
                    continue;
                }
                let imported = Production {
                    lhs: head.clone(),
                    rhs: prod.rhs.clone(),
                };
                if out.contains(&imported) {
                    continue;
                }
                chains.insert(imported.clone(), path.clone());
                out.push(imported);
            }
        }
        rules.insert(head.clone(), out);
    }

    (
        ContextFreeGrammar::from_parts(grammar.start().clone(), rules),
        chains,
    )
}

/// All pairs `(A, B)` with `A` deriving `B` through unit productions only,
/// each mapped to the head chain `[A, ..., B]` that witnesses it. When
/// several chains exist the first one found in declaration order wins.
fn unit_pairs<N, T>(grammar: &ContextFreeGrammar<N, T>) -> IndexMap<(N, N), Vec<N>>
where
    N: Hash + Eq + Clone,
    T: Hash + Eq,
{
    let mut pairs: IndexMap<(N, N), Vec<N>> = IndexMap::new();
    for (head, alts) in grammar.rules() {
        for prod in alts {
            if let Some(target) = prod.as_unit() {
                pairs
                    .entry((head.clone(), target.clone()))
                    .or_insert_with(|| vec![head.clone(), target.clone()]);
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        let snapshot: Vec<((N, N), Vec<N>)> = pairs
            .iter()
            .map(|(key, path)| (key.clone(), path.clone()))
            .collect();
        for ((a, b), path_ab) in &snapshot {
            for ((b2, c), path_bc) in &snapshot {
                if b2 != b || pairs.contains_key(&(a.clone(), c.clone())) {
                    continue;
                }
                let mut path = path_ab.clone();
                path.extend(path_bc[1..].iter().cloned());
                pairs.insert((a.clone(), c.clone()), path);
                changed = true;
            }
        }
    }
    pairs
}
