use std::hash::Hash;
use std::rc::Rc;

use fnv::FnvHashMap;
use indexmap::IndexMap;
use smallvec::smallvec;

use crate::epsilon::eliminate_epsilon;
use crate::grammar::ContextFreeGrammar;
use crate::production::{Production, Symbol};
use crate::unit::{eliminate_units, UnitChains};

/// A grammar in Chomsky normal form, with the query indexes the recognizer
/// and derivation builder run on. Declaration order is preserved in every
/// index so both are deterministic.
pub struct CnfGrammar<N: Hash + Eq, T: Hash + Eq> {
    grammar: ContextFreeGrammar<N, T>,
    binary_rules: Vec<(N, N, N)>,
    binary_by_head: FnvHashMap<N, Vec<(N, N)>>,
    lexical_index: FnvHashMap<T, Vec<N>>,
    unit_chains: UnitChains<N, T>,
}

impl<N: Hash + Eq + Clone, T: Hash + Eq + Clone> CnfGrammar<N, T> {
    pub(crate) fn assemble(
        grammar: ContextFreeGrammar<N, T>,
        unit_chains: UnitChains<N, T>,
    ) -> Self {
        let mut binary_rules = Vec::new();
        let mut binary_by_head: FnvHashMap<N, Vec<(N, N)>> = FnvHashMap::default();
        let mut lexical_index: FnvHashMap<T, Vec<N>> = FnvHashMap::default();
        for prod in grammar.productions() {
            if let Some((left, right)) = prod.as_binary() {
                binary_rules.push((prod.lhs.clone(), left.clone(), right.clone()));
                binary_by_head
                    .entry(prod.lhs.clone())
                    .or_default()
                    .push((left.clone(), right.clone()));
            } else if let Some(terminal) = prod.as_lexical() {
                let heads = lexical_index.entry(terminal.clone()).or_default();
                if !heads.contains(&prod.lhs) {
                    heads.push(prod.lhs.clone());
                }
            }
        }
        Self {
            grammar,
            binary_rules,
            binary_by_head,
            lexical_index,
            unit_chains,
        }
    }

    pub fn grammar(&self) -> &ContextFreeGrammar<N, T> {
        &self.grammar
    }

    pub fn start(&self) -> &N {
        self.grammar.start()
    }

    /// All binary productions `A -> B C`, in declaration order.
    pub fn binary_rules(&self) -> &[(N, N, N)] {
        &self.binary_rules
    }

    /// Binary bodies of `head`, in declaration order.
    pub(crate) fn binary_rules_of(&self, head: &N) -> &[(N, N)] {
        self.binary_by_head
            .get(head)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Heads with a single-terminal production matching `token` exactly.
    pub(crate) fn lexical_heads(&self, token: &T) -> &[N] {
        self.lexical_index
            .get(token)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn lexical_production(
        &self,
        head: &N,
        token: &T,
    ) -> Option<&Rc<Production<N, T>>> {
        self.grammar
            .productions_of(head)
            .iter()
            .find(|p| p.as_lexical() == Some(token))
    }

    pub(crate) fn unit_chain(&self, production: &Production<N, T>) -> Option<&[N]> {
        self.unit_chains.get(production).map(Vec::as_slice)
    }
}

impl CnfGrammar<String, String> {
    /// Runs the whole normalization pipeline: epsilon elimination, unit
    /// elimination, then CNF conversion.
    pub fn from_cfg(grammar: &ContextFreeGrammar<String, String>) -> Self {
        let epsilon_free = eliminate_epsilon(grammar);
        let (unit_free, chains) = eliminate_units(&epsilon_free);
        to_cnf(&unit_free, chains)
    }
}

/// Converts an epsilon-free, unit-free grammar to Chomsky normal form.
///
/// Pass 1 replaces every terminal occurring in a body of length > 1 with a
/// host nonterminal keyed by terminal value, reused across occurrences.
/// Pass 2 rewrites bodies of length > 2 into left-to-right chains of fresh
/// link nonterminals. Fresh names are checked against every existing and
/// previously minted head; the counter lives for one conversion call.
///
/// Malformed input is handled permissively: empty bodies are dropped with a
/// warning and stray unit productions pass through unchanged.
pub fn to_cnf(
    grammar: &ContextFreeGrammar<String, String>,
    chains: UnitChains<String, String>,
) -> CnfGrammar<String, String> {
    let mut counter = 0usize;

    // Pass 1: terminal isolation.
    let mut hosts: IndexMap<String, String> = IndexMap::new();
    let mut isolated: IndexMap<String, Vec<Production<String, String>>> = IndexMap::new();
    for (head, alts) in grammar.rules() {
        let out = isolated.entry(head.clone()).or_default();
        for prod in alts {
            if prod.is_empty() {
                tracing::warn!(head = %head, "dropping malformed empty production");
                continue;
            }
            if prod.len() == 1 {
                // Bare terminals already satisfy CNF; a stray unit
                // production is passed through untouched.
                push_unique(out, (**prod).clone());
                continue;
            }
            let mut rhs = smallvec![];
            for sym in &prod.rhs {
                match sym {
                    Symbol::NonTerminal(nt) => rhs.push(Symbol::NonTerminal(nt.clone())),
                    Symbol::Terminal(t) => {
                        let host = match hosts.get(t) {
                            Some(host) => host.clone(),
                            None => {
                                let name = mint_host(t, grammar, &hosts, &mut counter);
                                hosts.insert(t.clone(), name.clone());
                                name
                            }
                        };
                        rhs.push(Symbol::NonTerminal(host));
                    }
                }
            }
            push_unique(
                out,
                Production {
                    lhs: head.clone(),
                    rhs,
                },
            );
        }
    }
    for (terminal, host) in &hosts {
        isolated.insert(
            host.clone(),
            vec![Production {
                lhs: host.clone(),
                rhs: smallvec![Symbol::Terminal(terminal.clone())],
            }],
        );
    }

    // Pass 2: binarization.
    let mut rules: IndexMap<String, Vec<Production<String, String>>> = IndexMap::new();
    for head in isolated.keys() {
        rules.insert(head.clone(), Vec::new());
    }
    for (head, alts) in &isolated {
        for prod in alts {
            if prod.len() <= 2 {
                push_unique(rules.entry(head.clone()).or_default(), prod.clone());
                continue;
            }
            let mut current = head.clone();
            let mut rest = prod.rhs.as_slice();
            while rest.len() > 2 {
                let link = mint_link(&rules, &mut counter);
                push_unique(
                    rules.entry(current.clone()).or_default(),
                    Production {
                        lhs: current.clone(),
                        rhs: smallvec![rest[0].clone(), Symbol::NonTerminal(link.clone())],
                    },
                );
                rules.entry(link.clone()).or_default();
                current = link;
                rest = &rest[1..];
            }
            push_unique(
                rules.entry(current.clone()).or_default(),
                Production {
                    lhs: current.clone(),
                    rhs: rest.iter().cloned().collect(),
                },
            );
        }
    }

    let cnf = ContextFreeGrammar::from_parts(grammar.start().clone(), rules);
    if !cnf.is_chomsky_normal_form() {
        tracing::warn!("converted grammar is not in strict Chomsky normal form");
    }
    tracing::debug!(
        hosts = hosts.len(),
        productions = cnf.len(),
        "converted grammar to CNF"
    );
    CnfGrammar::assemble(cnf, chains)
}

fn push_unique(out: &mut Vec<Production<String, String>>, prod: Production<String, String>) {
    if !out.contains(&prod) {
        out.push(prod);
    }
}

/// Host nonterminal for an isolated terminal, keyed by terminal value.
fn mint_host(
    terminal: &str,
    grammar: &ContextFreeGrammar<String, String>,
    hosts: &IndexMap<String, String>,
    counter: &mut usize,
) -> String {
    let taken = |name: &String| {
        grammar.is_nonterminal(name) || hosts.values().any(|host| host == name)
    };
    let name = format!("T_{}", terminal);
    if !taken(&name) {
        return name;
    }
    loop {
        let name = format!("T_{}_{}", terminal, counter);
        *counter += 1;
        if !taken(&name) {
            return name;
        }
    }
}

/// Fresh link nonterminal for a binarization chain. `rules` already holds
/// every original head, every host, and every previously minted link.
fn mint_link(
    rules: &IndexMap<String, Vec<Production<String, String>>>,
    counter: &mut usize,
) -> String {
    loop {
        let name = format!("X{}", counter);
        *counter += 1;
        if !rules.contains_key(&name) {
            return name;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(s: &str) -> ContextFreeGrammar<String, String> {
        s.parse().unwrap()
    }

    #[test]
    fn test_long_body_gets_one_link_and_two_binary_rules() {
        let grammar = parse("S -> a b c");
        let cnf = to_cnf(&grammar, UnitChains::default());

        let links: Vec<&String> = cnf
            .grammar()
            .nonterminals()
            .filter(|n| n.starts_with('X'))
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(cnf.binary_rules().len(), 2);
        assert!(cnf.grammar().is_chomsky_normal_form());
    }

    #[test]
    fn test_terminal_hosts_are_reused() {
        let grammar = parse("S -> a a\nA -> a b\nA -> c");
        let cnf = to_cnf(&grammar, UnitChains::default());

        let hosts: Vec<&String> = cnf
            .grammar()
            .nonterminals()
            .filter(|n| n.starts_with("T_"))
            .collect();
        // One host each for `a` and `b`; `A -> c` is already a bare terminal.
        assert_eq!(hosts, vec!["T_a", "T_b"]);

        let s_prods = cnf.grammar().productions_of(&"S".to_string());
        assert_eq!(s_prods[0].to_string(), "S -> T_a T_a");
    }

    #[test]
    fn test_host_names_dodge_existing_heads() {
        let grammar = parse("S -> T_a a\nT_a -> x");
        let cnf = to_cnf(&grammar, UnitChains::default());

        let s_prods = cnf.grammar().productions_of(&"S".to_string());
        assert_eq!(s_prods[0].to_string(), "S -> T_a T_a_0");
        assert_eq!(
            cnf.grammar().productions_of(&"T_a_0".to_string())[0].as_lexical(),
            Some(&"a".to_string())
        );
    }

    #[test]
    fn test_short_bodies_untouched() {
        let grammar = parse("S -> A B\nA -> a\nB -> b");
        let cnf = to_cnf(&grammar, UnitChains::default());
        assert!(cnf.grammar().is_chomsky_normal_form());
        assert_eq!(cnf.grammar().len(), grammar.len());
    }

    #[test]
    fn test_pipeline_idempotent_on_cnf_grammar() {
        let grammar = parse("S -> A B\nA -> a\nB -> b");
        let once = CnfGrammar::from_cfg(&grammar);
        let twice = CnfGrammar::from_cfg(once.grammar());

        assert_eq!(once.grammar().len(), twice.grammar().len());
        let first: Vec<String> = once.grammar().productions().iter().map(|p| p.to_string()).collect();
        let second: Vec<String> = twice.grammar().productions().iter().map(|p| p.to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_empty_body_is_dropped() {
        // Epsilon productions should never reach this stage; when one does,
        // it is discarded instead of aborting the conversion.
        let grammar = parse("S -> a b |");
        let cnf = to_cnf(&grammar, UnitChains::default());
        assert!(cnf.grammar().is_chomsky_normal_form());
        assert_eq!(cnf.grammar().productions_of(&"S".to_string()).len(), 1);
    }

    #[test]
    fn test_stray_unit_production_passes_through() {
        let grammar = parse("S -> A\nA -> a");
        let cnf = to_cnf(&grammar, UnitChains::default());
        let s_prods = cnf.grammar().productions_of(&"S".to_string());
        assert_eq!(s_prods[0].as_unit(), Some(&"A".to_string()));
        assert!(!cnf.grammar().is_chomsky_normal_form());
    }

    #[test]
    fn test_full_pipeline_output_is_cnf() {
        let grammar = parse("S -> A B\nS -> A\nA -> a |\nB -> b c d");
        let cnf = CnfGrammar::from_cfg(&grammar);
        assert!(cnf.grammar().is_chomsky_normal_form());
        assert_eq!(cnf.start(), "S");
    }
}
