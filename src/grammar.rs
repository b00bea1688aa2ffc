use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::rc::Rc;
use std::str::FromStr;

use fnv::FnvHashSet;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::GrammarError;
use crate::production::{Production, Symbol};

/// A context-free grammar: a designated start symbol plus an
/// insertion-ordered mapping from rule head to its alternatives.
///
/// Rule order is declaration order throughout; unit elimination and
/// derivation building rely on it for reproducible output. Heads may carry
/// an empty alternative list (they still count as nonterminals), and
/// unreachable nonterminals are never pruned.
#[derive(Clone)]
pub struct ContextFreeGrammar<N: Hash + Eq, T: Hash + Eq> {
    start: N,
    rules: IndexMap<N, Vec<Rc<Production<N, T>>>>,
    productions: Vec<Rc<Production<N, T>>>,
}

impl<N: Hash + Eq, T: Hash + Eq> ContextFreeGrammar<N, T> {
    pub(crate) fn from_parts(start: N, rules: IndexMap<N, Vec<Production<N, T>>>) -> Self {
        let rules: IndexMap<N, Vec<Rc<Production<N, T>>>> = rules
            .into_iter()
            .map(|(head, alts)| (head, alts.into_iter().map(Rc::new).collect()))
            .collect();
        let productions = rules.values().flatten().cloned().collect();
        ContextFreeGrammar {
            start,
            rules,
            productions,
        }
    }

    pub fn start(&self) -> &N {
        &self.start
    }

    /// A symbol is a nonterminal iff it appears as a rule head.
    pub fn is_nonterminal(&self, symbol: &N) -> bool {
        self.rules.contains_key(symbol)
    }

    pub fn is_terminal(&self, symbol: &N) -> bool {
        !self.is_nonterminal(symbol)
    }

    /// Alternatives of `head`, in declaration order. Empty for terminals.
    pub fn productions_of(&self, head: &N) -> &[Rc<Production<N, T>>] {
        self.rules.get(head).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &N> {
        self.rules.keys()
    }

    pub fn rules(&self) -> impl Iterator<Item = (&N, &[Rc<Production<N, T>>])> {
        self.rules.iter().map(|(head, alts)| (head, alts.as_slice()))
    }

    pub fn productions(&self) -> &[Rc<Production<N, T>>] {
        &self.productions
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    pub fn is_epsilon_free(&self) -> bool {
        self.productions.iter().all(|p| !p.is_empty())
    }

    pub fn is_unit_free(&self) -> bool {
        self.productions.iter().all(|p| p.as_unit().is_none())
    }

    pub fn is_binarised(&self) -> bool {
        self.productions.iter().all(|p| p.len() <= 2)
    }

    /// Every production is a single terminal or exactly two nonterminals.
    pub fn is_chomsky_normal_form(&self) -> bool {
        self.productions
            .iter()
            .all(|p| p.as_lexical().is_some() || p.as_binary().is_some())
    }
}

impl<N: Hash + Eq + Clone + Display, T: Hash + Eq + Clone> ContextFreeGrammar<N, T> {
    /// Builds a grammar from an explicit production list, deduplicating
    /// alternatives per head. Fails if `start` is not a rule head.
    pub fn new(start: N, productions: Vec<Production<N, T>>) -> Result<Self, GrammarError> {
        let mut rules: IndexMap<N, Vec<Production<N, T>>> = IndexMap::new();
        for prod in productions {
            let alts = rules.entry(prod.lhs.clone()).or_default();
            if !alts.contains(&prod) {
                alts.push(prod);
            }
        }
        if !rules.contains_key(&start) {
            return Err(GrammarError::UndefinedStartSymbol(start.to_string()));
        }
        Ok(Self::from_parts(start, rules))
    }
}

impl ContextFreeGrammar<String, String> {
    /// Builds a grammar from a head -> alternatives mapping, classifying
    /// each right-hand-side identifier by head membership: anything that
    /// never appears as a head is a terminal.
    pub fn from_rules(
        start: &str,
        rules: &[(&str, &[&[&str]])],
    ) -> Result<Self, GrammarError> {
        let heads: FnvHashSet<&str> = rules.iter().map(|(head, _)| *head).collect();
        let mut rule_map: IndexMap<String, Vec<Production<String, String>>> = IndexMap::new();
        for (head, alts) in rules {
            let entry = rule_map.entry((*head).to_string()).or_default();
            for alt in *alts {
                let rhs = alt
                    .iter()
                    .map(|sym| classify(sym, &heads))
                    .collect::<Vec<_>>();
                let prod = Production::new((*head).to_string(), rhs);
                if !entry.contains(&prod) {
                    entry.push(prod);
                }
            }
        }
        if !rule_map.contains_key(start) {
            return Err(GrammarError::UndefinedStartSymbol(start.to_string()));
        }
        Ok(Self::from_parts(start.to_string(), rule_map))
    }
}

fn classify(symbol: &str, heads: &FnvHashSet<&str>) -> Symbol<String, String> {
    if heads.contains(symbol) {
        Symbol::NonTerminal(symbol.to_string())
    } else {
        Symbol::Terminal(symbol.to_string())
    }
}

/// Line-oriented grammar text:
///
/// ```text
/// # comment
/// S -> NP VP
/// NP -> noun |
/// ```
///
/// `|` separates alternatives and an empty alternative is an epsilon
/// production. The first head is the start symbol; symbols are classified
/// by head membership as in [`ContextFreeGrammar::from_rules`].
impl FromStr for ContextFreeGrammar<String, String> {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut raw: Vec<(String, Vec<Vec<String>>)> = Vec::new();
        for (index, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (head, rest) = line.split_once("->").ok_or_else(|| GrammarError::Syntax {
                line: index + 1,
                reason: "expected `->` after the rule head".to_string(),
            })?;
            let head = head.trim();
            if head.is_empty() || head.contains(char::is_whitespace) {
                return Err(GrammarError::Syntax {
                    line: index + 1,
                    reason: "rule head must be a single identifier".to_string(),
                });
            }
            let alternatives = rest
                .split('|')
                .map(|alt| alt.split_whitespace().map(str::to_string).collect())
                .collect();
            raw.push((head.to_string(), alternatives));
        }

        let start = match raw.first() {
            Some((head, _)) => head.clone(),
            None => {
                return Err(GrammarError::Syntax {
                    line: 0,
                    reason: "grammar has no rules".to_string(),
                })
            }
        };

        let heads: FnvHashSet<&str> = raw.iter().map(|(head, _)| head.as_str()).collect();
        let mut rule_map: IndexMap<String, Vec<Production<String, String>>> = IndexMap::new();
        for (head, alts) in &raw {
            let entry = rule_map.entry(head.clone()).or_default();
            for alt in alts {
                let rhs = alt
                    .iter()
                    .map(|sym| classify(sym, &heads))
                    .collect::<Vec<_>>();
                let prod = Production::new(head.clone(), rhs);
                if !entry.contains(&prod) {
                    entry.push(prod);
                }
            }
        }
        Ok(Self::from_parts(start, rule_map))
    }
}

impl<N: Hash + Eq + Display, T: Hash + Eq + Display> Debug for ContextFreeGrammar<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<N: Hash + Eq + Display, T: Hash + Eq + Display> Display for ContextFreeGrammar<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (head, alts) in self.rules() {
            let body = alts
                .iter()
                .map(|p| {
                    if p.is_empty() {
                        "ε".to_string()
                    } else {
                        p.rhs.iter().map(|s| s.to_string()).join(" ")
                    }
                })
                .join(" | ");
            writeln!(f, "{} -> {}", head, body)?;
        }
        Ok(())
    }
}
