//! CNF normalization and CYK recognition for context-free grammars.
//!
//! The pipeline is a chain of pure value transformations:
//! [`ContextFreeGrammar`] -> [`eliminate_epsilon`] -> [`eliminate_units`]
//! -> [`to_cnf`], then a [`CykParser`] fills a [`RecognitionTable`] per
//! sentence and reconstructs one [`DerivationTree`] from it. Nothing is
//! shared or mutated across invocations, so independent sentences can be
//! parsed from independent threads without coordination.

use std::fmt::Display;
use std::hash::Hash;

pub mod cnf;
pub mod epsilon;
pub mod error;
pub mod grammar;
pub mod production;
pub mod table;
pub mod tree;
pub mod unit;

mod derivation;

use crate::derivation::DerivationBuilder;

pub use crate::cnf::{to_cnf, CnfGrammar};
pub use crate::epsilon::eliminate_epsilon;
pub use crate::error::{GrammarError, ParseError};
pub use crate::grammar::ContextFreeGrammar;
pub use crate::production::{Production, Symbol};
pub use crate::table::RecognitionTable;
pub use crate::tree::{DerivationTree, Span};
pub use crate::unit::eliminate_units;

/// CYK recognizer over a grammar in Chomsky normal form.
pub struct CykParser<'g, N: Hash + Eq, T: Hash + Eq> {
    grammar: &'g CnfGrammar<N, T>,
}

impl<'g, N: Hash + Eq + Clone, T: Hash + Eq + Clone> CykParser<'g, N, T> {
    pub fn from_grammar(grammar: &'g CnfGrammar<N, T>) -> Self {
        Self { grammar }
    }

    /// Fills the recognition table bottom-up and reports membership.
    ///
    /// Diagonal cells are seeded by exact token match against the lexical
    /// rules; each longer span is then combined from every split point and
    /// every binary rule. Every derivable nonterminal is recorded per cell
    /// (no early exit), which downstream tree building relies on. Runs in
    /// O(n³ · |binary rules|).
    pub fn recognize<'t>(&self, tokens: &'t [T]) -> Result<Recognition<'g, 't, N, T>, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let n = tokens.len();
        let mut table = RecognitionTable::new(n);

        for (i, token) in tokens.iter().enumerate() {
            for head in self.grammar.lexical_heads(token) {
                table.insert(i, i, head.clone());
            }
        }

        for length in 2..=n {
            for i in 0..=n - length {
                let j = i + length - 1;
                let mut derivable = Vec::new();
                for k in i..j {
                    for (head, left, right) in self.grammar.binary_rules() {
                        if table.contains(i, k, left) && table.contains(k + 1, j, right) {
                            derivable.push(head.clone());
                        }
                    }
                }
                for head in derivable {
                    table.insert(i, j, head);
                }
            }
        }

        tracing::debug!(tokens = n, "filled recognition table");
        Ok(Recognition {
            grammar: self.grammar,
            tokens,
            table,
        })
    }
}

impl<'g, N: Hash + Eq + Clone + Display, T: Hash + Eq + Clone> CykParser<'g, N, T> {
    /// Recognizes `tokens` and reconstructs one derivation. `Ok(None)`
    /// means the sentence was rejected.
    pub fn parse(&self, tokens: &[T]) -> Result<Option<DerivationTree<N, T>>, ParseError> {
        self.recognize(tokens)?.derivation()
    }
}

/// The outcome of one recognition run: the verdict plus the full table,
/// from which derivations can be reconstructed.
pub struct Recognition<'g, 't, N: Hash + Eq, T: Hash + Eq> {
    grammar: &'g CnfGrammar<N, T>,
    tokens: &'t [T],
    table: RecognitionTable<N>,
}

impl<'g, 't, N: Hash + Eq + Clone, T: Hash + Eq + Clone> Recognition<'g, 't, N, T> {
    /// Whether the start symbol derives the whole token sequence.
    pub fn is_member(&self) -> bool {
        self.table
            .contains(0, self.tokens.len() - 1, self.grammar.start())
    }

    pub fn table(&self) -> &RecognitionTable<N> {
        &self.table
    }

    pub fn tokens(&self) -> &[T] {
        self.tokens
    }
}

impl<'g, 't, N, T> Recognition<'g, 't, N, T>
where
    N: Hash + Eq + Clone + Display,
    T: Hash + Eq + Clone,
{
    /// One derivation tree, or `Ok(None)` if the sentence was rejected.
    /// `Err(DerivationNotFound)` indicates an internal inconsistency
    /// between table and grammar, not a rejection.
    pub fn derivation(&self) -> Result<Option<DerivationTree<N, T>>, ParseError> {
        DerivationBuilder::new(self.grammar, &self.table, self.tokens).build()
    }
}

/// Normalizes `grammar` once and parses each sentence against it, returning
/// one derivation per accepted sentence.
pub fn parse_sentences(
    grammar: &ContextFreeGrammar<String, String>,
    sentences: &[Vec<String>],
) -> Result<Vec<Option<DerivationTree<String, String>>>, ParseError> {
    let cnf = CnfGrammar::from_cfg(grammar);
    let parser = CykParser::from_grammar(&cnf);
    sentences.iter().map(|tokens| parser.parse(tokens)).collect()
}
