use std::fmt::Display;
use std::hash::Hash;

use crate::cnf::CnfGrammar;
use crate::error::ParseError;
use crate::table::RecognitionTable;
use crate::tree::{DerivationTree, Span};

/// Reconstructs one derivation tree from a populated recognition table.
///
/// Iteration order is fixed so the output is reproducible: ascending split
/// point, then the target head's binary bodies in grammar declaration
/// order; the first consistent choice wins. Ambiguous sentences therefore
/// always yield the same tree.
pub(crate) struct DerivationBuilder<'a, N: Hash + Eq, T: Hash + Eq> {
    grammar: &'a CnfGrammar<N, T>,
    table: &'a RecognitionTable<N>,
    tokens: &'a [T],
}

impl<'a, N, T> DerivationBuilder<'a, N, T>
where
    N: Hash + Eq + Clone + Display,
    T: Hash + Eq + Clone,
{
    pub(crate) fn new(
        grammar: &'a CnfGrammar<N, T>,
        table: &'a RecognitionTable<N>,
        tokens: &'a [T],
    ) -> Self {
        Self {
            grammar,
            table,
            tokens,
        }
    }

    pub(crate) fn build(&self) -> Result<Option<DerivationTree<N, T>>, ParseError> {
        let top = self.tokens.len() - 1;
        if !self.table.contains(0, top, self.grammar.start()) {
            return Ok(None);
        }
        self.node(self.grammar.start(), 0, top).map(Some)
    }

    fn node(&self, symbol: &N, i: usize, j: usize) -> Result<DerivationTree<N, T>, ParseError> {
        if i == j {
            return self.leaf_chain(symbol, i);
        }
        for k in i..j {
            for (left, right) in self.grammar.binary_rules_of(symbol) {
                if self.table.contains(i, k, left) && self.table.contains(k + 1, j, right) {
                    let children = vec![self.node(left, i, k)?, self.node(right, k + 1, j)?];
                    return Ok(DerivationTree::node(
                        symbol.clone(),
                        Span { start: i, end: j },
                        children,
                    ));
                }
            }
        }
        Err(self.missing(symbol, i, j))
    }

    /// Replays the unit chain recorded during normalization, so the
    /// single-nonterminal steps that unit elimination collapsed reappear
    /// as a spine of single-child nodes above the token leaf.
    fn leaf_chain(&self, symbol: &N, i: usize) -> Result<DerivationTree<N, T>, ParseError> {
        let token = &self.tokens[i];
        let production = match self.grammar.lexical_production(symbol, token) {
            Some(production) => production,
            None => return Err(self.missing(symbol, i, i)),
        };
        let span = Span { start: i, end: i };
        let mut tree = DerivationTree::leaf(token.clone());
        match self.grammar.unit_chain(production) {
            Some(chain) => {
                for head in chain.iter().rev() {
                    tree = DerivationTree::node(head.clone(), span, vec![tree]);
                }
            }
            None => {
                tree = DerivationTree::node(symbol.clone(), span, vec![tree]);
            }
        }
        Ok(tree)
    }

    /// A true verdict with no consistent reconstruction means the table or
    /// the normalized grammar is wrong; surface it, never swallow it.
    fn missing(&self, symbol: &N, start: usize, end: usize) -> ParseError {
        tracing::error!(symbol = %symbol, start, end, "recognition table admits no derivation");
        ParseError::DerivationNotFound {
            symbol: symbol.to_string(),
            start,
            end,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grammar::ContextFreeGrammar;
    use crate::unit::UnitChains;

    #[test]
    fn test_inconsistent_table_is_surfaced() {
        let grammar: ContextFreeGrammar<String, String> = "S -> A B\nA -> a\nB -> b"
            .parse()
            .unwrap();
        let cnf = crate::cnf::to_cnf(&grammar, UnitChains::default());

        // A table claiming membership that the grammar cannot back up.
        let mut table = RecognitionTable::new(1);
        table.insert(0, 0, "S".to_string());
        let tokens = vec!["a".to_string()];

        let err = DerivationBuilder::new(&cnf, &table, &tokens)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::DerivationNotFound {
                symbol: "S".to_string(),
                start: 0,
                end: 0
            }
        );
    }
}
