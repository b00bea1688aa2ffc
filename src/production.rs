use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use itertools::Itertools;
use smallvec::SmallVec;

/// One grammar symbol. The `String`-typed constructors in [`crate::grammar`]
/// decide the variant by rule-head membership: an identifier that never
/// appears as a head is a terminal.
pub enum Symbol<N, T> {
    NonTerminal(N),
    Terminal(T),
}

impl<N: Clone, T: Clone> Clone for Symbol<N, T> {
    fn clone(&self) -> Self {
        match self {
            Symbol::NonTerminal(nt) => Symbol::NonTerminal(nt.clone()),
            Symbol::Terminal(t) => Symbol::Terminal(t.clone()),
        }
    }
}

impl<N: PartialEq, T: PartialEq> PartialEq for Symbol<N, T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Symbol::NonTerminal(snt), Symbol::NonTerminal(ont)) => snt == ont,
            (Symbol::Terminal(st), Symbol::Terminal(ot)) => st == ot,
            _ => false,
        }
    }
}

impl<N: PartialEq + Eq, T: PartialEq + Eq> Eq for Symbol<N, T> {}

impl<N: Hash, T: Hash> Hash for Symbol<N, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Symbol::NonTerminal(nt) => {
                0u8.hash(state);
                nt.hash(state);
            }
            Symbol::Terminal(t) => {
                1u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl<N, T> Symbol<N, T> {
    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_nonterminal(&self) -> Option<&N> {
        match self {
            Symbol::NonTerminal(nt) => Some(nt),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&T> {
        match self {
            Symbol::NonTerminal(_) => None,
            Symbol::Terminal(t) => Some(t),
        }
    }
}

impl<N: Display, T: Display> Display for Symbol<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::NonTerminal(nt) => write!(f, "{}", nt),
            Symbol::Terminal(t) => write!(f, "\"{}\"", t),
        }
    }
}

impl<N: Display, T: Display> Debug for Symbol<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::NonTerminal(nt) => write!(f, "NonTerminal::{}", nt),
            Symbol::Terminal(t) => write!(f, "Terminal::{{ \"{}\" }}", t),
        }
    }
}

/// One right-hand-side alternative for a nonterminal. An empty `rhs` is an
/// epsilon production.
pub struct Production<N, T> {
    pub lhs: N,
    pub rhs: SmallVec<[Symbol<N, T>; 4]>,
}

impl<N: Clone, T: Clone> Clone for Production<N, T> {
    fn clone(&self) -> Self {
        Production {
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
        }
    }
}

impl<N: PartialEq, T: PartialEq> PartialEq for Production<N, T> {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

impl<N: PartialEq + Eq, T: PartialEq + Eq> Eq for Production<N, T> {}

impl<N: Hash, T: Hash> Hash for Production<N, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        self.rhs.hash(state);
    }
}

impl<N, T> Production<N, T> {
    pub fn new(lhs: N, rhs: Vec<Symbol<N, T>>) -> Self {
        Self {
            lhs,
            rhs: rhs.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// True for epsilon productions.
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    pub fn is_nonlexical(&self) -> bool {
        self.rhs.iter().all(Symbol::is_nonterminal)
    }

    pub fn is_lexical(&self) -> bool {
        !self.is_nonlexical()
    }

    /// The target of a unit production (`A -> B`), if this is one.
    pub fn as_unit(&self) -> Option<&N> {
        match self.rhs.as_slice() {
            [Symbol::NonTerminal(nt)] => Some(nt),
            _ => None,
        }
    }

    /// The terminal of a single-terminal production (`A -> "a"`), if this is one.
    pub fn as_lexical(&self) -> Option<&T> {
        match self.rhs.as_slice() {
            [Symbol::Terminal(t)] => Some(t),
            _ => None,
        }
    }

    /// The two nonterminals of a binary CNF production (`A -> B C`), if this is one.
    pub fn as_binary(&self) -> Option<(&N, &N)> {
        match self.rhs.as_slice() {
            [Symbol::NonTerminal(b), Symbol::NonTerminal(c)] => Some((b, c)),
            _ => None,
        }
    }
}

impl<N: Display, T: Display> Display for Production<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.lhs,
            self.rhs.iter().map(|x| x.to_string()).join(" ")
        )
    }
}

impl<N: Display, T: Display> Debug for Production<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn prod(lhs: &str, rhs: Vec<Symbol<String, String>>) -> Production<String, String> {
        Production::new(lhs.to_string(), rhs)
    }

    #[test]
    fn test_classifiers() {
        let unit = prod("A", vec![Symbol::NonTerminal("B".to_string())]);
        assert_eq!(unit.as_unit(), Some(&"B".to_string()));
        assert_eq!(unit.as_lexical(), None);
        assert_eq!(unit.as_binary(), None);

        let lexical = prod("A", vec![Symbol::Terminal("a".to_string())]);
        assert_eq!(lexical.as_lexical(), Some(&"a".to_string()));
        assert!(lexical.is_lexical());
        assert_eq!(lexical.as_unit(), None);

        let binary = prod(
            "A",
            vec![
                Symbol::NonTerminal("B".to_string()),
                Symbol::NonTerminal("C".to_string()),
            ],
        );
        assert_eq!(
            binary.as_binary(),
            Some((&"B".to_string(), &"C".to_string()))
        );
        assert!(binary.is_nonlexical());

        let epsilon = prod("A", vec![]);
        assert!(epsilon.is_empty());
        assert_eq!(epsilon.len(), 0);
    }

    #[test]
    fn test_display() {
        let p = prod(
            "S",
            vec![
                Symbol::NonTerminal("A".to_string()),
                Symbol::Terminal("b".to_string()),
            ],
        );
        assert_eq!(p.to_string(), "S -> A \"b\"");
    }
}
