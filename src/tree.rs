use std::fmt::{Debug, Display, Formatter};
use std::ops::Index;

use itertools::Itertools;

/// Inclusive range of token positions covered by a derivation node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// One derivation of a token sequence. Leaves are tokens; internal nodes
/// carry the derived nonterminal and the span it covers. Built once by the
/// derivation builder and immutable afterward.
#[derive(Clone)]
pub enum DerivationTree<N, T> {
    Leaf(T),
    Node {
        symbol: N,
        span: Span,
        children: Vec<DerivationTree<N, T>>,
    },
}

impl<N, T> DerivationTree<N, T> {
    pub(crate) fn leaf(token: T) -> Self {
        DerivationTree::Leaf(token)
    }

    pub(crate) fn node(symbol: N, span: Span, children: Vec<Self>) -> Self {
        debug_assert!(!children.is_empty());
        DerivationTree::Node {
            symbol,
            span,
            children,
        }
    }

    pub fn symbol(&self) -> Option<&N> {
        match self {
            DerivationTree::Leaf(_) => None,
            DerivationTree::Node { symbol, .. } => Some(symbol),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            DerivationTree::Leaf(_) => None,
            DerivationTree::Node { span, .. } => Some(*span),
        }
    }

    pub fn children(&self) -> &[Self] {
        match self {
            DerivationTree::Leaf(_) => &[],
            DerivationTree::Node { children, .. } => children,
        }
    }

    pub fn unwrap_leaf(self) -> T {
        match self {
            DerivationTree::Leaf(token) => token,
            DerivationTree::Node { .. } => panic!("called unwrap_leaf on a Node"),
        }
    }

    pub fn unwrap_node(self) -> (N, Span, Vec<Self>) {
        match self {
            DerivationTree::Leaf(_) => panic!("called unwrap_node on a Leaf"),
            DerivationTree::Node {
                symbol,
                span,
                children,
            } => (symbol, span, children),
        }
    }
}

/// Walks a child-index path into the tree; an empty path is the node itself.
impl<N, T> Index<&[usize]> for DerivationTree<N, T> {
    type Output = DerivationTree<N, T>;

    fn index(&self, index: &[usize]) -> &Self::Output {
        if index.is_empty() {
            return self;
        }
        match self {
            DerivationTree::Leaf(_) => panic!("invalid path {:?} into a Leaf", index),
            DerivationTree::Node { children, .. } => children[index[0]].index(&index[1..]),
        }
    }
}

impl<N: Display, T: Display> Display for DerivationTree<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivationTree::Leaf(token) => write!(f, "{}", token),
            DerivationTree::Node {
                symbol, children, ..
            } => {
                write!(
                    f,
                    "({} {})",
                    symbol,
                    children.iter().map(|c| c.to_string()).join(" ")
                )
            }
        }
    }
}

impl<N: Display, T: Display> Debug for DerivationTree<N, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> DerivationTree<String, String> {
        DerivationTree::node(
            "S".to_string(),
            Span { start: 0, end: 1 },
            vec![
                DerivationTree::node(
                    "A".to_string(),
                    Span { start: 0, end: 0 },
                    vec![DerivationTree::leaf("a".to_string())],
                ),
                DerivationTree::node(
                    "B".to_string(),
                    Span { start: 1, end: 1 },
                    vec![DerivationTree::leaf("b".to_string())],
                ),
            ],
        )
    }

    #[test]
    fn test_display_is_an_s_expression() {
        assert_eq!(sample().to_string(), "(S (A a) (B b))");
    }

    #[test]
    fn test_path_indexing() {
        let tree = sample();
        let root: &[usize] = &[];
        assert_eq!(tree[root].symbol(), Some(&"S".to_string()));
        assert_eq!(tree[&[1usize][..]].symbol(), Some(&"B".to_string()));
        assert_eq!(tree[&[1usize][..]].span(), Some(Span { start: 1, end: 1 }));
        assert_eq!(tree[&[0usize, 0][..]].to_string(), "a");
    }

    #[test]
    fn test_span_len() {
        assert_eq!(Span { start: 2, end: 4 }.len(), 3);
        assert_eq!(Span { start: 2, end: 4 }.to_string(), "(2, 4)");
    }
}
