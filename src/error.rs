use thiserror::Error;

/// Errors raised while constructing or reading a grammar. Any of these
/// aborts the normalization pipeline; no partial grammar is usable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("start symbol `{0}` does not appear as a rule head")]
    UndefinedStartSymbol(String),

    #[error("grammar syntax error on line {line}: {reason}")]
    Syntax { line: usize, reason: String },
}

/// Errors raised by a single parse invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Zero tokens. Raised before the table is allocated; the epsilon
    /// eliminator forfeits start-symbol nullability, so the empty sentence
    /// has no meaningful verdict.
    #[error("cannot parse an empty token sequence")]
    EmptyInput,

    /// Membership was reported true but no consistent split/production
    /// chain exists for `symbol` over tokens `start..=end`. This indicates
    /// a bug in normalization or table filling, not a rejected sentence.
    #[error("no derivation for `{symbol}` over tokens {start}..={end} despite positive membership")]
    DerivationNotFound {
        symbol: String,
        start: usize,
        end: usize,
    },
}
