use std::fmt::{Display, Formatter};
use std::hash::Hash;

use indexmap::IndexSet;
use itertools::Itertools;
use unicode_width::UnicodeWidthStr;

/// The triangular CYK recognition table over `len` tokens. Cell `(i, j)`
/// (inclusive offsets, `i <= j`) holds every nonterminal that derives
/// exactly `tokens[i..=j]`.
///
/// Allocated once per parse, filled bottom-up by the recognizer, read-only
/// afterward. Cells preserve first-insertion order.
pub struct RecognitionTable<N: Hash + Eq> {
    len: usize,
    cells: Vec<IndexSet<N>>,
}

impl<N: Hash + Eq> RecognitionTable<N> {
    pub(crate) fn new(len: usize) -> Self {
        debug_assert!(len > 0);
        let cells = (0..len * (len + 1) / 2).map(|_| IndexSet::new()).collect();
        Self { len, cells }
    }

    /// Number of tokens the table spans.
    pub fn len(&self) -> usize {
        self.len
    }

    // Row-major upper triangle: row i starts after the len, len-1, ...
    // cells of the rows above it.
    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(
            i <= j && j < self.len,
            "cell ({}, {}) outside table over {} tokens",
            i,
            j,
            self.len
        );
        i * (2 * self.len - i + 1) / 2 + (j - i)
    }

    pub fn cell(&self, i: usize, j: usize) -> &IndexSet<N> {
        &self.cells[self.offset(i, j)]
    }

    pub fn contains(&self, i: usize, j: usize, symbol: &N) -> bool {
        self.cell(i, j).contains(symbol)
    }

    pub(crate) fn insert(&mut self, i: usize, j: usize, symbol: N) -> bool {
        let index = self.offset(i, j);
        self.cells[index].insert(symbol)
    }
}

fn format_cell<N: Hash + Eq + Display>(cell: &IndexSet<N>) -> String {
    if cell.is_empty() {
        return "∅".to_string();
    }
    format!("{{{}}}", cell.iter().map(|n| n.to_string()).sorted().join(", "))
}

impl<N: Hash + Eq + Display> Display for RecognitionTable<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut widths = vec![0usize; self.len];
        for j in 0..self.len {
            for i in 0..=j {
                widths[j] = widths[j].max(format_cell(self.cell(i, j)).width());
            }
        }
        for i in 0..self.len {
            let row = (0..self.len)
                .map(|j| {
                    let content = if j >= i {
                        format_cell(self.cell(i, j))
                    } else {
                        String::new()
                    };
                    let pad = widths[j] - content.width();
                    format!("{}{}", content, " ".repeat(pad))
                })
                .join(" | ");
            writeln!(f, "| {} |", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_triangular_indexing() {
        let mut table: RecognitionTable<String> = RecognitionTable::new(3);
        assert_eq!(table.len(), 3);
        // (0,0) (0,1) (0,2) (1,1) (1,2) (2,2)
        assert_eq!(table.offset(0, 0), 0);
        assert_eq!(table.offset(0, 2), 2);
        assert_eq!(table.offset(1, 1), 3);
        assert_eq!(table.offset(2, 2), 5);

        assert!(table.insert(1, 2, "A".to_string()));
        assert!(!table.insert(1, 2, "A".to_string()));
        assert!(table.contains(1, 2, &"A".to_string()));
        assert!(!table.contains(0, 2, &"A".to_string()));
        assert_eq!(table.cell(1, 2).len(), 1);
    }

    #[test]
    #[should_panic(expected = "outside table")]
    fn test_lower_triangle_is_rejected() {
        let table: RecognitionTable<String> = RecognitionTable::new(3);
        table.cell(2, 1);
    }

    #[test]
    fn test_display_marks_empty_cells() {
        let mut table: RecognitionTable<String> = RecognitionTable::new(2);
        table.insert(0, 0, "B".to_string());
        table.insert(0, 0, "A".to_string());
        let rendered = table.to_string();
        assert!(rendered.contains("{A, B}"));
        assert!(rendered.contains("∅"));
    }
}
