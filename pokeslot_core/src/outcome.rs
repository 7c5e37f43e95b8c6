use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::symbols::SymbolCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("board has no cells")]
    EmptyBoard,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("win flags do not match board (claimed small={claimed_small} big={claimed_big})")]
    InconsistentFlags {
        claimed_small: bool,
        claimed_big: bool,
    },
}

/// Rectangular, non-empty grid of symbol codes, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Board(Vec<Vec<SymbolCode>>);

impl Board {
    pub fn new(rows: Vec<Vec<SymbolCode>>) -> Result<Self, OutcomeError> {
        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(OutcomeError::EmptyBoard),
        };
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(OutcomeError::RaggedRow {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        Ok(Self(rows))
    }

    /// Caller guarantees the grid is rectangular and non-empty.
    pub(crate) fn from_grid(rows: Vec<Vec<SymbolCode>>) -> Self {
        debug_assert!(Board::new(rows.clone()).is_ok());
        Self(rows)
    }

    pub fn rows(&self) -> &[Vec<SymbolCode>] {
        &self.0
    }

    pub fn row_count(&self) -> usize {
        self.0.len()
    }

    pub fn column_count(&self) -> usize {
        self.0[0].len()
    }

    pub fn cells(&self) -> impl Iterator<Item = SymbolCode> + '_ {
        self.0.iter().flatten().copied()
    }

    pub fn frequencies(&self) -> BTreeMap<SymbolCode, usize> {
        let mut counts = BTreeMap::new();
        for code in self.cells() {
            *counts.entry(code).or_insert(0) += 1;
        }
        counts
    }

    pub fn into_rows(self) -> Vec<Vec<SymbolCode>> {
        self.0
    }
}

/// `(small_win, big_win)`: some symbol appears exactly twice / exactly three
/// times anywhere on the board. Position plays no part.
pub fn classify_wins(board: &Board) -> (bool, bool) {
    let counts = board.frequencies();
    let small = counts.values().any(|&n| n == 2);
    let big = counts.values().any(|&n| n == 3);
    (small, big)
}

/// One generated board with its classification. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    board: Board,
    small_win: bool,
    big_win: bool,
    bonus: bool,
}

impl Outcome {
    /// Derives the win flags from `board`.
    pub fn classify(board: Board, bonus: bool) -> Self {
        let (small_win, big_win) = classify_wins(&board);
        Self {
            board,
            small_win,
            big_win,
            bonus,
        }
    }

    /// Rebuilds an outcome received from elsewhere, rejecting win flags that
    /// disagree with the board.
    pub fn from_parts(
        board: Board,
        small_win: bool,
        big_win: bool,
        bonus: bool,
    ) -> Result<Self, OutcomeError> {
        let outcome = Self::classify(board, bonus);
        if outcome.small_win != small_win || outcome.big_win != big_win {
            return Err(OutcomeError::InconsistentFlags {
                claimed_small: small_win,
                claimed_big: big_win,
            });
        }
        Ok(outcome)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn small_win(&self) -> bool {
        self.small_win
    }

    pub fn big_win(&self) -> bool {
        self.big_win
    }

    pub fn bonus(&self) -> bool {
        self.bonus
    }

    pub fn into_board(self) -> Board {
        self.board
    }
}
