//! Win validation: pure functions from (card, marks, drawn set, target)
//! to a verdict.
//!
//! Nothing in here touches room state. The actor calls
//! [`validate_claim`] with its authoritative drawn set at the moment the
//! claim is processed; whatever the client believes it has marked is
//! only trusted after every marked number checks out against the card
//! and the drawn set.

use std::collections::HashSet;

use bingohall_protocol::{Line, WinPattern};

use crate::card::{CardGrid, GRID_SIZE};

/// The pattern a room's mode requires for a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPattern {
    /// One complete line (row, column, or diagonal), or all four
    /// corners.
    LineOrCorners,
    /// Two distinct complete lines (diagonals count).
    DoubleLine,
    /// Every cell on the card.
    Blackout,
}

/// Validates a claim. Returns the matched pattern, or `None`: there is
/// no partial credit.
///
/// A claim is rejected outright if any reported number is not on the
/// card or not in the drawn set; the free center cell is always treated
/// as marked and must not be reported.
pub fn validate_claim(
    grid: &CardGrid,
    marked_numbers: &[u8],
    drawn: &HashSet<u8>,
    target: TargetPattern,
) -> Option<WinPattern> {
    // (a) Forgery gate: every mark must be a real, drawn card number.
    for &n in marked_numbers {
        if !grid.contains(n) || !drawn.contains(&n) {
            return None;
        }
    }

    let marked: HashSet<u8> = marked_numbers.iter().copied().collect();
    let mask = marked_mask(grid, &marked);

    // (b)/(c) Pattern scan against the target.
    match target {
        TargetPattern::LineOrCorners => {
            if let Some(line) = complete_lines(&mask).into_iter().next() {
                return Some(WinPattern::Line { line });
            }
            if mask[0][0] && mask[0][GRID_SIZE - 1] && mask[GRID_SIZE - 1][0]
                && mask[GRID_SIZE - 1][GRID_SIZE - 1]
            {
                return Some(WinPattern::FourCorners);
            }
            None
        }
        TargetPattern::DoubleLine => {
            let lines = complete_lines(&mask);
            match (lines.first(), lines.get(1)) {
                (Some(&first), Some(&second)) => {
                    Some(WinPattern::DoubleLine { first, second })
                }
                _ => None,
            }
        }
        TargetPattern::Blackout => {
            let all = mask.iter().all(|row| row.iter().all(|&m| m));
            all.then_some(WinPattern::Blackout)
        }
    }
}

/// Cell-level view of a claim: true where the cell is the free center or
/// its number is in the (already vetted) marked set.
fn marked_mask(grid: &CardGrid, marked: &HashSet<u8>) -> [[bool; GRID_SIZE]; GRID_SIZE] {
    let mut mask = [[false; GRID_SIZE]; GRID_SIZE];
    for (row, mask_row) in mask.iter_mut().enumerate() {
        for (col, cell) in mask_row.iter_mut().enumerate() {
            *cell = CardGrid::is_free(row, col) || marked.contains(&grid.at(row, col));
        }
    }
    mask
}

/// All fully-marked lines, rows first, then columns, then diagonals.
fn complete_lines(mask: &[[bool; GRID_SIZE]; GRID_SIZE]) -> Vec<Line> {
    let mut lines = Vec::new();
    for row in 0..GRID_SIZE {
        if (0..GRID_SIZE).all(|col| mask[row][col]) {
            lines.push(Line::Row(row as u8));
        }
    }
    for col in 0..GRID_SIZE {
        if (0..GRID_SIZE).all(|row| mask[row][col]) {
            lines.push(Line::Column(col as u8));
        }
    }
    if (0..GRID_SIZE).all(|i| mask[i][i]) {
        lines.push(Line::MainDiagonal);
    }
    if (0..GRID_SIZE).all(|i| mask[i][GRID_SIZE - 1 - i]) {
        lines.push(Line::AntiDiagonal);
    }
    lines
}
