use crate::attack::is_king_in_check;
use crate::board::{Board, Color, PositionKey};
use std::collections::HashMap;

/// One recorded post-move position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub key: PositionKey,
    /// Side whose move produced this position.
    pub mover: Color,
    /// Check status of each king on the recorded board, indexed by `Color::index`.
    in_check: [bool; 2],
}

impl HistoryEntry {
    pub fn is_in_check(&self, color: Color) -> bool {
        self.in_check[color.index()]
    }
}

/// Position bookkeeping for one game: repetition counts and the no-capture clock.
///
/// Owned by exactly one game session. Call `reset` before reusing it for
/// another game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionHistory {
    entries: Vec<HistoryEntry>,
    counts: HashMap<PositionKey, usize>,
    plies_since_capture: usize,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything for a new game.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.counts.clear();
        self.plies_since_capture = 0;
    }

    /// Record the board as it stands after a confirmed move, assuming strict
    /// alternation with Red moving first.
    pub fn record_move(&mut self, board: &Board, captured: bool) {
        let mover = self
            .entries
            .last()
            .map_or(Color::Red, |entry| entry.mover.opponent());
        self.record_move_by(board, mover, captured);
    }

    /// Record the board after a confirmed move made by `mover`.
    pub fn record_move_by(&mut self, board: &Board, mover: Color, captured: bool) {
        let key = board.position_key();
        *self.counts.entry(key.clone()).or_insert(0) += 1;
        self.entries.push(HistoryEntry {
            key,
            mover,
            in_check: [
                is_king_in_check(board, Color::Red),
                is_king_in_check(board, Color::Black),
            ],
        });

        if captured {
            self.plies_since_capture = 0;
        } else {
            self.plies_since_capture += 1;
        }
    }

    pub fn occurrences(&self, key: &PositionKey) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn plies_since_capture(&self) -> usize {
        self.plies_since_capture
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last_key(&self) -> Option<&PositionKey> {
        self.entries.last().map(|entry| &entry.key)
    }

    /// The side that gave check with every one of its moves while `key` was
    /// being repeated, if exactly one side did.
    ///
    /// The cycle runs from just after the first recorded occurrence of `key`
    /// to its last one. A side that made no move in the cycle never counts.
    pub fn perpetual_checker(&self, key: &PositionKey) -> Option<Color> {
        let first = self.entries.iter().position(|entry| &entry.key == key)?;
        let last = self.entries.iter().rposition(|entry| &entry.key == key)?;
        if last < first + 2 {
            return None;
        }

        let mut moved = [false, false];
        let mut always_checking = [true, true];
        for entry in &self.entries[first + 1..=last] {
            moved[entry.mover.index()] = true;
            if !entry.is_in_check(entry.mover.opponent()) {
                always_checking[entry.mover.index()] = false;
            }
        }
        for color in [Color::Red, Color::Black] {
            always_checking[color.index()] &= moved[color.index()];
        }

        match always_checking {
            [true, false] => Some(Color::Red),
            [false, true] => Some(Color::Black),
            _ => None,
        }
    }
}
