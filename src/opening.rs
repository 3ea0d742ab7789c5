//! Per-opening lookups: canonical move lists, the book-move table and the
//! detail panel.
//!
//! These read the unfiltered table; the sidebar filters never apply here.
//! Lookup misses come back as empty collections or `None`.

use arrow_array::RecordBatch;
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::game::{split_moves, TimeControlCategory, Winner};
use crate::table::{Column, GameTable, GameView};

/// Placeholder shown for detail fields of an opening without games.
pub const NOT_AVAILABLE: &str = "N/A";

/// Canonical move string of each opening.
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl OpeningBook {
    /// Build from `(opening_name, moves)` pairs; the first pair of a name wins.
    pub fn new<I, N, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, M)>,
        N: Into<String>,
        M: Into<String>,
    {
        let mut book = OpeningBook::default();
        for (name, moves) in pairs {
            book.insert(name.into(), moves.into());
        }
        book
    }

    fn insert(&mut self, name: String, moves: String) {
        if self.index.contains_key(&name) {
            return;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, moves));
    }

    /// Use the moves of the first recorded game of each opening.
    pub fn from_games(table: &GameTable) -> Self {
        OpeningBook::new(
            table
                .games()
                .iter()
                .map(|g| (g.opening_name.clone(), g.moves.join(" "))),
        )
    }

    /// Load from batches with `opening_name` and `moves` columns. Rows with
    /// a null cell are skipped.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self> {
        let mut book = OpeningBook::default();
        for batch in batches {
            let names = Column::required(batch, "opening_name")?;
            let moves = Column::required(batch, "moves")?;
            for row in 0..batch.num_rows() {
                if let (Some(name), Some(line)) = (names.text(row), moves.text(row)) {
                    book.insert(name.trim().to_string(), line.into_owned());
                }
            }
        }
        log::debug!("opening book holds {} openings", book.len());
        Ok(book)
    }

    pub fn moves_for(&self, opening_name: &str) -> Option<&str> {
        self.index
            .get(opening_name)
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SAN tokens of an opening's canonical line; empty when the opening has
/// no recorded move string.
pub fn get_moves_for_opening(book: &OpeningBook, opening_name: &str) -> Vec<String> {
    book.moves_for(opening_name)
        .map(split_moves)
        .unwrap_or_default()
}

/// One numbered row of the book-move table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePair {
    /// 1-based move number.
    pub turn: usize,
    pub white: String,
    /// Empty when the book line ends on a white move.
    pub black: String,
}

/// The "book" part of an opening's line (its first `opening_ply` plies),
/// paired into white/black rows. Empty when either table has no entry.
pub fn opening_book_moves(
    book: &OpeningBook,
    table: &GameTable,
    opening_name: &str,
) -> Vec<MovePair> {
    let Some(opening_ply) = table
        .games()
        .iter()
        .find(|g| g.opening_name == opening_name)
        .map(|g| g.opening_ply as usize)
    else {
        return Vec::new();
    };

    let moves = get_moves_for_opening(book, opening_name);
    let book_moves = &moves[..opening_ply.min(moves.len())];
    book_moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MovePair {
            turn: i + 1,
            white: pair[0].clone(),
            black: pair.get(1).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Every game played with `opening_name`, in table order.
pub fn games_for_opening<'a>(table: &'a GameTable, opening_name: &str) -> GameView<'a> {
    GameView::from_rows(
        table
            .games()
            .iter()
            .filter(|g| g.opening_name == opening_name)
            .collect(),
    )
}

/// Occurrence counts in order of first appearance.
fn tally<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
}

/// Most frequent value; ties go to the value seen first.
fn mode<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (value, n) in tally(values) {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((value, n));
        }
    }
    best.map(|(value, _)| value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningDetail {
    pub opening_ply: Option<u32>,
    pub game_count: usize,
    pub modal_winner: Option<Winner>,
    pub modal_time_category: Option<TimeControlCategory>,
}

impl OpeningDetail {
    /// Labelled display values; missing values render as [`NOT_AVAILABLE`].
    pub fn fields(&self) -> [(&'static str, String); 4] {
        fn or_na<T: fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
        }
        let game_count = (self.game_count > 0).then_some(self.game_count);
        [
            ("Opening PLY", or_na(self.opening_ply)),
            ("Game Number", or_na(game_count)),
            ("Most Winner Color", or_na(self.modal_winner)),
            ("Most Played Time category", or_na(self.modal_time_category)),
        ]
    }
}

/// Summary of one opening over the whole table.
pub fn opening_detail_summary(table: &GameTable, opening_name: &str) -> OpeningDetail {
    let games = games_for_opening(table, opening_name);
    let rows = games.rows();
    OpeningDetail {
        opening_ply: rows.first().map(|g| g.opening_ply),
        game_count: rows.len(),
        modal_winner: mode(rows.iter().map(|g| g.winner)),
        modal_time_category: mode(rows.iter().map(|g| g.time_control_category)),
    }
}

/// Percentage share of one value among the games of an opening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Share<T> {
    pub value: T,
    pub percentage: f64,
}

/// Shares by descending count; ties keep first-seen order.
fn shares<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Option<Vec<Share<T>>> {
    let mut counts = tally(values);
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return None;
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Some(
        counts
            .into_iter()
            .map(|(value, n)| Share {
                value,
                percentage: n as f64 * 100.0 / total as f64,
            })
            .collect(),
    )
}

/// Winner percentages of an opening. `None` when the opening has no games,
/// or only draws while `include_draws` is off.
pub fn opening_winner_share(
    table: &GameTable,
    opening_name: &str,
    include_draws: bool,
) -> Option<Vec<Share<Winner>>> {
    shares(
        games_for_opening(table, opening_name)
            .iter()
            .map(|g| g.winner)
            .filter(|w| include_draws || *w != Winner::Draw),
    )
}

/// Time-control percentages of an opening; `None` when it has no games.
pub fn opening_time_control_share(
    table: &GameTable,
    opening_name: &str,
) -> Option<Vec<Share<TimeControlCategory>>> {
    shares(
        games_for_opening(table, opening_name)
            .iter()
            .map(|g| g.time_control_category),
    )
}
