//! The immutable in-memory game table and its Arrow ingestion.
//!
//! Batches usually come from `pyarrow.csv.read_csv` on the Python side.
//! Columns are matched by name; the Arrow types produced by pyarrow and
//! pandas for the same CSV differ, so every accessor accepts several
//! physical types.

use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, LargeStringArray,
    RecordBatch, StringArray, UInt32Array, UInt64Array,
};
use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::{DashboardError, Result};
use crate::game::{split_moves, GameRecord, TimeControlCategory, VictoryStatus, Winner};
use crate::time_control::{category_for, parse_increment_code};

/// Increments the dashboard offers in its increment selector.
pub const OFFERED_INCREMENTS: [u32; 7] = [1, 2, 5, 10, 15, 20, 30];

/// A single Arrow column viewed through the accessors the loader needs.
#[derive(Clone, Copy)]
pub(crate) enum Column<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
    Int64(&'a Int64Array),
    Int32(&'a Int32Array),
    UInt32(&'a UInt32Array),
    UInt64(&'a UInt64Array),
    Float64(&'a Float64Array),
    Boolean(&'a BooleanArray),
}

impl<'a> Column<'a> {
    fn from_array(name: &str, array: &'a ArrayRef) -> Result<Self> {
        let any = array.as_any();
        if let Some(a) = any.downcast_ref::<StringArray>() {
            Ok(Column::Utf8(a))
        } else if let Some(a) = any.downcast_ref::<LargeStringArray>() {
            Ok(Column::LargeUtf8(a))
        } else if let Some(a) = any.downcast_ref::<Int64Array>() {
            Ok(Column::Int64(a))
        } else if let Some(a) = any.downcast_ref::<Int32Array>() {
            Ok(Column::Int32(a))
        } else if let Some(a) = any.downcast_ref::<UInt32Array>() {
            Ok(Column::UInt32(a))
        } else if let Some(a) = any.downcast_ref::<UInt64Array>() {
            Ok(Column::UInt64(a))
        } else if let Some(a) = any.downcast_ref::<Float64Array>() {
            Ok(Column::Float64(a))
        } else if let Some(a) = any.downcast_ref::<BooleanArray>() {
            Ok(Column::Boolean(a))
        } else {
            Err(DashboardError::UnsupportedColumnType {
                column: name.to_string(),
                data_type: format!("{:?}", array.data_type()),
            })
        }
    }

    pub(crate) fn required(batch: &'a RecordBatch, name: &str) -> Result<Self> {
        Self::optional(batch, name)?.ok_or_else(|| DashboardError::MissingColumn(name.to_string()))
    }

    pub(crate) fn optional(batch: &'a RecordBatch, name: &str) -> Result<Option<Self>> {
        batch
            .column_by_name(name)
            .map(|array| Self::from_array(name, array))
            .transpose()
    }

    fn is_valid(&self, row: usize) -> bool {
        match self {
            Column::Utf8(a) => a.is_valid(row),
            Column::LargeUtf8(a) => a.is_valid(row),
            Column::Int64(a) => a.is_valid(row),
            Column::Int32(a) => a.is_valid(row),
            Column::UInt32(a) => a.is_valid(row),
            Column::UInt64(a) => a.is_valid(row),
            Column::Float64(a) => a.is_valid(row),
            Column::Boolean(a) => a.is_valid(row),
        }
    }

    /// Cell as text; numbers and booleans are formatted.
    pub(crate) fn text(&self, row: usize) -> Option<Cow<'a, str>> {
        if !self.is_valid(row) {
            return None;
        }
        Some(match self {
            Column::Utf8(a) => Cow::Borrowed(a.value(row)),
            Column::LargeUtf8(a) => Cow::Borrowed(a.value(row)),
            Column::Int64(a) => Cow::Owned(a.value(row).to_string()),
            Column::Int32(a) => Cow::Owned(a.value(row).to_string()),
            Column::UInt32(a) => Cow::Owned(a.value(row).to_string()),
            Column::UInt64(a) => Cow::Owned(a.value(row).to_string()),
            Column::Float64(a) => {
                let v = a.value(row);
                if v.fract() == 0.0 {
                    Cow::Owned(format!("{}", v as i64))
                } else {
                    Cow::Owned(v.to_string())
                }
            }
            Column::Boolean(a) => Cow::Owned(a.value(row).to_string()),
        })
    }

    /// Cell as a non-negative integer that fits in `u32`.
    pub(crate) fn unsigned(&self, row: usize) -> Option<u32> {
        if !self.is_valid(row) {
            return None;
        }
        let value: i64 = match self {
            Column::Int64(a) => a.value(row),
            Column::Int32(a) => a.value(row) as i64,
            Column::UInt32(a) => a.value(row) as i64,
            Column::UInt64(a) => i64::try_from(a.value(row)).ok()?,
            Column::Float64(a) => {
                let v = a.value(row);
                if !v.is_finite() || v.fract() != 0.0 {
                    return None;
                }
                v as i64
            }
            Column::Utf8(_) | Column::LargeUtf8(_) => self.text(row)?.trim().parse().ok()?,
            Column::Boolean(_) => return None,
        };
        u32::try_from(value).ok()
    }

    pub(crate) fn boolean(&self, row: usize) -> Option<bool> {
        if !self.is_valid(row) {
            return None;
        }
        match self {
            Column::Boolean(a) => Some(a.value(row)),
            Column::Utf8(_) | Column::LargeUtf8(_) => {
                match self.text(row)?.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" => Some(true),
                    "false" | "0" | "no" => Some(false),
                    _ => None,
                }
            }
            _ => match self.unsigned(row)? {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
        }
    }
}

/// Where a batch's clock settings come from.
enum ClockColumns<'a> {
    Explicit {
        initial_time: Column<'a>,
        increment: Column<'a>,
    },
    IncrementCode(Column<'a>),
}

/// Resolved columns of one record batch.
struct GameColumns<'a> {
    id: Column<'a>,
    rated: Column<'a>,
    turns: Column<'a>,
    white_rating: Column<'a>,
    black_rating: Column<'a>,
    winner: Column<'a>,
    victory_status: Column<'a>,
    opening_name: Column<'a>,
    opening_ply: Column<'a>,
    moves: Column<'a>,
    time_control_category: Option<Column<'a>>,
    clock: ClockColumns<'a>,
}

impl<'a> GameColumns<'a> {
    fn resolve(batch: &'a RecordBatch) -> Result<Self> {
        let initial_time = Column::optional(batch, "initial_time")?;
        let increment = Column::optional(batch, "increment")?;
        let clock = match (initial_time, increment) {
            (Some(initial_time), Some(increment)) => ClockColumns::Explicit {
                initial_time,
                increment,
            },
            _ => ClockColumns::IncrementCode(Column::required(batch, "increment_code")?),
        };

        Ok(GameColumns {
            id: Column::required(batch, "id")?,
            rated: Column::required(batch, "rated")?,
            turns: Column::required(batch, "turns")?,
            white_rating: Column::required(batch, "white_rating")?,
            black_rating: Column::required(batch, "black_rating")?,
            winner: Column::required(batch, "winner")?,
            victory_status: Column::required(batch, "victory_status")?,
            opening_name: Column::required(batch, "opening_name")?,
            opening_ply: Column::required(batch, "opening_ply")?,
            moves: Column::required(batch, "moves")?,
            time_control_category: Column::optional(batch, "time_control_category")?,
            clock,
        })
    }

    /// Build the record for `row`, or `None` if a required cell is null or
    /// unparseable.
    fn record(&self, row: usize) -> Option<GameRecord> {
        let (initial_time, increment) = match &self.clock {
            ClockColumns::Explicit {
                initial_time,
                increment,
            } => (initial_time.unsigned(row)?, increment.unsigned(row)?),
            ClockColumns::IncrementCode(code) => {
                let tc = parse_increment_code(&code.text(row)?).ok()?;
                (tc.initial_seconds, tc.increment_seconds)
            }
        };
        // a null or absent category is derived; an unknown label rejects the row
        let time_control_category = match self.time_control_category.and_then(|c| c.text(row)) {
            Some(label) => match label.parse::<TimeControlCategory>() {
                Ok(category) => category,
                Err(_) => {
                    log::debug!("row {}: unknown time control category {:?}", row, label);
                    return None;
                }
            },
            None => category_for(initial_time, increment),
        };

        Some(GameRecord {
            id: self.id.text(row)?.into_owned(),
            rated: self.rated.boolean(row)?,
            turns: self.turns.unsigned(row)?,
            white_rating: self.white_rating.unsigned(row)?,
            black_rating: self.black_rating.unsigned(row)?,
            winner: self.winner.text(row)?.parse::<Winner>().ok()?,
            victory_status: VictoryStatus::from(&*self.victory_status.text(row)?),
            time_control_category,
            increment,
            initial_time,
            opening_name: self.opening_name.text(row)?.trim().to_string(),
            opening_ply: self.opening_ply.unsigned(row)?,
            moves: split_moves(&self.moves.text(row)?),
        })
    }
}

/// Read-only table of games, loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct GameTable {
    games: Vec<GameRecord>,
}

impl GameTable {
    pub fn new(games: Vec<GameRecord>) -> Self {
        GameTable { games }
    }

    /// Load games from Arrow record batches. Rows with missing or invalid
    /// required cells are skipped.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self> {
        let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        let mut games = Vec::with_capacity(total_rows);
        let mut skipped = 0usize;

        for batch in batches {
            let columns = GameColumns::resolve(batch)?;
            for row in 0..batch.num_rows() {
                match columns.record(row) {
                    Some(game) => games.push(game),
                    None => skipped += 1,
                }
            }
        }

        if skipped > 0 {
            log::warn!(
                "skipped {} of {} rows with missing or invalid values",
                skipped,
                total_rows
            );
        }
        log::debug!("loaded {} games", games.len());
        Ok(GameTable { games })
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// View over every row, in table order.
    pub fn view(&self) -> GameView<'_> {
        GameView {
            rows: self.games.iter().collect(),
        }
    }

    pub fn find_game(&self, id: &str) -> Option<&GameRecord> {
        self.games.iter().find(|g| g.id == id)
    }

    /// Distinct opening names, sorted.
    pub fn opening_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .games
            .iter()
            .map(|g| g.opening_name.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort_unstable();
        names
    }

    /// Distinct categories in order of first appearance.
    pub fn time_control_categories(&self) -> Vec<TimeControlCategory> {
        let mut seen = Vec::new();
        for game in &self.games {
            if !seen.contains(&game.time_control_category) {
                seen.push(game.time_control_category);
            }
        }
        seen
    }

    /// Offered increments that occur in the table, ascending.
    pub fn increment_choices(&self) -> Vec<u32> {
        let present: HashSet<u32> = self.games.iter().map(|g| g.increment).collect();
        OFFERED_INCREMENTS
            .iter()
            .copied()
            .filter(|inc| present.contains(inc))
            .collect()
    }

    pub fn max_white_rating(&self) -> Option<u32> {
        self.games.iter().map(|g| g.white_rating).max()
    }
}

/// Borrowed subset of a [`GameTable`], in table order.
#[derive(Debug, Clone, Default)]
pub struct GameView<'a> {
    rows: Vec<&'a GameRecord>,
}

impl<'a> GameView<'a> {
    pub(crate) fn from_rows(rows: Vec<&'a GameRecord>) -> Self {
        GameView { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[&'a GameRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a GameRecord> + '_ {
        self.rows.iter().copied()
    }
}
