use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3_arrow::PyTable;
use std::sync::Arc;

use crate::aggregate::{
    DashboardViews, GameListRow, OpeningCount, OpeningDuration, OutcomeCount, WinRateSummary,
};
use crate::audit::{audit_moves, AuditConfig, MoveFault};
use crate::error::{DashboardError, MalformedMoveError};
use crate::filter::{RatedChoice, SidebarSelection, WinnerChoice};
use crate::game::TimeControlCategory;
use crate::opening::{opening_book_moves, OpeningBook};
use crate::replay::{DegradedFrame, ReplayFrame, ReplaySession};
use crate::table::GameTable;

impl From<DashboardError> for PyErr {
    fn from(err: DashboardError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<MalformedMoveError> for PyErr {
    fn from(err: MalformedMoveError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn parse_choice<T>(raw: &str) -> PyResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(PyValueError::new_err)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Immutable table of recorded games.
///
/// Built once from a pyarrow ``Table``; every view function takes it by
/// reference and never modifies it.
#[pyclass(name = "GameTable", frozen)]
pub struct PyGameTable {
    pub inner: Arc<GameTable>,
}

#[pymethods]
impl PyGameTable {
    /// Load from a pyarrow ``Table`` with the dataset's columns.
    #[staticmethod]
    fn from_arrow(table: PyTable) -> PyResult<Self> {
        let (batches, _schema) = table.into_inner();
        let games = GameTable::from_record_batches(&batches)?;
        Ok(PyGameTable {
            inner: Arc::new(games),
        })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("<GameTable games={}>", self.inner.len())
    }

    fn opening_names(&self) -> Vec<String> {
        self.inner
            .opening_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn time_control_categories(&self) -> Vec<&'static str> {
        self.inner
            .time_control_categories()
            .into_iter()
            .map(|c| c.as_str())
            .collect()
    }

    fn increment_choices(&self) -> Vec<u32> {
        self.inner.increment_choices()
    }

    fn max_white_rating(&self) -> Option<u32> {
        self.inner.max_white_rating()
    }

    fn find_game(&self, game_id: &str) -> Option<PyGameRow> {
        self.inner
            .find_game(game_id)
            .map(|g| crate::aggregate::game_list_row(g).into())
    }

    /// Replay every stored move list in parallel and report corrupt games.
    #[pyo3(signature = (num_threads=None))]
    fn audit(&self, py: Python<'_>, num_threads: Option<usize>) -> PyResult<Vec<PyMoveFault>> {
        let table = Arc::clone(&self.inner);
        let config = AuditConfig { num_threads };
        let faults = py.allow_threads(move || audit_moves(&table, &config))?;
        Ok(faults.into_iter().map(PyMoveFault::from).collect())
    }
}

/// Canonical move string of each opening.
#[pyclass(name = "OpeningBook", frozen)]
pub struct PyOpeningBook {
    pub inner: Arc<OpeningBook>,
}

#[pymethods]
impl PyOpeningBook {
    #[new]
    fn new(entries: Vec<(String, String)>) -> Self {
        PyOpeningBook {
            inner: Arc::new(OpeningBook::new(entries)),
        }
    }

    /// Load from a pyarrow ``Table`` with ``opening_name`` and ``moves``.
    #[staticmethod]
    fn from_arrow(table: PyTable) -> PyResult<Self> {
        let (batches, _schema) = table.into_inner();
        Ok(PyOpeningBook {
            inner: Arc::new(OpeningBook::from_record_batches(&batches)?),
        })
    }

    /// Use the first recorded game of each opening.
    #[staticmethod]
    fn from_games(games: &PyGameTable) -> Self {
        PyOpeningBook {
            inner: Arc::new(OpeningBook::from_games(&games.inner)),
        }
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn moves_for(&self, opening_name: &str) -> Vec<String> {
        crate::opening::get_moves_for_opening(&self.inner, opening_name)
    }

    /// ``(turn, white, black)`` rows of the opening's book moves.
    fn book_moves(&self, games: &PyGameTable, opening_name: &str) -> Vec<(usize, String, String)> {
        opening_book_moves(&self.inner, &games.inner, opening_name)
            .into_iter()
            .map(|pair| (pair.turn, pair.white, pair.black))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Sidebar filters
// ---------------------------------------------------------------------------

/// Sidebar selection. Choice arguments take the sidebar labels
/// (``"All"``, ``"Rated"``, ``"Non-Rated"``, ``"White"``, ``"Black"``).
#[pyclass(name = "Filters", frozen)]
pub struct PyFilters {
    pub selection: SidebarSelection,
}

#[pymethods]
impl PyFilters {
    #[new]
    #[pyo3(signature = (
        category,
        plot_rated="All",
        increment=None,
        list_rated="All",
        list_winner="All",
        rating_range=None
    ))]
    fn new(
        category: &str,
        plot_rated: &str,
        increment: Option<u32>,
        list_rated: &str,
        list_winner: &str,
        rating_range: Option<(u32, u32)>,
    ) -> PyResult<Self> {
        let mut selection = SidebarSelection::new(parse_choice::<TimeControlCategory>(category)?);
        selection.plot_rated = parse_choice::<RatedChoice>(plot_rated)?;
        selection.increment = increment;
        selection.list_rated = parse_choice::<RatedChoice>(list_rated)?;
        selection.list_winner = parse_choice::<WinnerChoice>(list_winner)?;
        selection.rating_range = rating_range;
        Ok(PyFilters { selection })
    }

    fn __repr__(&self) -> String {
        format!("<Filters {:?}>", self.selection)
    }
}

// ---------------------------------------------------------------------------
// View results
// ---------------------------------------------------------------------------

#[pyclass(name = "OpeningCount", frozen, get_all)]
#[derive(Clone)]
pub struct PyOpeningCount {
    pub opening_name: String,
    pub count: usize,
    pub color: &'static str,
}

impl From<OpeningCount> for PyOpeningCount {
    fn from(c: OpeningCount) -> Self {
        PyOpeningCount {
            opening_name: c.opening_name,
            count: c.count,
            color: c.color,
        }
    }
}

#[pyclass(name = "OutcomeCount", frozen, get_all)]
#[derive(Clone)]
pub struct PyOutcomeCount {
    pub opening_name: String,
    pub white_wins: usize,
    pub black_wins: usize,
}

impl From<OutcomeCount> for PyOutcomeCount {
    fn from(c: OutcomeCount) -> Self {
        PyOutcomeCount {
            opening_name: c.opening_name,
            white_wins: c.white_wins,
            black_wins: c.black_wins,
        }
    }
}

#[pyclass(name = "OpeningDuration", frozen, get_all)]
#[derive(Clone)]
pub struct PyOpeningDuration {
    pub opening_name: String,
    pub average_duration: f64,
    pub games: usize,
    pub color: &'static str,
}

impl From<OpeningDuration> for PyOpeningDuration {
    fn from(d: OpeningDuration) -> Self {
        PyOpeningDuration {
            opening_name: d.opening_name,
            average_duration: d.average_duration,
            games: d.games,
            color: d.color,
        }
    }
}

/// One row of the game list, already in display form.
#[pyclass(name = "GameRow", frozen, get_all)]
#[derive(Clone)]
pub struct PyGameRow {
    pub id: String,
    pub rated: bool,
    pub turns: u32,
    pub white_rating: u32,
    pub black_rating: u32,
    pub winner: String,
    pub victory_status: String,
    pub time_control_category: String,
}

impl From<GameListRow> for PyGameRow {
    fn from(row: GameListRow) -> Self {
        PyGameRow {
            id: row.id,
            rated: row.rated,
            turns: row.turns,
            white_rating: row.white_rating,
            black_rating: row.black_rating,
            winner: row.winner.to_string(),
            victory_status: row.victory_status.to_string(),
            time_control_category: row.time_control_category.to_string(),
        }
    }
}

/// The four chart views of one filter state.
///
/// ``win_rate`` is ``(white, black, draw)`` or ``None`` for an empty view.
#[pyclass(name = "DashboardViews", frozen, get_all)]
pub struct PyDashboardViews {
    pub most_played: Vec<PyOpeningCount>,
    pub top_by_outcome: Vec<PyOutcomeCount>,
    pub win_rate: Option<(usize, usize, usize)>,
    pub duration: Vec<PyOpeningDuration>,
}

impl From<DashboardViews> for PyDashboardViews {
    fn from(views: DashboardViews) -> Self {
        PyDashboardViews {
            most_played: views.most_played.into_iter().map(Into::into).collect(),
            top_by_outcome: views.top_by_outcome.into_iter().map(Into::into).collect(),
            win_rate: views
                .win_rate
                .map(|WinRateSummary { white, black, draw }| (white, black, draw)),
            duration: views.duration.into_iter().map(Into::into).collect(),
        }
    }
}

#[pyclass(name = "MoveFault", frozen, get_all)]
#[derive(Clone)]
pub struct PyMoveFault {
    pub game_id: String,
    pub ply: usize,
    pub san: String,
    pub reason: String,
}

impl From<MoveFault> for PyMoveFault {
    fn from(fault: MoveFault) -> Self {
        PyMoveFault {
            game_id: fault.game_id,
            ply: fault.error.ply,
            san: fault.error.san,
            reason: fault.error.reason,
        }
    }
}

#[pymethods]
impl PyMoveFault {
    fn __repr__(&self) -> String {
        format!(
            "<MoveFault game={} ply={} san={:?}>",
            self.game_id, self.ply, self.san
        )
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Board state handed to the renderer.
///
/// ``squares`` holds 64 bytes, a1 first: 0 empty, 1-6 white PNBRQK,
/// 7-12 black. ``fault`` is set when the stored line is corrupt and the
/// board stopped at the last valid move.
#[pyclass(name = "BoardFrame", frozen, get_all)]
pub struct PyBoardFrame {
    pub fen: String,
    pub squares: Vec<u8>,
    pub white_to_move: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub plies_applied: usize,
    pub last_move: Option<String>,
    pub last_move_squares: Option<(u8, u8)>,
    pub fault: Option<String>,
}

impl PyBoardFrame {
    fn new(frame: &ReplayFrame, fault: Option<&MalformedMoveError>) -> Self {
        let snapshot = frame.snapshot();
        PyBoardFrame {
            fen: snapshot.fen,
            squares: snapshot.squares.to_vec(),
            white_to_move: snapshot.white_to_move,
            is_check: snapshot.is_check,
            is_checkmate: snapshot.is_checkmate,
            plies_applied: frame.plies_applied,
            last_move: frame.last_move.as_ref().map(|m| m.uci.clone()),
            last_move_squares: snapshot.highlight.map(|(from, to)| (from as u8, to as u8)),
            fault: fault.map(|f| f.to_string()),
        }
    }
}

impl From<ReplayFrame> for PyBoardFrame {
    fn from(frame: ReplayFrame) -> Self {
        PyBoardFrame::new(&frame, None)
    }
}

impl From<DegradedFrame> for PyBoardFrame {
    fn from(degraded: DegradedFrame) -> Self {
        PyBoardFrame::new(&degraded.frame, degraded.fault.as_ref())
    }
}

/// Per-user board navigation state.
#[pyclass(name = "ReplaySession")]
#[derive(Default)]
pub struct PyReplaySession {
    inner: ReplaySession,
}

#[pymethods]
impl PyReplaySession {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    fn select_opening(&mut self, book: &PyOpeningBook, opening_name: &str) {
        self.inner.select_opening(&book.inner, opening_name);
    }

    /// Select the opening only if it is not the current one.
    fn ensure_opening(&mut self, book: &PyOpeningBook, opening_name: &str) -> bool {
        self.inner.ensure_opening(&book.inner, opening_name)
    }

    fn step_forward(&mut self) -> bool {
        self.inner.step_forward()
    }

    fn step_backward(&mut self) -> bool {
        self.inner.step_backward()
    }

    #[getter]
    fn current_index(&self) -> usize {
        self.inner.current_index()
    }

    #[getter]
    fn moves(&self) -> Vec<String> {
        self.inner.moves().to_vec()
    }

    #[getter]
    fn opening(&self) -> Option<String> {
        self.inner.opening().map(str::to_string)
    }

    #[getter]
    fn current_move(&self) -> Option<String> {
        self.inner.current_move().map(str::to_string)
    }

    fn frame(&self) -> PyBoardFrame {
        self.inner.frame().into()
    }
}
