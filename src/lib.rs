use pyo3::prelude::*;

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod filter;
pub mod game;
pub mod opening;
pub mod replay;
pub mod table;
pub mod time_control;
mod python_bindings;

pub use aggregate::{dashboard_views, AggregateConfig, DashboardViews};
pub use audit::{audit_moves, AuditConfig, MoveFault};
pub use error::{DashboardError, MalformedMoveError, Result};
pub use filter::{apply_filters, filter_view, FilterSet, Predicate, SidebarSelection};
pub use game::{GameRecord, TimeControlCategory, VictoryStatus, Winner};
pub use opening::{get_moves_for_opening, opening_book_moves, OpeningBook};
pub use replay::{reconstruct_position, replay_until_fault, BoardSnapshot, ReplaySession};
pub use table::{GameTable, GameView};

use python_bindings::{
    PyBoardFrame, PyDashboardViews, PyFilters, PyGameRow, PyGameTable, PyMoveFault,
    PyOpeningBook, PyOpeningCount, PyOpeningDuration, PyOutcomeCount, PyReplaySession,
};

// --- Native Rust versions (no PyResult) ---

/// Chart views for the statistics tab under the sidebar's plot filters.
pub fn statistics_views_native(
    table: &GameTable,
    selection: &SidebarSelection,
    config: &AggregateConfig,
) -> DashboardViews {
    let view = apply_filters(table, &selection.plot_filters());
    dashboard_views(&view, config)
}

/// Games of one opening under the sidebar's game-list filters.
pub fn opening_games_native<'a>(
    table: &'a GameTable,
    selection: &SidebarSelection,
    opening_name: &str,
) -> GameView<'a> {
    let games = opening::games_for_opening(table, opening_name);
    filter_view(&games, &selection.game_list_filters())
}

// --- Python-facing wrappers (PyResult) ---

#[pyfunction]
#[pyo3(signature = (games, filters, most_played_k=5, top_outcome_k=5, duration_k=10))]
/// Compute the four statistics charts for the current sidebar selection.
fn statistics_views(
    games: &PyGameTable,
    filters: &PyFilters,
    most_played_k: usize,
    top_outcome_k: usize,
    duration_k: usize,
) -> PyDashboardViews {
    let config = AggregateConfig {
        most_played_k,
        top_outcome_k,
        duration_k,
        ..AggregateConfig::default()
    };
    statistics_views_native(&games.inner, &filters.selection, &config).into()
}

/// Rows of the game list for one opening.
#[pyfunction]
fn game_list(games: &PyGameTable, filters: &PyFilters, opening_name: &str) -> Vec<PyGameRow> {
    let view = opening_games_native(&games.inner, &filters.selection, opening_name);
    aggregate::game_list(&view)
        .into_iter()
        .map(PyGameRow::from)
        .collect()
}

/// ``(rating, frequency)`` pairs of the plot-filtered games.
#[pyfunction]
fn rating_distribution(games: &PyGameTable, filters: &PyFilters) -> Vec<(u32, usize)> {
    let view = apply_filters(&games.inner, &filters.selection.plot_filters());
    aggregate::rating_distribution(&view)
        .into_iter()
        .map(|r| (r.rating, r.frequency))
        .collect()
}

/// Labelled detail fields of one opening; missing values read ``"N/A"``.
#[pyfunction]
fn opening_details(games: &PyGameTable, opening_name: &str) -> Vec<(&'static str, String)> {
    opening::opening_detail_summary(&games.inner, opening_name)
        .fields()
        .to_vec()
}

#[pyfunction]
#[pyo3(signature = (games, opening_name, include_draws=true))]
fn opening_winner_share(
    games: &PyGameTable,
    opening_name: &str,
    include_draws: bool,
) -> Option<Vec<(&'static str, f64)>> {
    opening::opening_winner_share(&games.inner, opening_name, include_draws).map(|shares| {
        shares
            .into_iter()
            .map(|s| (s.value.as_str(), s.percentage))
            .collect()
    })
}

#[pyfunction]
fn opening_time_control_share(
    games: &PyGameTable,
    opening_name: &str,
) -> Option<Vec<(&'static str, f64)>> {
    opening::opening_time_control_share(&games.inner, opening_name).map(|shares| {
        shares
            .into_iter()
            .map(|s| (s.value.as_str(), s.percentage))
            .collect()
    })
}

/// Replay ``moves[0..=index]`` from the initial position.
///
/// Raises ``ValueError`` on the first illegal move.
#[pyfunction]
fn reconstruct_board(moves: Vec<String>, index: usize) -> PyResult<PyBoardFrame> {
    Ok(reconstruct_position(&moves, index)?.into())
}

/// Chess dashboard filtering, aggregation and move replay
#[pymodule]
fn chess_dashboard_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(statistics_views, m)?)?;
    m.add_function(wrap_pyfunction!(game_list, m)?)?;
    m.add_function(wrap_pyfunction!(rating_distribution, m)?)?;
    m.add_function(wrap_pyfunction!(opening_details, m)?)?;
    m.add_function(wrap_pyfunction!(opening_winner_share, m)?)?;
    m.add_function(wrap_pyfunction!(opening_time_control_share, m)?)?;
    m.add_function(wrap_pyfunction!(reconstruct_board, m)?)?;
    m.add_class::<PyGameTable>()?;
    m.add_class::<PyOpeningBook>()?;
    m.add_class::<PyFilters>()?;
    m.add_class::<PyReplaySession>()?;
    m.add_class::<PyBoardFrame>()?;
    m.add_class::<PyDashboardViews>()?;
    m.add_class::<PyOpeningCount>()?;
    m.add_class::<PyOutcomeCount>()?;
    m.add_class::<PyOpeningDuration>()?;
    m.add_class::<PyGameRow>()?;
    m.add_class::<PyMoveFault>()?;
    Ok(())
}
