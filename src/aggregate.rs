//! Chart-ready summaries derived from a filtered [`GameView`].
//!
//! Every function here is pure and recomputed on each interaction. An
//! empty view produces an empty result (or `None` for the win-rate
//! summary); nothing fails on well-formed input.

use std::collections::HashMap;

use crate::game::{GameRecord, TimeControlCategory, VictoryStatus, Winner};
use crate::table::GameView;

/// Colors of the most played openings, indexed by rank.
pub const MOST_PLAYED_PALETTE: [&str; 5] = ["#FFBE0B", "#FB5607", "#FF006E", "#8338EC", "#3A86FF"];

/// Color of duration points whose opening is not among the most played.
pub const FALLBACK_COLOR: &str = "#cccccc";

/// Color for `rank` from the most-played palette.
pub fn palette_color(rank: usize) -> Option<&'static str> {
    MOST_PLAYED_PALETTE.get(rank).copied()
}

/// Sizes of the ranked views and their colors.
#[derive(Clone, Debug)]
pub struct AggregateConfig {
    pub most_played_k: usize,
    pub top_outcome_k: usize,
    pub duration_k: usize,
    pub fallback_color: &'static str,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        AggregateConfig {
            most_played_k: MOST_PLAYED_PALETTE.len(),
            top_outcome_k: 5,
            duration_k: 10,
            fallback_color: FALLBACK_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningCount {
    pub opening_name: String,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeCount {
    pub opening_name: String,
    pub white_wins: usize,
    pub black_wins: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinRateSummary {
    pub white: usize,
    pub black: usize,
    pub draw: usize,
}

impl WinRateSummary {
    pub fn total(&self) -> usize {
        self.white + self.black + self.draw
    }

    pub fn get(&self, winner: Winner) -> usize {
        match winner {
            Winner::White => self.white,
            Winner::Black => self.black,
            Winner::Draw => self.draw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningDuration {
    pub opening_name: String,
    /// Mean of `initial_time + turns * increment`, in seconds.
    pub average_duration: f64,
    pub games: usize,
    pub color: &'static str,
}

/// Row of the game list, restricted to the displayed columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListRow {
    pub id: String,
    pub rated: bool,
    pub turns: u32,
    pub white_rating: u32,
    pub black_rating: u32,
    pub winner: Winner,
    pub victory_status: VictoryStatus,
    pub time_control_category: TimeControlCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingFrequency {
    pub rating: u32,
    pub frequency: usize,
}

/// Per-opening tallies in order of first appearance.
struct OpeningGroups<'a> {
    order: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
}

impl<'a> OpeningGroups<'a> {
    fn new() -> Self {
        OpeningGroups {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Slot of `name`, allocating one on first sight.
    fn slot(&mut self, name: &'a str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.order.len();
        self.order.push(name);
        self.index.insert(name, i);
        i
    }
}

fn count_by_opening<'a>(view: &GameView<'a>) -> Vec<(&'a str, usize)> {
    let mut groups = OpeningGroups::new();
    let mut counts: Vec<usize> = Vec::new();
    for game in view.iter() {
        let i = groups.slot(&game.opening_name);
        if i == counts.len() {
            counts.push(0);
        }
        counts[i] += 1;
    }
    groups.order.into_iter().zip(counts).collect()
}

/// The `k` openings with the most games, ranked by count. Ties keep the
/// order in which openings first appear in the view. Rank `i` gets
/// `palette_color(i)`; ranks beyond the palette are not produced.
pub fn most_played(view: &GameView<'_>, k: usize) -> Vec<OpeningCount> {
    let mut counts = count_by_opening(view);
    // stable: equal counts stay in first-appearance order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(k)
        .enumerate()
        .filter_map(|(rank, (name, count))| {
            palette_color(rank).map(|color| OpeningCount {
                opening_name: name.to_string(),
                count,
                color,
            })
        })
        .collect()
}

/// Win counts per opening for white and black (draws excluded), keeping
/// the `k` openings ranked first by white wins, then black wins, then name.
///
/// The ranking is lexicographic, not by combined wins, so an opening with
/// (3, 0) outranks one with (2, 2). This is the ordering of the dashboard's
/// `nlargest` over the white column then the black column.
pub fn top_openings_by_outcome(view: &GameView<'_>, k: usize) -> Vec<OutcomeCount> {
    let mut wins: HashMap<&str, (usize, usize)> = HashMap::new();
    for game in view.iter() {
        let entry = wins.entry(game.opening_name.as_str()).or_default();
        match game.winner {
            Winner::White => entry.0 += 1,
            Winner::Black => entry.1 += 1,
            Winner::Draw => {}
        }
    }

    let mut ranked: Vec<OutcomeCount> = wins
        .into_iter()
        .map(|(name, (white_wins, black_wins))| OutcomeCount {
            opening_name: name.to_string(),
            white_wins,
            black_wins,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.white_wins
            .cmp(&a.white_wins)
            .then(b.black_wins.cmp(&a.black_wins))
            .then_with(|| a.opening_name.cmp(&b.opening_name))
    });
    ranked.truncate(k);
    ranked
}

/// Tally of outcomes. `None` when the view is empty, so callers can show
/// "no data" instead of a zero-filled chart.
pub fn win_rate_summary(view: &GameView<'_>) -> Option<WinRateSummary> {
    if view.is_empty() {
        return None;
    }
    let mut summary = WinRateSummary {
        white: 0,
        black: 0,
        draw: 0,
    };
    for game in view.iter() {
        match game.winner {
            Winner::White => summary.white += 1,
            Winner::Black => summary.black += 1,
            Winner::Draw => summary.draw += 1,
        }
    }
    Some(summary)
}

/// Average game duration of the `k` openings with the most games.
///
/// Colors come from `most_played`, which must be computed from the same
/// view; openings absent from it get `fallback_color`. Openings with equal
/// game counts are ordered by name.
pub fn duration_vs_opening(
    view: &GameView<'_>,
    most_played: &[OpeningCount],
    k: usize,
    fallback_color: &'static str,
) -> Vec<OpeningDuration> {
    let mut totals: HashMap<&str, (u64, usize)> = HashMap::new();
    for game in view.iter() {
        let entry = totals.entry(game.opening_name.as_str()).or_default();
        entry.0 += game.duration();
        entry.1 += 1;
    }

    let mut ranked: Vec<(&str, u64, usize)> = totals
        .into_iter()
        .map(|(name, (total, games))| (name, total, games))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(k)
        .map(|(name, total, games)| {
            let color = most_played
                .iter()
                .find(|entry| entry.opening_name == name)
                .map(|entry| entry.color)
                .unwrap_or(fallback_color);
            OpeningDuration {
                opening_name: name.to_string(),
                average_duration: total as f64 / games as f64,
                games,
                color,
            }
        })
        .collect()
}

pub fn game_list_row(game: &GameRecord) -> GameListRow {
    GameListRow {
        id: game.id.clone(),
        rated: game.rated,
        turns: game.turns,
        white_rating: game.white_rating,
        black_rating: game.black_rating,
        winner: game.winner,
        victory_status: game.victory_status.clone(),
        time_control_category: game.time_control_category,
    }
}

/// The filtered games, restricted to the display columns.
pub fn game_list(view: &GameView<'_>) -> Vec<GameListRow> {
    view.iter().map(game_list_row).collect()
}

/// How often each rating occurs, white and black ratings pooled, by
/// ascending rating.
pub fn rating_distribution(view: &GameView<'_>) -> Vec<RatingFrequency> {
    let mut frequencies: HashMap<u32, usize> = HashMap::new();
    for game in view.iter() {
        *frequencies.entry(game.white_rating).or_default() += 1;
        *frequencies.entry(game.black_rating).or_default() += 1;
    }
    let mut distribution: Vec<RatingFrequency> = frequencies
        .into_iter()
        .map(|(rating, frequency)| RatingFrequency { rating, frequency })
        .collect();
    distribution.sort_unstable_by_key(|r| r.rating);
    distribution
}

/// All chart views of the statistics tab, computed in dependency order.
#[derive(Debug, Clone)]
pub struct DashboardViews {
    pub most_played: Vec<OpeningCount>,
    pub top_by_outcome: Vec<OutcomeCount>,
    pub win_rate: Option<WinRateSummary>,
    pub duration: Vec<OpeningDuration>,
}

pub fn dashboard_views(view: &GameView<'_>, config: &AggregateConfig) -> DashboardViews {
    let most_played = most_played(view, config.most_played_k);
    let duration = duration_vs_opening(
        view,
        &most_played,
        config.duration_k,
        config.fallback_color,
    );
    log::debug!(
        "aggregated {} games: {} most played, {} duration points",
        view.len(),
        most_played.len(),
        duration.len()
    );
    DashboardViews {
        top_by_outcome: top_openings_by_outcome(view, config.top_outcome_k),
        win_rate: win_rate_summary(view),
        most_played,
        duration,
    }
}
