//! Filter predicates over the game table.
//!
//! A [`FilterSet`] is a pure conjunction: a row is kept when every
//! predicate matches it, so the order predicates were added in never
//! changes the result.

use std::str::FromStr;

use crate::game::{GameRecord, TimeControlCategory, Winner};
use crate::table::{GameTable, GameView};

/// Rating filters widen the selected bounds by this many points on each
/// side so games near the boundary stay visible.
pub const RATING_MARGIN: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    TimeControl(TimeControlCategory),
    Rated(bool),
    Increment(u32),
    /// Either player's rating lies in `[low - 50, high + 50]`.
    RatingRange { low: u32, high: u32 },
    Winner(Winner),
}

impl Predicate {
    pub fn matches(&self, game: &GameRecord) -> bool {
        match *self {
            Predicate::TimeControl(category) => game.time_control_category == category,
            Predicate::Rated(rated) => game.rated == rated,
            Predicate::Increment(increment) => game.increment == increment,
            Predicate::RatingRange { low, high } => {
                let bounds = low.saturating_sub(RATING_MARGIN)..=high.saturating_add(RATING_MARGIN);
                bounds.contains(&game.white_rating) || bounds.contains(&game.black_rating)
            }
            Predicate::Winner(winner) => game.winner == winner,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, game: &GameRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(game))
    }
}

impl FromIterator<Predicate> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        FilterSet {
            predicates: iter.into_iter().collect(),
        }
    }
}

/// Rows of `table` matching every predicate, in table order. Never fails;
/// no match yields an empty view.
pub fn apply_filters<'a>(table: &'a GameTable, filters: &FilterSet) -> GameView<'a> {
    filter_view(&table.view(), filters)
}

/// Narrow an existing view further.
pub fn filter_view<'a>(view: &GameView<'a>, filters: &FilterSet) -> GameView<'a> {
    let rows: Vec<&'a GameRecord> = view.iter().filter(|g| filters.matches(g)).collect();
    log::debug!(
        "{} predicates kept {} of {} games",
        filters.predicates.len(),
        rows.len(),
        view.len()
    );
    GameView::from_rows(rows)
}

/// Rated selector of the dashboard sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RatedChoice {
    #[default]
    All,
    Rated,
    NonRated,
}

impl RatedChoice {
    fn predicate(self) -> Option<Predicate> {
        match self {
            RatedChoice::All => None,
            RatedChoice::Rated => Some(Predicate::Rated(true)),
            RatedChoice::NonRated => Some(Predicate::Rated(false)),
        }
    }
}

impl FromStr for RatedChoice {
    type Err = String;

    /// Accepts the sidebar labels `All`, `Rated` and `Non-Rated`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "all" => Ok(RatedChoice::All),
            "rated" => Ok(RatedChoice::Rated),
            "nonrated" | "unrated" => Ok(RatedChoice::NonRated),
            _ => Err(format!("unknown rated choice: {}", s.trim())),
        }
    }
}

/// Winner selector of the game list. Draws are only reachable through `All`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WinnerChoice {
    #[default]
    All,
    White,
    Black,
}

impl WinnerChoice {
    fn predicate(self) -> Option<Predicate> {
        match self {
            WinnerChoice::All => None,
            WinnerChoice::White => Some(Predicate::Winner(Winner::White)),
            WinnerChoice::Black => Some(Predicate::Winner(Winner::Black)),
        }
    }
}

impl FromStr for WinnerChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(WinnerChoice::All),
            "white" => Ok(WinnerChoice::White),
            "black" => Ok(WinnerChoice::Black),
            _ => Err(format!("unknown winner choice: {}", s.trim())),
        }
    }
}

/// Everything selected in the sidebar. The plot filters drive the chart
/// views; the game-list filters narrow the list of games of one opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarSelection {
    pub category: TimeControlCategory,
    pub plot_rated: RatedChoice,
    pub increment: Option<u32>,
    pub list_rated: RatedChoice,
    pub list_winner: WinnerChoice,
    pub rating_range: Option<(u32, u32)>,
}

impl SidebarSelection {
    pub fn new(category: TimeControlCategory) -> Self {
        SidebarSelection {
            category,
            plot_rated: RatedChoice::All,
            increment: None,
            list_rated: RatedChoice::All,
            list_winner: WinnerChoice::All,
            rating_range: None,
        }
    }

    pub fn plot_filters(&self) -> FilterSet {
        std::iter::once(Predicate::TimeControl(self.category))
            .chain(self.plot_rated.predicate())
            .chain(self.increment.map(Predicate::Increment))
            .collect()
    }

    pub fn game_list_filters(&self) -> FilterSet {
        self.list_rated
            .predicate()
            .into_iter()
            .chain(self.list_winner.predicate())
            .chain(
                self.rating_range
                    .map(|(low, high)| Predicate::RatingRange { low, high }),
            )
            .collect()
    }
}
