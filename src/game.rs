//! Game record and the enumerations stored in its columns.

use std::fmt;
use std::str::FromStr;

/// Outcome column of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::White => "white",
            Winner::Black => "black",
            Winner::Draw => "draw",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Winner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(Winner::White),
            "black" => Ok(Winner::Black),
            "draw" => Ok(Winner::Draw),
            other => Err(format!("unknown winner: {}", other)),
        }
    }
}

/// How a game ended. Unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VictoryStatus {
    Mate,
    Resign,
    OutOfTime,
    Draw,
    Other(String),
}

impl VictoryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            VictoryStatus::Mate => "mate",
            VictoryStatus::Resign => "resign",
            VictoryStatus::OutOfTime => "outoftime",
            VictoryStatus::Draw => "draw",
            VictoryStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for VictoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for VictoryStatus {
    fn from(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "mate" => VictoryStatus::Mate,
            "resign" => VictoryStatus::Resign,
            "outoftime" => VictoryStatus::OutOfTime,
            "draw" | "drawagreement" => VictoryStatus::Draw,
            _ => VictoryStatus::Other(s.trim().to_string()),
        }
    }
}

/// Pace of a game, derived from base time and increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeControlCategory {
    UltraBullet,
    Bullet,
    Blitz,
    Rapid,
    Classical,
}

impl TimeControlCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeControlCategory::UltraBullet => "UltraBullet",
            TimeControlCategory::Bullet => "Bullet",
            TimeControlCategory::Blitz => "Blitz",
            TimeControlCategory::Rapid => "Rapid",
            TimeControlCategory::Classical => "Classical",
        }
    }
}

impl fmt::Display for TimeControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeControlCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match lowered.as_str() {
            "ultrabullet" => Ok(TimeControlCategory::UltraBullet),
            "bullet" => Ok(TimeControlCategory::Bullet),
            "blitz" => Ok(TimeControlCategory::Blitz),
            "rapid" => Ok(TimeControlCategory::Rapid),
            "classical" | "standard" => Ok(TimeControlCategory::Classical),
            _ => Err(format!("unknown time control category: {}", s.trim())),
        }
    }
}

/// One recorded game. Immutable once loaded into a table.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: String,
    pub rated: bool,
    pub turns: u32,
    pub white_rating: u32,
    pub black_rating: u32,
    pub winner: Winner,
    pub victory_status: VictoryStatus,
    pub time_control_category: TimeControlCategory,
    pub increment: u32,
    pub initial_time: u32,
    pub opening_name: String,
    pub opening_ply: u32,
    pub moves: Vec<String>,
}

impl GameRecord {
    /// Total clock budget of the game in seconds: base time plus one
    /// increment per recorded ply.
    pub fn duration(&self) -> u64 {
        self.initial_time as u64 + self.turns as u64 * self.increment as u64
    }
}

/// Split a stored move string into SAN tokens.
pub fn split_moves(moves: &str) -> Vec<String> {
    moves.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal record builder used by the test modules of this crate.
    pub fn game(id: &str, opening: &str, winner: Winner) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            rated: true,
            turns: 40,
            white_rating: 1500,
            black_rating: 1500,
            winner,
            victory_status: VictoryStatus::Resign,
            time_control_category: TimeControlCategory::Blitz,
            increment: 0,
            initial_time: 300,
            opening_name: opening.to_string(),
            opening_ply: 4,
            moves: split_moves("e4 e5 Nf3 Nc6 Bc4"),
        }
    }
}
