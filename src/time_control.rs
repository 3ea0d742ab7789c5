//! Parsing of `increment_code` values such as `"15+2"` and classification
//! into a [`TimeControlCategory`].
//!
//! The base time of an increment code is given in minutes and the
//! increment in seconds; both are stored in seconds.

use nom::{
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map_res},
    sequence::{delimited, separated_pair},
    IResult, Parser,
};

use crate::error::{DashboardError, Result};
use crate::game::TimeControlCategory;

/// Number of moves used to estimate a game's length from its increment.
const ESTIMATED_MOVES: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeControl {
    pub initial_seconds: u32,
    pub increment_seconds: u32,
}

impl TimeControl {
    /// Base time plus forty increments, in seconds.
    pub fn estimated_seconds(&self) -> u64 {
        self.initial_seconds as u64 + ESTIMATED_MOVES as u64 * self.increment_seconds as u64
    }

    pub fn category(&self) -> TimeControlCategory {
        category_for(self.initial_seconds, self.increment_seconds)
    }
}

/// Classify a base time and increment, both in seconds.
pub fn category_for(initial_seconds: u32, increment_seconds: u32) -> TimeControlCategory {
    let estimated = TimeControl {
        initial_seconds,
        increment_seconds,
    }
    .estimated_seconds();
    match estimated {
        0..=29 => TimeControlCategory::UltraBullet,
        30..=179 => TimeControlCategory::Bullet,
        180..=479 => TimeControlCategory::Blitz,
        480..=1499 => TimeControlCategory::Rapid,
        _ => TimeControlCategory::Classical,
    }
}

/// Parser for an unsigned integer
fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

/// Parser for `<minutes>+<seconds>` with optional spacing around each part
fn increment_code(input: &str) -> IResult<&str, (u32, u32)> {
    separated_pair(
        delimited(space0, number, space0),
        char('+'),
        delimited(space0, number, space0),
    )
    .parse(input)
}

pub fn parse_increment_code(raw: &str) -> Result<TimeControl> {
    let invalid = || DashboardError::InvalidTimeControl(raw.to_string());
    let (_, (minutes, increment_seconds)) = all_consuming(increment_code)
        .parse(raw)
        .map_err(|_| invalid())?;
    let initial_seconds = minutes.checked_mul(60).ok_or_else(invalid)?;
    Ok(TimeControl {
        initial_seconds,
        increment_seconds,
    })
}
