//! Error types for table ingestion and move replay.
//!
//! Empty filter results and lookup misses are not errors; they come back
//! as empty collections or `None`.

use std::{io, result};

/// Crate-wide result type.
pub type Result<T> = result::Result<T, DashboardError>;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("unsupported arrow type for column {column}: {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("invalid time control: {0:?}")]
    InvalidTimeControl(String),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("failed to read moves of game {game_id}: {source}")]
    Movetext {
        game_id: String,
        #[source]
        source: io::Error,
    },
}

/// A stored move that is not legal in the reconstructed position.
///
/// `ply` is zero-based and indexes the move list that was being replayed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal move {san:?} at ply {ply}: {reason}")]
pub struct MalformedMoveError {
    pub ply: usize,
    pub san: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_move_display() {
        let err = MalformedMoveError {
            ply: 3,
            san: "Qxh9".to_string(),
            reason: "invalid san".to_string(),
        };
        assert_eq!(err.to_string(), "illegal move \"Qxh9\" at ply 3: invalid san");
    }

    #[test]
    fn test_missing_column_display() {
        let err = DashboardError::MissingColumn("winner".to_string());
        assert_eq!(err.to_string(), "missing column: winner");
    }
}
