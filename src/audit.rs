//! Load-time check that every stored move list replays legally.
//!
//! Each game's moves are fed through a `pgn-reader` visitor on a rayon
//! pool. Only the first fault of a game is reported.

use std::fmt;
use std::io::Cursor;
use std::ops::ControlFlow;

use pgn_reader::{Reader, SanPlus, Skip, Visitor};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use shakmaty::{Chess, Position};

use crate::error::{DashboardError, MalformedMoveError, Result};
use crate::game::GameRecord;
use crate::replay::parse_san;
use crate::table::GameTable;

#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    /// Worker threads; `None` uses one per logical CPU.
    pub num_threads: Option<usize>,
}

/// A game whose stored line cannot be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFault {
    pub game_id: String,
    pub error: MalformedMoveError,
}

impl fmt::Display for MoveFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game {}: {}", self.game_id, self.error)
    }
}

struct MoveAuditor<'a> {
    moves: &'a [String],
    pos: Chess,
    ply: usize,
    fault: Option<MalformedMoveError>,
}

impl<'a> MoveAuditor<'a> {
    fn new(moves: &'a [String]) -> Self {
        MoveAuditor {
            moves,
            pos: Chess::default(),
            ply: 0,
            fault: None,
        }
    }

    fn set_fault(&mut self, san: String, reason: String) {
        self.fault = Some(MalformedMoveError {
            ply: self.ply,
            san,
            reason,
        });
    }

    /// Fault for the stored token at the current ply, which the reader
    /// skipped or read differently.
    fn unread_token_fault(&self) -> MalformedMoveError {
        let token = &self.moves[self.ply];
        match parse_san(self.ply, token) {
            Err(fault) => fault,
            Ok(_) => MalformedMoveError {
                ply: self.ply,
                san: token.clone(),
                reason: "not read as a move".to_string(),
            },
        }
    }
}

impl Visitor for MoveAuditor<'_> {
    type Tags = ();
    type Movetext = ();
    type Output = Option<MalformedMoveError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        self.pos = Chess::default();
        self.ply = 0;
        self.fault = None;
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        if self.fault.is_some() {
            return ControlFlow::Continue(());
        }
        // the reader drops tokens it cannot read as san, so keep in step
        // with the stored list
        let Some(stored) = self.moves.get(self.ply) else {
            self.set_fault(san_plus.to_string(), "more moves than stored".to_string());
            return ControlFlow::Continue(());
        };
        if parse_san(self.ply, stored).ok().as_ref() != Some(&san_plus) {
            self.fault = Some(self.unread_token_fault());
            return ControlFlow::Continue(());
        }
        match san_plus.san.to_move(&self.pos) {
            Ok(m) => {
                self.pos.play_unchecked(m);
                self.ply += 1;
            }
            Err(err) => self.set_fault(san_plus.to_string(), err.to_string()),
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {
        if self.fault.is_none() && self.ply < self.moves.len() {
            self.fault = Some(self.unread_token_fault());
        }
        self.fault.take()
    }
}

/// First illegal ply of one game, if any.
pub fn audit_game(game: &GameRecord) -> Result<Option<MalformedMoveError>> {
    let movetext = game.moves.join(" ");
    let mut reader = Reader::new(Cursor::new(movetext.as_bytes()));
    let mut auditor = MoveAuditor::new(&game.moves);

    match reader.read_game(&mut auditor) {
        Ok(Some(fault)) => Ok(fault),
        Ok(None) => Ok(None),
        Err(source) => Err(DashboardError::Movetext {
            game_id: game.id.clone(),
            source,
        }),
    }
}

/// Audit every game of `table`, in table order.
pub fn audit_moves(table: &GameTable, config: &AuditConfig) -> Result<Vec<MoveFault>> {
    let num_threads = config.num_threads.unwrap_or_else(num_cpus::get);
    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| DashboardError::ThreadPool(e.to_string()))?;

    let per_game = thread_pool.install(|| {
        table
            .games()
            .par_iter()
            .map(|game| {
                audit_game(game).map(|fault| {
                    fault.map(|error| MoveFault {
                        game_id: game.id.clone(),
                        error,
                    })
                })
            })
            .collect::<Result<Vec<Option<MoveFault>>>>()
    })?;

    let faults: Vec<MoveFault> = per_game.into_iter().flatten().collect();
    if !faults.is_empty() {
        log::warn!(
            "{} of {} games have unplayable move lists",
            faults.len(),
            table.len()
        );
    }
    Ok(faults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures::game;
    use crate::game::{split_moves, Winner};

    fn with_moves(id: &str, moves: &str) -> GameRecord {
        let mut g = game(id, "Test Opening", Winner::White);
        g.moves = split_moves(moves);
        g
    }

    fn single_thread() -> AuditConfig {
        AuditConfig {
            num_threads: Some(1),
        }
    }

    #[test]
    fn test_audit_clean_game() {
        let g = with_moves("1", "e4 e5 Nf3 Nc6 Bc4 Bc5 O-O Nf6");
        assert_eq!(audit_game(&g).unwrap(), None);
    }

    #[test]
    fn test_audit_empty_moves() {
        let g = with_moves("1", "");
        assert_eq!(audit_game(&g).unwrap(), None);
    }

    #[test]
    fn test_audit_reports_first_illegal_ply() {
        let g = with_moves("1", "e4 e5 Ke3 Nf3 Kd8");
        let fault = audit_game(&g).unwrap().unwrap();
        assert_eq!(fault.ply, 2);
        assert_eq!(fault.san, "Ke3");
    }

    #[test]
    fn test_audit_blames_unreadable_token_mid_line() {
        let g = with_moves("1", "e4 zz9 e5 Nf3");
        let fault = audit_game(&g).unwrap().unwrap();
        assert_eq!(fault.ply, 1);
        assert_eq!(fault.san, "zz9");

        let replayed = crate::replay::reconstruct_position(&g.moves, 3).unwrap_err();
        assert_eq!(fault, replayed);
    }

    #[test]
    fn test_audit_blames_unreadable_trailing_token() {
        let g = with_moves("1", "e4 e5 zz9");
        let fault = audit_game(&g).unwrap().unwrap();
        assert_eq!(fault.ply, 2);
        assert_eq!(fault.san, "zz9");
    }

    #[test]
    fn test_audit_moves_keeps_table_order() {
        let table = GameTable::new(vec![
            with_moves("a", "e4 e5"),
            with_moves("b", "e4 e4"),
            with_moves("c", "d4 d5 c4"),
            with_moves("d", "Nf6"),
        ]);
        let faults = audit_moves(&table, &single_thread()).unwrap();
        let ids: Vec<&str> = faults.iter().map(|f| f.game_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
        assert_eq!(faults[0].error.ply, 1);
        assert_eq!(faults[1].error.ply, 0);
    }

    #[test]
    fn test_audit_moves_multi_threaded() {
        let games: Vec<GameRecord> = (0..64)
            .map(|i| {
                if i % 8 == 0 {
                    with_moves(&i.to_string(), "e4 e5 Qh5 Ke7 Qxe5 Kxe5")
                } else {
                    with_moves(&i.to_string(), "e4 e5 Nf3")
                }
            })
            .collect();
        let table = GameTable::new(games);
        let config = AuditConfig {
            num_threads: Some(4),
        };
        let faults = audit_moves(&table, &config).unwrap();
        assert_eq!(faults.len(), 8);
        assert!(faults.iter().all(|f| f.error.ply == 5));
        assert_eq!(faults[1].game_id, "8");
    }

    #[test]
    fn test_move_fault_display() {
        let fault = MoveFault {
            game_id: "x1".to_string(),
            error: MalformedMoveError {
                ply: 0,
                san: "Nf6".to_string(),
                reason: "illegal san".to_string(),
            },
        };
        assert_eq!(
            fault.to_string(),
            "game x1: illegal move \"Nf6\" at ply 0: illegal san"
        );
    }
}
