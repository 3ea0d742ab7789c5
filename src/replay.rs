//! Move replay: rebuilding the board of an opening's line at a chosen ply.
//!
//! Every call starts again from the standard initial position and applies
//! the SAN tokens in order, so no state survives between calls. The only
//! mutable state is [`ReplaySession`], which the caller owns.

use shakmaty::{
    fen::Fen, san::SanPlus, uci::UciMove, Chess, Color, EnPassantMode, Position, Role, Square,
};

use crate::error::MalformedMoveError;
use crate::opening::{get_moves_for_opening, OpeningBook};

/// The move applied last, with the squares used to draw its arrow.
///
/// Castling is reported as the king's move (`e1g1`), as renderers expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMove {
    /// Zero-based index into the replayed move list.
    pub ply: usize,
    pub san: String,
    pub from: Square,
    pub to: Square,
    pub uci: String,
}

/// Position reached after replaying a prefix of a move list.
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub position: Chess,
    /// `None` for an empty move list or an index past its end.
    pub last_move: Option<LastMove>,
    pub plies_applied: usize,
}

impl ReplayFrame {
    fn initial() -> Self {
        ReplayFrame {
            position: Chess::default(),
            last_move: None,
            plies_applied: 0,
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::new(&self.position, self.last_move.as_ref())
    }
}

/// Read a stored token as SAN without looking at any position.
pub(crate) fn parse_san(ply: usize, token: &str) -> Result<SanPlus, MalformedMoveError> {
    token.parse().map_err(|e| MalformedMoveError {
        ply,
        san: token.to_string(),
        reason: format!("unparseable san: {}", e),
    })
}

/// Apply one SAN token to `position`.
///
/// `position` is left untouched when the token is rejected.
pub fn apply_san(
    position: &mut Chess,
    ply: usize,
    token: &str,
) -> Result<LastMove, MalformedMoveError> {
    let malformed = |reason: String| MalformedMoveError {
        ply,
        san: token.to_string(),
        reason,
    };

    let san_plus = parse_san(ply, token)?;
    let m = san_plus
        .san
        .to_move(&*position)
        .map_err(|e| malformed(e.to_string()))?;

    let uci = UciMove::from_standard(m);
    let (from, to) = match uci {
        UciMove::Normal { from, to, .. } => (from, to),
        _ => return Err(malformed(format!("unexpected uci move: {}", uci))),
    };
    position.play_unchecked(m);

    Ok(LastMove {
        ply,
        san: token.to_string(),
        from,
        to,
        uci: uci.to_string(),
    })
}

/// Replay `moves[0..=index]` from the initial position.
///
/// When `index` is past the end every move is applied and `last_move` is
/// `None`. Fails on the first move that is illegal in its position.
pub fn reconstruct_position<S: AsRef<str>>(
    moves: &[S],
    index: usize,
) -> Result<ReplayFrame, MalformedMoveError> {
    let mut frame = ReplayFrame::initial();
    for (ply, token) in moves.iter().take(index.saturating_add(1)).enumerate() {
        frame.last_move = Some(apply_san(&mut frame.position, ply, token.as_ref())?);
        frame.plies_applied += 1;
    }
    if index >= moves.len() {
        frame.last_move = None;
    }
    Ok(frame)
}

/// A replay that stopped early because the stored line is corrupt.
#[derive(Debug, Clone)]
pub struct DegradedFrame {
    pub frame: ReplayFrame,
    pub fault: Option<MalformedMoveError>,
}

impl DegradedFrame {
    pub fn is_degraded(&self) -> bool {
        self.fault.is_some()
    }
}

/// Like [`reconstruct_position`], but a malformed move stops the replay at
/// the last valid ply instead of failing. The degraded frame carries no
/// highlighted move.
pub fn replay_until_fault<S: AsRef<str>>(moves: &[S], index: usize) -> DegradedFrame {
    match reconstruct_position(moves, index) {
        Ok(frame) => DegradedFrame { frame, fault: None },
        Err(fault) => {
            log::warn!("replay stopped: {}", fault);
            // the fault ply is within the requested prefix, so this succeeds
            let frame = match fault.ply.checked_sub(1) {
                Some(last_valid) => reconstruct_position(moves, last_valid)
                    .map(|mut frame| {
                        frame.last_move = None;
                        frame
                    })
                    .unwrap_or_else(|_| ReplayFrame::initial()),
                None => ReplayFrame::initial(),
            };
            DegradedFrame {
                frame,
                fault: Some(fault),
            }
        }
    }
}

/// Everything a board renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub fen: String,
    /// a1=0 .. h8=63; 0 empty, 1-6 white PNBRQK, 7-12 black pnbrqk.
    pub squares: [u8; 64],
    pub white_to_move: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub highlight: Option<(Square, Square)>,
}

impl BoardSnapshot {
    pub fn new(position: &Chess, last_move: Option<&LastMove>) -> Self {
        BoardSnapshot {
            fen: Fen::from_position(position, EnPassantMode::Legal).to_string(),
            squares: encode_squares(position),
            white_to_move: position.turn() == Color::White,
            is_check: position.is_check(),
            is_checkmate: position.is_checkmate(),
            highlight: last_move.map(|m| (m.from, m.to)),
        }
    }
}

fn encode_squares(position: &Chess) -> [u8; 64] {
    let mut squares = [0u8; 64];
    let board = position.board();
    for sq in Square::ALL {
        if let Some(piece) = board.piece_at(sq) {
            let role = match piece.role {
                Role::Pawn => 1,
                Role::Knight => 2,
                Role::Bishop => 3,
                Role::Rook => 4,
                Role::Queen => 5,
                Role::King => 6,
            };
            let color_offset = if piece.color == Color::White { 0 } else { 6 };
            squares[sq as usize] = role + color_offset;
        }
    }
    squares
}

/// Navigation state of the board panel, owned by one user session.
///
/// `current_index` stays within `[0, moves.len() - 1]` (0 for an empty
/// line); stepping past either end is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySession {
    opening: Option<String>,
    moves: Vec<String>,
    current_index: usize,
}

impl ReplaySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an opening's canonical line and rewind to its first move.
    pub fn select_opening(&mut self, book: &OpeningBook, opening_name: &str) {
        self.moves = get_moves_for_opening(book, opening_name);
        self.current_index = 0;
        self.opening = Some(opening_name.to_string());
    }

    /// Select `opening_name` unless it is already selected, keeping the
    /// index across re-renders. Returns whether the line was reset.
    pub fn ensure_opening(&mut self, book: &OpeningBook, opening_name: &str) -> bool {
        if self.opening.as_deref() == Some(opening_name) {
            return false;
        }
        self.select_opening(book, opening_name);
        true
    }

    pub fn step_forward(&mut self) -> bool {
        if self.current_index + 1 < self.moves.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    pub fn step_backward(&mut self) -> bool {
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn opening(&self) -> Option<&str> {
        self.opening.as_deref()
    }

    pub fn current_move(&self) -> Option<&str> {
        self.moves.get(self.current_index).map(String::as_str)
    }

    /// Board at the current index, degraded if the line is corrupt.
    pub fn frame(&self) -> DegradedFrame {
        replay_until_fault(&self.moves, self.current_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::split_moves;

    const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn italian_book() -> OpeningBook {
        OpeningBook::new([
            ("Italian Game", "e4 e5 Nf3 Nc6 Bc4"),
            ("Broken", "e4 e5 Ke3 Nf3"),
            ("Empty", ""),
        ])
    }

    #[test]
    fn test_reconstruct_scenario_nf3() {
        let moves = split_moves("e4 e5 Nf3 Nc6 Bc4");
        let frame = reconstruct_position(&moves, 2).unwrap();
        assert_eq!(frame.plies_applied, 3);
        assert_eq!(
            frame.snapshot().fen,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        let last = frame.last_move.unwrap();
        assert_eq!(last.ply, 2);
        assert_eq!(last.san, "Nf3");
        assert_eq!(last.from, Square::G1);
        assert_eq!(last.to, Square::F3);
        assert_eq!(last.uci, "g1f3");
    }

    #[test]
    fn test_reconstruct_empty_moves() {
        let moves: [&str; 0] = [];
        let frame = reconstruct_position(&moves, 0).unwrap();
        assert!(frame.last_move.is_none());
        assert_eq!(frame.plies_applied, 0);
        assert_eq!(frame.snapshot().fen, INITIAL_FEN);
    }

    #[test]
    fn test_reconstruct_index_past_end() {
        let moves = split_moves("e4 e5 Nf3");
        let frame = reconstruct_position(&moves, 10).unwrap();
        assert_eq!(frame.plies_applied, 3);
        assert!(frame.last_move.is_none());
        assert!(!frame.snapshot().white_to_move);
    }

    #[test]
    fn test_reconstruct_is_idempotent() {
        let moves = split_moves("d4 d5 c4 e6 Nc3 Nf6");
        let first = reconstruct_position(&moves, 4).unwrap();
        let second = reconstruct_position(&moves, 4).unwrap();
        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(first.last_move, second.last_move);
    }

    #[test]
    fn test_reconstruct_castling_reports_king_squares() {
        let moves = split_moves("e4 e5 Nf3 Nc6 Bc4 Bc5 O-O");
        let last = reconstruct_position(&moves, 6).unwrap().last_move.unwrap();
        assert_eq!(last.from, Square::E1);
        assert_eq!(last.to, Square::G1);
        assert_eq!(last.uci, "e1g1");
    }

    #[test]
    fn test_reconstruct_checkmate_suffix() {
        let moves = split_moves("f3 e5 g4 Qh4#");
        let snapshot = reconstruct_position(&moves, 3).unwrap().snapshot();
        assert!(snapshot.is_check);
        assert!(snapshot.is_checkmate);
        assert_eq!(snapshot.highlight, Some((Square::D8, Square::H4)));
    }

    #[test]
    fn test_reconstruct_illegal_move_fails_fast() {
        let moves = split_moves("e4 e5 Ke3 Nf3");
        let err = reconstruct_position(&moves, 3).unwrap_err();
        assert_eq!(err.ply, 2);
        assert_eq!(err.san, "Ke3");

        // the prefix before the fault is still fine
        assert!(reconstruct_position(&moves, 1).is_ok());
    }

    #[test]
    fn test_reconstruct_unparseable_token() {
        let moves = ["e4", "Qxh9"];
        let err = reconstruct_position(&moves, 1).unwrap_err();
        assert_eq!(err.ply, 1);
        assert!(err.reason.starts_with("unparseable san"));
    }

    #[test]
    fn test_apply_san_leaves_position_on_error() {
        let mut position = Chess::default();
        assert!(apply_san(&mut position, 0, "Nf6").is_err());
        assert_eq!(
            Fen::from_position(&position, EnPassantMode::Legal).to_string(),
            INITIAL_FEN
        );
    }

    #[test]
    fn test_replay_until_fault_stops_at_last_valid_ply() {
        let moves = split_moves("e4 e5 Ke3 Nf3");
        let degraded = replay_until_fault(&moves, 3);
        assert!(degraded.is_degraded());
        assert_eq!(degraded.fault.as_ref().map(|f| f.ply), Some(2));
        assert_eq!(degraded.frame.plies_applied, 2);
        assert!(degraded.frame.last_move.is_none());

        let first_ply_bad = replay_until_fault(&["Ke2"], 0);
        assert_eq!(first_ply_bad.frame.plies_applied, 0);
        assert_eq!(first_ply_bad.frame.snapshot().fen, INITIAL_FEN);
    }

    #[test]
    fn test_replay_until_fault_passes_valid_lines_through() {
        let moves = split_moves("e4 e5");
        let degraded = replay_until_fault(&moves, 1);
        assert!(!degraded.is_degraded());
        assert_eq!(degraded.frame.last_move.map(|m| m.uci), Some("e7e5".to_string()));
    }

    #[test]
    fn test_snapshot_square_encoding() {
        let moves = ["e4"];
        let snapshot = reconstruct_position(&moves, 0).unwrap().snapshot();
        assert_eq!(snapshot.squares[Square::E2 as usize], 0);
        assert_eq!(snapshot.squares[Square::E4 as usize], 1);
        assert_eq!(snapshot.squares[Square::E1 as usize], 6);
        assert_eq!(snapshot.squares[Square::D8 as usize], 11);
        assert!(!snapshot.white_to_move);
    }

    #[test]
    fn test_session_select_and_step() {
        let book = italian_book();
        let mut session = ReplaySession::new();
        session.select_opening(&book, "Italian Game");
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.current_move(), Some("e4"));

        assert!(session.step_forward());
        assert!(session.step_forward());
        assert_eq!(session.current_move(), Some("Nf3"));
        let frame = session.frame();
        assert_eq!(frame.frame.last_move.unwrap().to, Square::F3);

        session.select_opening(&book, "Italian Game");
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_session_clamps_at_both_ends() {
        let book = italian_book();
        let mut session = ReplaySession::new();
        session.select_opening(&book, "Italian Game");

        assert!(!session.step_backward());
        assert_eq!(session.current_index(), 0);
        for _ in 0..10 {
            session.step_forward();
        }
        assert_eq!(session.current_index(), 4);
        assert!(!session.step_forward());
        assert_eq!(session.current_index(), 4);
    }

    #[test]
    fn test_session_forward_then_backward_round_trips() {
        let book = italian_book();
        let mut session = ReplaySession::new();
        session.select_opening(&book, "Italian Game");
        for start in 0..session.moves().len() {
            while session.current_index() < start {
                session.step_forward();
            }
            while session.current_index() > start {
                session.step_backward();
            }
            let moved = session.step_forward();
            session.step_backward();
            if moved {
                assert_eq!(session.current_index(), start);
            }
            assert!(session.current_index() < session.moves().len());
        }
    }

    #[test]
    fn test_session_empty_line() {
        let book = italian_book();
        let mut session = ReplaySession::new();
        session.select_opening(&book, "Missing Opening");
        assert!(session.moves().is_empty());
        assert!(!session.step_forward());
        assert!(!session.step_backward());
        assert_eq!(session.current_move(), None);
        let frame = session.frame();
        assert!(!frame.is_degraded());
        assert!(frame.frame.last_move.is_none());

        session.select_opening(&book, "Empty");
        assert!(session.moves().is_empty());
    }

    #[test]
    fn test_session_ensure_opening_keeps_index() {
        let book = italian_book();
        let mut session = ReplaySession::new();
        assert!(session.ensure_opening(&book, "Italian Game"));
        session.step_forward();
        assert!(!session.ensure_opening(&book, "Italian Game"));
        assert_eq!(session.current_index(), 1);
        assert!(session.ensure_opening(&book, "Broken"));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.opening(), Some("Broken"));
    }

    #[test]
    fn test_session_degrades_on_broken_line() {
        let book = italian_book();
        let mut session = ReplaySession::new();
        session.select_opening(&book, "Broken");
        for _ in 0..3 {
            session.step_forward();
        }
        let frame = session.frame();
        assert!(frame.is_degraded());
        assert_eq!(frame.frame.plies_applied, 2);
    }
}
