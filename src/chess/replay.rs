use super::board::{Board, BoardSnapshot, Occupant};
use super::types::{GameRecord, Ply};
use shakmaty::Square;

/// A traversal of one [`GameRecord`]. Owns the only live board it mutates;
/// `0 <= ply() <= game().len()` always holds.
#[derive(Debug, Clone)]
pub struct ReplayCursor<'g> {
    game: &'g GameRecord,
    ply: usize,
    board: Board,
}

impl<'g> ReplayCursor<'g> {
    pub fn new(game: &'g GameRecord) -> Self {
        Self {
            game,
            ply: 0,
            board: Board::new(game.start()),
        }
    }

    pub fn reset_to_start(&mut self) {
        self.board.reset(self.game.start());
        self.ply = 0;
    }

    /// Applies the next ply and returns it. At the end nothing changes and
    /// `None` is returned.
    pub fn step_forward(&mut self) -> Option<&'g Ply> {
        let ply = self.game.plies().get(self.ply)?;
        self.board.apply(ply);
        self.ply += 1;
        Some(ply)
    }

    pub fn seek_to_end(&mut self) {
        while self.step_forward().is_some() {}
    }

    pub fn occupant(&self, square: Square) -> Option<Occupant> {
        self.board.occupant(square)
    }

    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn is_at_end(&self) -> bool {
        self.ply == self.game.len()
    }

    /// The most recently applied ply.
    pub fn last_ply(&self) -> Option<&'g Ply> {
        self.ply
            .checked_sub(1)
            .and_then(|idx| self.game.plies().get(idx))
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    pub fn game(&self) -> &'g GameRecord {
        self.game
    }
}

impl GameRecord {
    /// Board after the first `ply` plies, or `None` past the end.
    pub fn snapshot_at(&self, ply: usize) -> Option<BoardSnapshot> {
        if ply > self.len() {
            return None;
        }
        let mut cursor = ReplayCursor::new(self);
        for _ in 0..ply {
            cursor.step_forward();
        }
        Some(cursor.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::fixtures;
    use shakmaty::{Color, Role};

    const RUY: &str = r#"[Event "Ruy"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Bxc6 dxc6 5. O-O f6 1/2-1/2
"#;

    #[test]
    fn test_cursor_starts_at_ply_zero() {
        let game = fixtures::game(RUY);
        let cursor = ReplayCursor::new(&game);

        assert_eq!(cursor.ply(), 0);
        assert!(cursor.last_ply().is_none());
        assert!(!cursor.is_at_end());
        assert_eq!(cursor.occupant(Square::E2).unwrap().role(), Role::Pawn);
    }

    #[test]
    fn test_step_forward_returns_applied_ply() {
        let game = fixtures::game(RUY);
        let mut cursor = ReplayCursor::new(&game);

        let first = cursor.step_forward().unwrap();
        assert_eq!(first.san, "e4");
        assert_eq!(cursor.ply(), 1);
        assert_eq!(cursor.last_ply().unwrap().san, "e4");
        assert_eq!(cursor.occupant(Square::E4).unwrap().color(), Color::White);
        assert_eq!(cursor.occupant(Square::E2), None);
    }

    #[test]
    fn test_step_at_end_changes_nothing() {
        let game = fixtures::game(RUY);
        let mut cursor = ReplayCursor::new(&game);
        cursor.seek_to_end();

        assert!(cursor.is_at_end());
        assert_eq!(cursor.ply(), game.len());
        let before = cursor.snapshot();
        assert!(cursor.step_forward().is_none());
        assert_eq!(cursor.ply(), game.len());
        assert_eq!(cursor.snapshot(), before);
    }

    #[test]
    fn test_reset_returns_to_start_position() {
        let game = fixtures::game(RUY);
        let mut cursor = ReplayCursor::new(&game);
        let initial = cursor.snapshot();

        cursor.seek_to_end();
        cursor.reset_to_start();
        assert_eq!(cursor.ply(), 0);
        assert_eq!(cursor.snapshot(), initial);
    }

    #[test]
    fn test_replay_is_pure() {
        let game = fixtures::game(RUY);
        let mut first = ReplayCursor::new(&game);
        let mut second = ReplayCursor::new(&game);
        second.seek_to_end();
        second.reset_to_start();

        for ply in 0..=game.len() {
            let a = first.snapshot();
            let b = second.snapshot();
            assert_eq!(a, b);
            assert_eq!(game.snapshot_at(ply), Some(a));
            first.step_forward();
            second.step_forward();
        }
        assert_eq!(game.snapshot_at(game.len() + 1), None);
    }

    #[test]
    fn test_snapshot_is_independent_of_cursor() {
        let game = fixtures::game(RUY);
        let mut cursor = ReplayCursor::new(&game);
        cursor.step_forward();
        let taken = cursor.snapshot();
        let copy = taken.clone();

        cursor.seek_to_end();
        assert_eq!(taken, copy);
        assert_eq!(taken.occupant(Square::E4).unwrap().role(), Role::Pawn);
        assert!(taken.occupant(Square::F3).is_none());
    }

    #[test]
    fn test_capture_removes_captured_identity() {
        let game = fixtures::game(RUY);
        let mut cursor = ReplayCursor::new(&game);
        let knight = cursor.occupant(Square::B8).unwrap().id;

        // 4. Bxc6 dxc6
        for _ in 0..8 {
            cursor.step_forward();
        }
        assert_eq!(cursor.snapshot().find(knight), None);
        assert_eq!(cursor.occupant(Square::C6).unwrap().color(), Color::Black);
    }
}
