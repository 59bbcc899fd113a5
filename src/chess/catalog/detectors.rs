use crate::chess::board::{PieceId, coords, square_at};
use crate::chess::error::EvalError;
use crate::chess::eval::{Detector, Example, ExampleIter, PlyPredicate};
use crate::chess::replay::ReplayCursor;
use crate::chess::types::{GameRecord, Ply, Termination, color_name, role_name};
use shakmaty::{CastlingSide, Color, Role, Square};
use std::collections::HashMap;

const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const CORNERS: [Square; 4] = [Square::A1, Square::H1, Square::A8, Square::H8];

/// Full moves or fewer for a mate to count as quick.
pub const QUICK_MATE_MOVES: usize = 20;

fn side_name(side: CastlingSide) -> &'static str {
    match side {
        CastlingSide::KingSide => "short",
        CastlingSide::QueenSide => "long",
    }
}

fn color_slot(color: Color) -> usize {
    if color.is_white() { 0 } else { 1 }
}

/// Relative rank, 1 to 8, from the mover's side.
fn relative_rank(color: Color, square: Square) -> i32 {
    let rank = coords(square).1 + 1;
    if color.is_white() { rank } else { 9 - rank }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OppositeSideCastling;

impl PlyPredicate for OppositeSideCastling {
    type State = [Option<CastlingSide>; 2];

    fn name(&self) -> &'static str {
        "opposite_side_castling"
    }

    fn description(&self) -> &'static str {
        "White and Black castle on opposite wings in the same game"
    }

    fn check(
        &self,
        castled: &mut Self::State,
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        let Some(side) = ply.castling_side() else {
            return Ok(None);
        };
        castled[color_slot(ply.mover)] = Some(side);

        match castled[color_slot(!ply.mover)] {
            Some(other) if other != side => Ok(Some(format!(
                "{} castled {}, {} had castled {}",
                color_name(ply.mover),
                side_name(side),
                color_name(!ply.mover),
                side_name(other)
            ))),
            _ => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TwoPromotionsInOneGame;

impl PlyPredicate for TwoPromotionsInOneGame {
    type State = usize;

    fn name(&self) -> &'static str {
        "two_promotions_in_one_game"
    }

    fn description(&self) -> &'static str {
        "a game contains at least two promotions"
    }

    fn check(
        &self,
        promotions: &mut usize,
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        let Some(role) = ply.promotion() else {
            return Ok(None);
        };
        *promotions += 1;
        if *promotions == 2 {
            Ok(Some(format!(
                "second promotion of the game: {} promotes to a {}",
                color_name(ply.mover),
                role_name(role)
            )))
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Underpromotion;

impl PlyPredicate for Underpromotion {
    type State = ();

    fn name(&self) -> &'static str {
        "underpromotion"
    }

    fn description(&self) -> &'static str {
        "a pawn promotes to anything but a queen"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        Ok(ply
            .promotion()
            .filter(|role| *role != Role::Queen)
            .map(|role| {
                format!(
                    "{} underpromotes to a {} on {}",
                    color_name(ply.mover),
                    role_name(role),
                    ply.to
                )
            }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnPassantCapture;

impl PlyPredicate for EnPassantCapture {
    type State = ();

    fn name(&self) -> &'static str {
        "en_passant_capture"
    }

    fn description(&self) -> &'static str {
        "a pawn captures en passant"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if ply.is_en_passant() {
            Ok(Some(format!(
                "{} captures en passant on {}",
                color_name(ply.mover),
                ply.to
            )))
        } else {
            Ok(None)
        }
    }
}

/// Every bishop move into a corner is reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct BishopInCorner;

impl PlyPredicate for BishopInCorner {
    type State = ();

    fn name(&self) -> &'static str {
        "bishop_in_corner"
    }

    fn description(&self) -> &'static str {
        "a bishop moves into a corner square"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if ply.role == Role::Bishop && CORNERS.contains(&ply.to) {
            Ok(Some(format!(
                "{} bishop reaches the corner {}",
                color_name(ply.mover),
                ply.to
            )))
        } else {
            Ok(None)
        }
    }

    fn first_hit_only(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PawnDeliversMate;

impl PlyPredicate for PawnDeliversMate {
    type State = ();

    fn name(&self) -> &'static str {
        "pawn_delivers_mate"
    }

    fn description(&self) -> &'static str {
        "the mating move is a pawn move"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if ply.mate && ply.role == Role::Pawn {
            Ok(Some(format!("{} mates with a pawn", color_name(ply.mover))))
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CastlingWithCheck;

impl PlyPredicate for CastlingWithCheck {
    type State = ();

    fn name(&self) -> &'static str {
        "castling_with_check"
    }

    fn description(&self) -> &'static str {
        "castling gives check"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        match ply.castling_side() {
            Some(side) if ply.check => Ok(Some(format!(
                "{} castles {} with check",
                color_name(ply.mover),
                side_name(side)
            ))),
            _ => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KingOnSixthRank;

impl PlyPredicate for KingOnSixthRank {
    type State = ();

    fn name(&self) -> &'static str {
        "king_on_sixth_rank"
    }

    fn description(&self) -> &'static str {
        "a king reaches its sixth rank"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        _cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if ply.role == Role::King && relative_rank(ply.mover, ply.to) == 6 {
            Ok(Some(format!(
                "{} king walks to {}",
                color_name(ply.mover),
                ply.to
            )))
        } else {
            Ok(None)
        }
    }
}

/// A knight lands on a square attacking both the enemy king and queen.
#[derive(Clone, Copy, Debug, Default)]
pub struct KnightForksKingAndQueen;

impl PlyPredicate for KnightForksKingAndQueen {
    type State = ();

    fn name(&self) -> &'static str {
        "knight_forks_king_and_queen"
    }

    fn description(&self) -> &'static str {
        "a knight attacks the enemy king and queen at once"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if ply.role != Role::Knight || ply.promotion().is_some() {
            return Ok(None);
        }

        let (from_file, from_rank) = coords(ply.from);
        let (file, rank) = coords(ply.to);
        let jump = ((file - from_file).abs(), (rank - from_rank).abs());
        if !matches!(jump, (1, 2) | (2, 1)) {
            return Err(EvalError::InvariantViolation {
                game_index: cursor.game().index(),
                ply: cursor.ply(),
                detail: format!("knight moved from {} to {}", ply.from, ply.to),
            });
        }

        let landed = cursor
            .occupant(ply.to)
            .filter(|o| o.role() == Role::Knight && o.color() == ply.mover);
        if landed.is_none() {
            return Err(EvalError::MissingOccupant {
                game_index: cursor.game().index(),
                ply: cursor.ply(),
                square: ply.to,
            });
        }

        let (mut king, mut queen) = (false, false);
        for (df, dr) in KNIGHT_JUMPS {
            let Some(target) = square_at(file + df, rank + dr) else {
                continue;
            };
            match cursor.occupant(target) {
                Some(o) if o.color() != ply.mover && o.role() == Role::King => king = true,
                Some(o) if o.color() != ply.mover && o.role() == Role::Queen => queen = true,
                _ => {}
            }
        }

        if king && queen {
            Ok(Some(format!(
                "{} knight on {} forks king and queen",
                color_name(ply.mover),
                ply.to
            )))
        } else {
            Ok(None)
        }
    }
}

/// The same piece, by identity, makes three captures.
#[derive(Clone, Copy, Debug, Default)]
pub struct PieceCapturesThreeTimes;

impl PlyPredicate for PieceCapturesThreeTimes {
    type State = HashMap<PieceId, u32>;

    fn name(&self) -> &'static str {
        "piece_captures_three_times"
    }

    fn description(&self) -> &'static str {
        "a single piece makes three captures"
    }

    fn check(
        &self,
        captures: &mut Self::State,
        ply: &Ply,
        cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if !ply.is_capture() {
            return Ok(None);
        }
        let capturer = cursor
            .occupant(ply.to)
            .ok_or(EvalError::MissingOccupant {
                game_index: cursor.game().index(),
                ply: cursor.ply(),
                square: ply.to,
            })?;

        let count = captures.entry(capturer.id).or_insert(0);
        *count += 1;
        if *count == 3 {
            Ok(Some(format!(
                "{} {} makes its third capture on {}",
                color_name(capturer.color()),
                role_name(capturer.role()),
                ply.to
            )))
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GameEndsInStalemate;

impl PlyPredicate for GameEndsInStalemate {
    type State = ();

    fn name(&self) -> &'static str {
        "game_ends_in_stalemate"
    }

    fn description(&self) -> &'static str {
        "a game ends in stalemate on the board"
    }

    fn check(
        &self,
        _: &mut (),
        ply: &Ply,
        cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError> {
        if cursor.is_at_end() && cursor.game().termination() == Termination::Stalemate {
            Ok(Some(format!(
                "{} leaves {} without a legal move",
                color_name(ply.mover),
                color_name(!ply.mover)
            )))
        } else {
            Ok(None)
        }
    }
}

/// Mate within [`QUICK_MATE_MOVES`]. Decided from the record, then the final
/// position is replayed for the example.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuickCheckmate;

impl Detector for QuickCheckmate {
    fn name(&self) -> &'static str {
        "quick_checkmate"
    }

    fn description(&self) -> &'static str {
        "a game ends in checkmate within 20 moves"
    }

    fn run_one<'a>(&'a self, game: &'a GameRecord) -> ExampleIter<'a> {
        if game.termination() != Termination::Checkmate || game.whole_moves() > QUICK_MATE_MOVES {
            return Box::new(std::iter::empty());
        }
        let winner = game.result().winner().map_or("?", color_name);
        let text = format!("{winner} mates in {} moves", game.whole_moves());
        Box::new(std::iter::once(Ok(Example::at_end(game, text))))
    }
}
