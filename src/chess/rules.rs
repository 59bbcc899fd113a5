use super::types::{GameResult, Ply, SpecialMove, Termination};
use shakmaty::{CastlingSide, Chess, Color, File, Piece, Position, Square, san::SanPlus};

/// Result of feeding one SAN token to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied(Ply),
    /// The position was already terminal; the token was not consumed.
    GameAlreadyEnded,
    Rejected(String),
}

/// End-of-game declaration forced on the engine when the board never reached
/// a terminal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    Resignation(Color),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conclusion {
    pub result: GameResult,
    pub termination: Termination,
}

pub trait RulesEngine {
    fn apply_san(&mut self, san: &SanPlus) -> MoveOutcome;

    /// Forces an end of game. A natural conclusion already reached wins over
    /// the declaration.
    fn declare_end(&mut self, declaration: Declaration) -> Conclusion;

    fn conclusion(&self) -> Option<Conclusion>;

    fn occupant(&self, square: Square) -> Option<Piece>;
}

#[derive(Debug, Clone)]
pub struct ShakmatyRules {
    position: Chess,
    conclusion: Option<Conclusion>,
}

impl ShakmatyRules {
    pub fn new(start: Chess) -> Self {
        let conclusion = natural_conclusion(&start);
        Self {
            position: start,
            conclusion,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }
}

impl Default for ShakmatyRules {
    fn default() -> Self {
        Self::new(Chess::default())
    }
}

impl RulesEngine for ShakmatyRules {
    fn apply_san(&mut self, san: &SanPlus) -> MoveOutcome {
        if self.conclusion.is_some() {
            return MoveOutcome::GameAlreadyEnded;
        }

        let mv = match san.san.to_move(&self.position) {
            Ok(mv) => mv,
            Err(err) => return MoveOutcome::Rejected(format!("{san}: {err}")),
        };
        let Some(from) = mv.from() else {
            return MoveOutcome::Rejected(format!("{san}: not a board move"));
        };

        let mover = self.position.turn();
        let move_number = self.position.fullmoves().get();
        let castling_side = mv.castling_side();
        let special = if let Some(side) = castling_side {
            Some(SpecialMove::Castle(side))
        } else if mv.is_en_passant() {
            Some(SpecialMove::EnPassant)
        } else {
            mv.promotion().map(SpecialMove::Promotion)
        };
        let to = match castling_side {
            Some(side) => castle_targets(from, side).0,
            None => mv.to(),
        };
        let role = mv.role();
        let captured = mv.capture();

        self.position.play_unchecked(mv.clone());

        let check = self.position.is_check();
        let mate = self.position.is_checkmate();
        self.conclusion = natural_conclusion(&self.position);

        let mut san_text = san.san.to_string();
        if mate {
            san_text.push('#');
        } else if check {
            san_text.push('+');
        }

        MoveOutcome::Applied(Ply {
            mover,
            role,
            from,
            to,
            captured,
            special,
            check,
            mate,
            san: san_text,
            move_number,
            mv,
        })
    }

    fn declare_end(&mut self, declaration: Declaration) -> Conclusion {
        if let Some(existing) = self.conclusion {
            return existing;
        }

        let conclusion = match declaration {
            Declaration::Resignation(loser) => Conclusion {
                result: GameResult::decisive(!loser),
                termination: Termination::Resignation,
            },
            Declaration::Draw => Conclusion {
                result: GameResult::Draw,
                termination: Termination::DrawDeclared,
            },
        };
        self.conclusion = Some(conclusion);
        conclusion
    }

    fn conclusion(&self) -> Option<Conclusion> {
        self.conclusion
    }

    fn occupant(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }
}

fn natural_conclusion(position: &Chess) -> Option<Conclusion> {
    if position.is_checkmate() {
        Some(Conclusion {
            result: GameResult::decisive(!position.turn()),
            termination: Termination::Checkmate,
        })
    } else if position.is_stalemate() {
        Some(Conclusion {
            result: GameResult::Draw,
            termination: Termination::Stalemate,
        })
    } else if position.is_insufficient_material() {
        Some(Conclusion {
            result: GameResult::Draw,
            termination: Termination::InsufficientMaterial,
        })
    } else {
        None
    }
}

/// King and rook destinations for a castle by the king standing on `king`.
pub(crate) fn castle_targets(king: Square, side: CastlingSide) -> (Square, Square) {
    let (king_file, rook_file) = match side {
        CastlingSide::KingSide => (File::G, File::F),
        CastlingSide::QueenSide => (File::C, File::D),
    };
    (
        Square::from_coords(king_file, king.rank()),
        Square::from_coords(rook_file, king.rank()),
    )
}
