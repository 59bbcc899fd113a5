use super::rules::castle_targets;
use super::types::Ply;
use shakmaty::{CastlingSide, Chess, Color, Move, Piece, Position, Role, Square};
use std::fmt::Write;

/// Identity given to every piece of the starting position, in square order.
/// A promoted pawn keeps its identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    pub piece: Piece,
    pub id: PieceId,
}

impl Occupant {
    pub fn color(&self) -> Color {
        self.piece.color
    }

    pub fn role(&self) -> Role {
        self.piece.role
    }
}

#[inline]
pub(crate) fn square_index(square: Square) -> usize {
    usize::from(square)
}

pub fn coords(square: Square) -> (i32, i32) {
    let idx = square_index(square) as i32;
    (idx % 8, idx / 8)
}

/// Inverse of [`coords`]; `None` off the board.
pub fn square_at(file: i32, rank: i32) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Square::ALL.get((rank * 8 + file) as usize).copied()
    } else {
        None
    }
}

pub fn material_value(role: Role) -> i64 {
    match role {
        Role::Pawn => 1,
        Role::Knight | Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

fn piece_char(piece: Piece) -> char {
    let c = piece.role.char();
    if piece.color.is_white() {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

/// Owned copy of the occupants of all 64 squares at one ply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSnapshot {
    squares: [Option<Occupant>; 64],
    turn: Color,
}

impl BoardSnapshot {
    pub fn occupant(&self, square: Square) -> Option<Occupant> {
        self.squares[square_index(square)]
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Square, Occupant)> + '_ {
        Square::ALL
            .iter()
            .zip(self.squares.iter())
            .filter_map(|(square, occupant)| occupant.map(|o| (*square, o)))
    }

    pub fn count(&self, color: Color, role: Role) -> usize {
        self.occupied()
            .filter(|(_, o)| o.color() == color && o.role() == role)
            .count()
    }

    pub fn material(&self, color: Color) -> i64 {
        self.occupied()
            .filter(|(_, o)| o.color() == color)
            .map(|(_, o)| material_value(o.role()))
            .sum()
    }

    /// Material balance from White's point of view.
    pub fn material_balance(&self) -> i64 {
        self.material(Color::White) - self.material(Color::Black)
    }

    pub fn find(&self, id: PieceId) -> Option<Square> {
        self.occupied()
            .find(|(_, o)| o.id == id)
            .map(|(square, _)| square)
    }

    /// ASCII diagram, rank 8 first, White in upper case.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(200);
        for rank in (0..8).rev() {
            let _ = write!(out, "{} ", rank + 1);
            for file in 0..8 {
                let c = self.squares[rank * 8 + file].map_or('.', |o| piece_char(o.piece));
                out.push(c);
                if file < 7 {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h");
        out
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    position: Chess,
    ids: [Option<PieceId>; 64],
}

impl Board {
    pub fn new(start: &Chess) -> Self {
        let mut ids = [None; 64];
        let mut next = 0u8;
        for square in Square::ALL {
            if start.board().piece_at(square).is_some() {
                ids[square_index(square)] = Some(PieceId(next));
                next += 1;
            }
        }

        Self {
            position: start.clone(),
            ids,
        }
    }

    pub fn reset(&mut self, start: &Chess) {
        *self = Self::new(start);
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn occupant(&self, square: Square) -> Option<Occupant> {
        let piece = self.position.board().piece_at(square)?;
        let id = self.ids[square_index(square)]?;
        Some(Occupant { piece, id })
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut squares = [None; 64];
        for square in Square::ALL {
            squares[square_index(square)] = self.occupant(square);
        }
        BoardSnapshot {
            squares,
            turn: self.position.turn(),
        }
    }

    /// Applies a ply produced by the rules engine from this very position.
    pub(crate) fn apply(&mut self, ply: &Ply) {
        match &ply.mv {
            Move::Castle { king, rook } => {
                let side = if square_index(*rook) > square_index(*king) {
                    CastlingSide::KingSide
                } else {
                    CastlingSide::QueenSide
                };
                let (king_to, rook_to) = castle_targets(*king, side);
                let king_id = self.ids[square_index(*king)].take();
                let rook_id = self.ids[square_index(*rook)].take();
                self.ids[square_index(king_to)] = king_id;
                self.ids[square_index(rook_to)] = rook_id;
            }
            Move::EnPassant { from, to } => {
                let victim = Square::from_coords(to.file(), from.rank());
                self.ids[square_index(victim)] = None;
                let id = self.ids[square_index(*from)].take();
                self.ids[square_index(*to)] = id;
            }
            Move::Normal { from, to, .. } => {
                let id = self.ids[square_index(*from)].take();
                self.ids[square_index(*to)] = id;
            }
            Move::Put { .. } => {}
        }

        self.position.play_unchecked(ply.mv.clone());
    }
}
