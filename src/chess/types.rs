use chrono::NaiveDate;
use shakmaty::{CastlingSide, Chess, Color, Move, Role, Square};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    pub event: Option<String>,
    pub site: Option<String>,
    pub round: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_elo: Option<u32>,
    pub black_elo: Option<u32>,
    pub date: Option<NaiveDate>,
    pub eco: Option<String>,
    pub termination: Option<String>,
    /// Raw `Result` tag, used only when the movetext carries no result token.
    pub result_tag: Option<String>,
    pub fen: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    /// `*`: the archive does not know how the game ended.
    Unresolved,
}

impl GameResult {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Unresolved),
            _ => None,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            Self::WhiteWins => Some(Color::White),
            Self::BlackWins => Some(Color::Black),
            Self::Draw | Self::Unresolved => None,
        }
    }

    pub fn is_decisive(self) -> bool {
        self.winner().is_some()
    }

    pub fn decisive(winner: Color) -> Self {
        if winner.is_white() {
            Self::WhiteWins
        } else {
            Self::BlackWins
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Unresolved => "*",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    /// Forced from a decisive result token without a mate on the board.
    Resignation,
    /// Forced from a drawn result token without a terminal position.
    DrawDeclared,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::InsufficientMaterial => "insufficient_material",
            Self::Resignation => "resignation",
            Self::DrawDeclared => "draw_declared",
        }
    }

    /// Reached on the board rather than forced from the result token.
    pub fn is_natural(self) -> bool {
        matches!(
            self,
            Self::Checkmate | Self::Stalemate | Self::InsufficientMaterial
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialMove {
    Promotion(Role),
    Castle(CastlingSide),
    EnPassant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ply {
    pub mover: Color,
    pub role: Role,
    pub from: Square,
    /// For castling this is the king's destination.
    pub to: Square,
    pub captured: Option<Role>,
    pub special: Option<SpecialMove>,
    pub check: bool,
    pub mate: bool,
    pub san: String,
    pub move_number: u32,
    pub(crate) mv: Move,
}

impl Ply {
    pub fn promotion(&self) -> Option<Role> {
        match self.special {
            Some(SpecialMove::Promotion(role)) => Some(role),
            _ => None,
        }
    }

    pub fn castling_side(&self) -> Option<CastlingSide> {
        match self.special {
            Some(SpecialMove::Castle(side)) => Some(side),
            _ => None,
        }
    }

    pub fn is_en_passant(&self) -> bool {
        self.special == Some(SpecialMove::EnPassant)
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn label(&self) -> String {
        format!("move {}, {}", self.move_number, color_name(self.mover))
    }
}

pub fn color_name(color: Color) -> &'static str {
    if color.is_white() { "White" } else { "Black" }
}

pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

/// An ingested game. Immutable once built by the normalizer.
#[derive(Debug, Clone)]
pub struct GameRecord {
    index: usize,
    headers: Headers,
    start: Chess,
    plies: Vec<Ply>,
    result: GameResult,
    termination: Termination,
    diagnostics: Option<String>,
    unread_games: usize,
}

impl GameRecord {
    pub(crate) fn new(
        index: usize,
        headers: Headers,
        start: Chess,
        plies: Vec<Ply>,
        result: GameResult,
        termination: Termination,
        diagnostics: Option<String>,
    ) -> Self {
        Self {
            index,
            headers,
            start,
            plies,
            result,
            termination,
            diagnostics,
            unread_games: 0,
        }
    }

    pub(crate) fn with_unread_games(mut self, unread_games: usize) -> Self {
        self.unread_games = unread_games;
        self
    }

    /// Position of the record in the loaded input (0-based, skipped records count).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn start(&self) -> &Chess {
        &self.start
    }

    pub fn plies(&self) -> &[Ply] {
        &self.plies
    }

    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    /// Whole moves, counting a trailing half-move as a full one.
    pub fn whole_moves(&self) -> usize {
        self.plies.len().div_ceil(2)
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }

    /// Games that followed this one inside the same raw record.
    pub fn unread_games(&self) -> usize {
        self.unread_games
    }

    pub fn title(&self) -> String {
        format!(
            "{} - {}",
            self.headers.white.as_deref().unwrap_or("?"),
            self.headers.black.as_deref().unwrap_or("?")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: crate::chess::error::IngestError,
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub name: String,
    pub games: Vec<GameRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl Corpus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            games: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GameRecord> {
        self.games.iter()
    }

    pub fn extend(&mut self, other: Corpus) {
        self.games.extend(other.games);
        self.skipped.extend(other.skipped);
    }

    /// Summary line followed by one line per skipped record.
    pub fn load_summary(&self) -> String {
        let mut summary = format!(
            "corpus '{}': {} games loaded, {} skipped",
            self.name,
            self.games.len(),
            self.skipped.len()
        );
        for skipped in &self.skipped {
            summary.push_str(&format!(
                "\n  record {}: {}",
                skipped.index, skipped.reason
            ));
        }
        summary
    }
}
