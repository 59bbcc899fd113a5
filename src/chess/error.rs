use shakmaty::Square;
use thiserror::Error;

/// Joins non-fatal diagnostics for one record with `"; "`.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Why a raw record was left out of the corpus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("record has no header block")]
    MissingHeaders,
    #[error("record has no movetext block")]
    MissingMovetext,
    #[error("pgn parser failed: {0}")]
    Parser(String),
    #[error("invalid FEN tag '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("token '{token}' at ply {ply} rejected twice: {reason}")]
    IllegalMove {
        ply: usize,
        token: String,
        reason: String,
    },
    #[error("game has no terminal state and result token {0:?} cannot be mapped")]
    UnresolvedResult(Option<String>),
    #[error("{0} game(s) after the first share the record and were not read")]
    UnreadGames(usize),
}

/// Failure of a single evaluator run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invariant violated in game {game_index} at ply {ply}: {detail}")]
    InvariantViolation {
        game_index: usize,
        ply: usize,
        detail: String,
    },
    #[error("square {square} expected to be occupied in game {game_index} at ply {ply}")]
    MissingOccupant {
        game_index: usize,
        ply: usize,
        square: Square,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("evaluator '{0}' is already registered")]
    DuplicateName(String),
    #[error("unknown evaluator '{0}'")]
    UnknownName(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("collection ceiling must be at least 1")]
    ZeroCollectionCeiling,
    #[error("display ceiling must be at least 1")]
    ZeroDisplayCeiling,
    #[error("display ceiling {display} must be smaller than collection ceiling {collection}")]
    DisplayNotBelowCollection { display: usize, collection: usize },
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to open file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initialize zstd decoder for '{path}': {source}")]
    Zstd {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("no archive matched '{0}'")]
    NoMatch(String),
}
