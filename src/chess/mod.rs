pub mod archive;
pub mod batch;
pub mod board;
pub mod catalog;
pub mod config;
pub mod error;
pub mod eval;
pub mod log;
pub mod normalize;
pub mod reader;
pub mod replay;
pub mod report;
pub mod rules;
pub mod types;
pub mod visitor;

#[cfg(test)]
pub(crate) mod fixtures;

pub use batch::{ReportRow, RowOutcome, run_batch};
pub use catalog::{Catalog, Evaluator};
pub use config::RunConfig;
pub use error::{CatalogError, ConfigError, ErrorAccumulator, EvalError, IngestError, ReadError};
pub use eval::{
    Decomposed, DetectionResult, Detector, Example, GameMeasure, Measurement, PerPly,
    PlyPredicate, ScoreResult, Scorer, manifold,
};
pub use normalize::ingest_archive;
pub use reader::{CompressionMode, load_corpus};
pub use replay::ReplayCursor;
pub use types::{Corpus, GameRecord, GameResult, Ply, Termination};
