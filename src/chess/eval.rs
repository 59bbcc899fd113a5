//! Evaluator contracts and result types.

use super::board::BoardSnapshot;
use super::error::EvalError;
use super::replay::ReplayCursor;
use super::types::{Corpus, GameRecord, Ply};

/// Presentation score: `raw` clamped to `[0, 100]`.
pub fn manifold(raw: i64) -> i64 {
    raw.clamp(0, 100)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvaluatorKind {
    Detector,
    Scorer,
}

impl EvaluatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detector => "detector",
            Self::Scorer => "scorer",
        }
    }
}

/// Evidence captured at one ply. The board is an owned copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    pub board: BoardSnapshot,
    pub game_index: usize,
    /// Plies applied when the example was taken.
    pub ply: usize,
    /// `move N, Color` of the last applied ply, or `start` at ply 0.
    pub label: String,
    pub san: Option<String>,
    pub title: String,
    pub text: String,
    pub value: Option<i64>,
}

impl Example {
    pub fn at(cursor: &ReplayCursor<'_>, text: impl Into<String>) -> Self {
        let last = cursor.last_ply();
        Self {
            board: cursor.snapshot(),
            game_index: cursor.game().index(),
            ply: cursor.ply(),
            label: last.map_or_else(|| "start".to_string(), Ply::label),
            san: last.map(|ply| ply.san.clone()),
            title: cursor.game().title(),
            text: text.into(),
            value: None,
        }
    }

    pub fn at_end(game: &GameRecord, text: impl Into<String>) -> Self {
        let mut cursor = ReplayCursor::new(game);
        cursor.seek_to_end();
        Self::at(&cursor, text)
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub examples: Vec<Example>,
    pub games_scanned: usize,
    pub ceiling_hit: bool,
}

impl DetectionResult {
    pub fn detected(&self) -> bool {
        !self.examples.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreResult {
    raw: i64,
    manifold: i64,
    text: String,
    examples: Vec<Example>,
}

impl ScoreResult {
    pub fn new(raw: i64, text: impl Into<String>, examples: Vec<Example>) -> Self {
        Self {
            raw,
            manifold: manifold(raw),
            text: text.into(),
            examples,
        }
    }

    pub fn raw(&self) -> i64 {
        self.raw
    }

    pub fn manifold(&self) -> i64 {
        self.manifold
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn into_examples(self) -> Vec<Example> {
        self.examples
    }
}

pub type ExampleIter<'a> = Box<dyn Iterator<Item = Result<Example, EvalError>> + 'a>;

pub trait Detector {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Examples for one game, in ply order. Every call starts its own
    /// traversal; nothing carries over between calls.
    fn run_one<'a>(&'a self, game: &'a GameRecord) -> ExampleIter<'a>;
}

pub trait Scorer {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn evaluate(&self, corpus: &Corpus) -> Result<ScoreResult, EvalError>;
}

/// One game's contribution to a decomposed scorer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub game_index: usize,
    pub value: i64,
    pub example: Option<Example>,
}

impl Measurement {
    pub fn new(game: &GameRecord, value: i64, example: Option<Example>) -> Self {
        Self {
            game_index: game.index(),
            value,
            example: example.map(|example| example.with_value(value)),
        }
    }
}

/// A scorer split into a per-game measurement and a corpus-wide reduction.
/// `aggregate` receives measurements in corpus order.
pub trait GameMeasure {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError>;

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult;
}

#[derive(Clone, Debug, Default)]
pub struct Decomposed<M>(pub M);

impl<M: GameMeasure> Scorer for Decomposed<M> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn description(&self) -> &'static str {
        self.0.description()
    }

    fn evaluate(&self, corpus: &Corpus) -> Result<ScoreResult, EvalError> {
        let measurements = corpus
            .iter()
            .map(|game| self.0.inner_evaluate(game))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.0.aggregate(measurements))
    }
}

/// The first measurement holding the largest value. Later equal values lose.
pub fn first_maximum(measurements: Vec<Measurement>) -> Option<Measurement> {
    let mut best: Option<Measurement> = None;
    for measurement in measurements {
        if best.as_ref().is_none_or(|b| measurement.value > b.value) {
            best = Some(measurement);
        }
    }
    best
}

/// A condition checked after every applied ply of a game.
pub trait PlyPredicate {
    /// Per-game scratch state, fresh for every traversal.
    type State: Default;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Called once the cursor has applied `ply`. `Some(text)` is a hit.
    fn check(
        &self,
        state: &mut Self::State,
        ply: &Ply,
        cursor: &ReplayCursor<'_>,
    ) -> Result<Option<String>, EvalError>;

    /// Stop the game at the first hit.
    fn first_hit_only(&self) -> bool {
        true
    }
}

/// Lazy example sequence of one [`PlyPredicate`] over one game. Owns its
/// cursor and stops for good after the end of the game or an error.
pub struct PlyDetector<'a, P: PlyPredicate> {
    predicate: &'a P,
    cursor: ReplayCursor<'a>,
    state: P::State,
    done: bool,
}

impl<'a, P: PlyPredicate> PlyDetector<'a, P> {
    pub fn new(predicate: &'a P, game: &'a GameRecord) -> Self {
        let mut cursor = ReplayCursor::new(game);
        cursor.reset_to_start();
        Self {
            predicate,
            cursor,
            state: P::State::default(),
            done: false,
        }
    }
}

impl<P: PlyPredicate> Iterator for PlyDetector<'_, P> {
    type Item = Result<Example, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(ply) = self.cursor.step_forward() else {
                self.done = true;
                break;
            };
            match self.predicate.check(&mut self.state, ply, &self.cursor) {
                Ok(None) => {}
                Ok(Some(text)) => {
                    self.done = self.predicate.first_hit_only();
                    return Some(Ok(Example::at(&self.cursor, text)));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct PerPly<P>(pub P);

impl<P: PlyPredicate> Detector for PerPly<P> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn description(&self) -> &'static str {
        self.0.description()
    }

    fn run_one<'a>(&'a self, game: &'a GameRecord) -> ExampleIter<'a> {
        Box::new(PlyDetector::new(&self.0, game))
    }
}
