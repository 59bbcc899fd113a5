use super::catalog::Evaluator;
use super::config::RunConfig;
use super::error::EvalError;
use super::eval::{DetectionResult, Detector, EvaluatorKind, Example, ScoreResult, Scorer};
use super::log;
use super::types::Corpus;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowOutcome {
    Completed {
        /// Clamped score; detectors report 0 or 100.
        score: i64,
        raw: i64,
        detail: String,
        /// At most the display ceiling.
        examples: Vec<Example>,
        /// Examples collected before truncation.
        collected: usize,
    },
    Failed {
        diagnostic: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: EvaluatorKind,
    pub outcome: RowOutcome,
}

impl ReportRow {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RowOutcome::Failed { .. })
    }
}

/// Scans `corpus` in order, stopping everything once `ceiling` examples are
/// held.
pub fn run_detector(
    detector: &dyn Detector,
    corpus: &Corpus,
    ceiling: usize,
) -> Result<DetectionResult, EvalError> {
    let mut result = DetectionResult::default();

    'games: for game in corpus.iter() {
        if result.examples.len() >= ceiling {
            result.ceiling_hit = true;
            break;
        }
        result.games_scanned += 1;

        for example in detector.run_one(game) {
            result.examples.push(example?);
            if result.examples.len() >= ceiling {
                result.ceiling_hit = true;
                break 'games;
            }
        }
    }

    Ok(result)
}

pub fn run_scorer(scorer: &dyn Scorer, corpus: &Corpus) -> Result<ScoreResult, EvalError> {
    scorer.evaluate(corpus)
}

fn detection_outcome(result: DetectionResult, display_ceiling: usize) -> RowOutcome {
    let collected = result.examples.len();
    let mut detail = format!(
        "{collected} example(s) in {} game(s) scanned",
        result.games_scanned
    );
    if result.ceiling_hit {
        detail.push_str(", collection ceiling reached");
    }

    let score = if result.detected() { 100 } else { 0 };
    let mut examples = result.examples;
    examples.truncate(display_ceiling);
    RowOutcome::Completed {
        score,
        raw: collected as i64,
        detail,
        examples,
        collected,
    }
}

fn score_outcome(result: ScoreResult, display_ceiling: usize) -> RowOutcome {
    let (score, raw, detail) = (result.manifold(), result.raw(), result.text().to_string());
    let mut examples = result.into_examples();
    let collected = examples.len();
    examples.truncate(display_ceiling);
    RowOutcome::Completed {
        score,
        raw,
        detail,
        examples,
        collected,
    }
}

pub fn run_evaluator(evaluator: &Evaluator, corpus: &Corpus, config: &RunConfig) -> ReportRow {
    let outcome = match evaluator {
        Evaluator::Detector(detector) => {
            run_detector(detector.as_ref(), corpus, config.collection_ceiling)
                .map(|result| detection_outcome(result, config.display_ceiling))
        }
        Evaluator::Scorer(scorer) => run_scorer(scorer.as_ref(), corpus)
            .map(|result| score_outcome(result, config.display_ceiling)),
    };

    let outcome = outcome.unwrap_or_else(|err| {
        log::error(format!("evaluator '{}' failed: {err}", evaluator.name()));
        RowOutcome::Failed {
            diagnostic: err.to_string(),
        }
    });

    ReportRow {
        name: evaluator.name(),
        description: evaluator.description(),
        kind: evaluator.kind(),
        outcome,
    }
}

/// One row per evaluator, in the order given.
pub fn run_batch<'c>(
    evaluators: impl IntoIterator<Item = &'c Evaluator>,
    corpus: &Corpus,
    config: &RunConfig,
) -> Vec<ReportRow> {
    let rows: Vec<ReportRow> = evaluators
        .into_iter()
        .map(|evaluator| {
            log::debug(format!("running '{}'", evaluator.name()));
            run_evaluator(evaluator, corpus, config)
        })
        .collect();

    let failed = rows.iter().filter(|row| row.is_failed()).count();
    log::info(format!(
        "batch over '{}': {} evaluator(s), {failed} failed",
        corpus.name,
        rows.len()
    ));
    rows
}
