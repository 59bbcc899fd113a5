use crate::chess::board::BoardSnapshot;
use crate::chess::error::EvalError;
use crate::chess::eval::{Example, GameMeasure, Measurement, ScoreResult, Scorer, first_maximum};
use crate::chess::replay::ReplayCursor;
use crate::chess::types::{Corpus, GameRecord, GameResult, Termination, color_name};
use shakmaty::{Color, Role};

fn leader(balance: i64) -> &'static str {
    color_name(if balance > 0 { Color::White } else { Color::Black })
}

/// Result built around the first game holding the maximum measurement.
fn maximum_result(measurements: Vec<Measurement>, describe: impl Fn(i64) -> String) -> ScoreResult {
    match first_maximum(measurements) {
        Some(best) => ScoreResult::new(
            best.value,
            format!("{} (game {})", describe(best.value), best.game_index),
            best.example.into_iter().collect(),
        ),
        None => ScoreResult::new(0, "empty corpus", Vec::new()),
    }
}

/// Largest `|balance|` over every position of `game`, starting position
/// included. The example is taken where the peak is first reached.
fn peak_balance(
    game: &GameRecord,
    balance: impl Fn(&BoardSnapshot) -> i64,
    describe: impl Fn(i64) -> String,
) -> Measurement {
    let mut cursor = ReplayCursor::new(game);
    let mut best = 0;
    let mut example = None;

    loop {
        let signed = balance(&cursor.snapshot());
        if signed.abs() > best {
            best = signed.abs();
            example = Some(Example::at(&cursor, describe(signed)));
        }
        if cursor.step_forward().is_none() {
            break;
        }
    }

    Measurement::new(game, best, example)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LongestGame;

impl Scorer for LongestGame {
    fn name(&self) -> &'static str {
        "longest_game"
    }

    fn description(&self) -> &'static str {
        "length in whole moves of the longest game"
    }

    fn evaluate(&self, corpus: &Corpus) -> Result<ScoreResult, EvalError> {
        let mut longest: Option<&GameRecord> = None;
        for game in corpus.iter() {
            if longest.is_none_or(|best| game.whole_moves() > best.whole_moves()) {
                longest = Some(game);
            }
        }

        let Some(game) = longest else {
            return Ok(ScoreResult::new(0, "empty corpus", Vec::new()));
        };
        let moves = game.whole_moves() as i64;
        let text = format!(
            "{} lasted {moves} moves ({} plies)",
            game.title(),
            game.len()
        );
        let example = Example::at_end(game, text.clone()).with_value(moves);
        Ok(ScoreResult::new(moves, text, vec![example]))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DecisiveGamePercentage;

impl Scorer for DecisiveGamePercentage {
    fn name(&self) -> &'static str {
        "decisive_game_percentage"
    }

    fn description(&self) -> &'static str {
        "share of games that did not end in a draw, in percent"
    }

    fn evaluate(&self, corpus: &Corpus) -> Result<ScoreResult, EvalError> {
        let total = corpus.len() as i64;
        if total == 0 {
            return Ok(ScoreResult::new(0, "empty corpus", Vec::new()));
        }

        let decisive: Vec<&GameRecord> = corpus
            .iter()
            .filter(|game| game.result().is_decisive())
            .collect();
        let count = decisive.len() as i64;
        let percentage = (count * 100 + total / 2) / total;

        let examples = decisive
            .first()
            .map(|game| Example::at_end(game, format!("{} {}", game.title(), game.result())))
            .into_iter()
            .collect();
        Ok(ScoreResult::new(
            percentage,
            format!("{count} of {total} games decisive"),
            examples,
        ))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BiggestPawnLead;

impl GameMeasure for BiggestPawnLead {
    fn name(&self) -> &'static str {
        "biggest_pawn_lead"
    }

    fn description(&self) -> &'static str {
        "largest difference in pawn count seen on any board"
    }

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError> {
        Ok(peak_balance(
            game,
            |board| {
                board.count(Color::White, Role::Pawn) as i64
                    - board.count(Color::Black, Role::Pawn) as i64
            },
            |lead| format!("{} is {} pawn(s) up", leader(lead), lead.abs()),
        ))
    }

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult {
        maximum_result(measurements, |lead| format!("biggest pawn lead {lead}"))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BiggestMaterialLead;

impl GameMeasure for BiggestMaterialLead {
    fn name(&self) -> &'static str {
        "biggest_material_lead"
    }

    fn description(&self) -> &'static str {
        "largest material lead seen on any board (P=1, N=B=3, R=5, Q=9)"
    }

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError> {
        Ok(peak_balance(
            game,
            BoardSnapshot::material_balance,
            |lead| format!("{} leads by {} point(s)", leader(lead), lead.abs()),
        ))
    }

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult {
        maximum_result(measurements, |lead| format!("biggest material lead {lead}"))
    }
}

/// Running +1 per White win, -1 per Black win, in corpus order. The score is
/// the largest distance from zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestCumulativeColorLead;

impl GameMeasure for LargestCumulativeColorLead {
    fn name(&self) -> &'static str {
        "largest_cumulative_color_lead"
    }

    fn description(&self) -> &'static str {
        "largest running lead in wins of one color over the other"
    }

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError> {
        let value = match game.result() {
            GameResult::WhiteWins => 1,
            GameResult::BlackWins => -1,
            GameResult::Draw | GameResult::Unresolved => 0,
        };
        let example = (value != 0)
            .then(|| Example::at_end(game, format!("{} {}", game.title(), game.result())));
        Ok(Measurement::new(game, value, example))
    }

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult {
        let mut running = 0i64;
        let mut best: Option<(i64, usize, Option<Example>)> = None;

        for measurement in measurements {
            running += measurement.value;
            if running.abs() > best.as_ref().map_or(0, |(lead, _, _)| lead.abs()) {
                let example = measurement.example.map(|example| example.with_value(running));
                best = Some((running, measurement.game_index, example));
            }
        }

        match best {
            Some((lead, game_index, example)) => ScoreResult::new(
                lead.abs(),
                format!("{} led by {} after game {game_index}", leader(lead), lead.abs()),
                example.into_iter().collect(),
            ),
            None => ScoreResult::new(0, "neither color ever led", Vec::new()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LongestCaptureStreak;

impl GameMeasure for LongestCaptureStreak {
    fn name(&self) -> &'static str {
        "longest_capture_streak"
    }

    fn description(&self) -> &'static str {
        "most consecutive plies that were all captures"
    }

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError> {
        let mut cursor = ReplayCursor::new(game);
        let (mut streak, mut best) = (0i64, 0i64);
        let mut example = None;

        while let Some(ply) = cursor.step_forward() {
            if !ply.is_capture() {
                streak = 0;
                continue;
            }
            streak += 1;
            if streak > best {
                best = streak;
                example = Some(Example::at(&cursor, format!("{best} captures in a row")));
            }
        }

        Ok(Measurement::new(game, best, example))
    }

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult {
        maximum_result(measurements, |streak| format!("longest capture streak {streak}"))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TotalChecks;

impl GameMeasure for TotalChecks {
    fn name(&self) -> &'static str {
        "total_checks"
    }

    fn description(&self) -> &'static str {
        "number of checking moves across all games"
    }

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError> {
        let mut cursor = ReplayCursor::new(game);
        let mut checks = 0i64;
        let mut example = None;

        while let Some(ply) = cursor.step_forward() {
            if ply.check {
                checks += 1;
                if example.is_none() {
                    example = Some(Example::at(&cursor, "first check of the game"));
                }
            }
        }

        Ok(Measurement::new(game, checks, example))
    }

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult {
        let games = measurements.len();
        let total: i64 = measurements.iter().map(|m| m.value).sum();
        let examples = first_maximum(measurements)
            .filter(|best| best.value > 0)
            .and_then(|best| best.example)
            .into_iter()
            .collect();
        ScoreResult::new(total, format!("{total} checks in {games} games"), examples)
    }
}

pub const DECISIVE_BONUS: i64 = 20;
pub const MATE_BONUS: i64 = 10;
pub const PROMOTION_BONUS: i64 = 2;
pub const CHECK_BONUS: i64 = 1;
pub const SHORT_DRAW_PENALTY: i64 = 15;
/// Draws shorter than this many whole moves are penalized.
pub const SHORT_DRAW_MOVES: usize = 30;

/// Weighted sum of fighting features per game. Short draws subtract, so the
/// corpus total can go negative.
#[derive(Clone, Copy, Debug, Default)]
pub struct FightingChessIndex;

impl FightingChessIndex {
    pub fn weigh(game: &GameRecord) -> i64 {
        let mut score = 0;
        if game.result().is_decisive() {
            score += DECISIVE_BONUS;
        }
        if game.termination() == Termination::Checkmate {
            score += MATE_BONUS;
        }
        if game.result() == GameResult::Draw && game.whole_moves() < SHORT_DRAW_MOVES {
            score -= SHORT_DRAW_PENALTY;
        }
        for ply in game.plies() {
            if ply.promotion().is_some() {
                score += PROMOTION_BONUS;
            }
            if ply.check {
                score += CHECK_BONUS;
            }
        }
        score
    }
}

impl GameMeasure for FightingChessIndex {
    fn name(&self) -> &'static str {
        "fighting_chess_index"
    }

    fn description(&self) -> &'static str {
        "decisive results, mates, promotions and checks minus short draws"
    }

    fn inner_evaluate(&self, game: &GameRecord) -> Result<Measurement, EvalError> {
        let score = Self::weigh(game);
        let example = Example::at_end(game, format!("{} scores {score}", game.title()));
        Ok(Measurement::new(game, score, Some(example)))
    }

    fn aggregate(&self, measurements: Vec<Measurement>) -> ScoreResult {
        let games = measurements.len();
        let total: i64 = measurements.iter().map(|m| m.value).sum();
        let examples = first_maximum(measurements)
            .and_then(|best| best.example)
            .into_iter()
            .collect();
        ScoreResult::new(total, format!("index {total} over {games} games"), examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::eval::Decomposed;
    use crate::chess::fixtures;

    const PAWN_GRAB: &str = "[Event \"t\"]\n\n1. e4 d5 2. exd5 Nf6 3. Nc3 a6 1-0\n";
    const QUEEN_RAID: &str =
        "[Event \"t\"]\n\n1. e4 d5 2. exd5 Qxd5 3. Nc3 Qxg2 4. Nf3 Qxh1 0-1\n";
    const EXCHANGES: &str =
        "[Event \"t\"]\n\n1. d4 e5 2. dxe5 d6 3. exd6 Bxd6 4. Qxd6 Qxd6 5. Nc3 Nf6 1/2-1/2\n";

    fn one_game(pgn: &str) -> Corpus {
        fixtures::corpus(pgn)
    }

    #[test]
    fn test_longest_game_picks_longer_game() {
        let mut corpus = Corpus::new("pair");
        corpus.games.push(fixtures::shuffle_game(0, 41, "1/2-1/2"));
        corpus.games.push(fixtures::shuffle_game(1, 61, "1/2-1/2"));

        let result = LongestGame.evaluate(&corpus).unwrap();
        assert_eq!(result.raw(), 31);
        assert_eq!(result.manifold(), 31);
        assert_eq!(result.examples().len(), 1);
        assert_eq!(result.examples()[0].game_index, 1);
        assert_eq!(result.examples()[0].ply, 61);
        assert_eq!(result.examples()[0].value, Some(31));
    }

    #[test]
    fn test_longest_game_ties_keep_corpus_order() {
        let mut corpus = Corpus::new("tie");
        corpus.games.push(fixtures::shuffle_game(0, 41, "1/2-1/2"));
        corpus.games.push(fixtures::shuffle_game(1, 42, "1/2-1/2"));

        let result = LongestGame.evaluate(&corpus).unwrap();
        assert_eq!(result.raw(), 21);
        assert_eq!(result.examples()[0].game_index, 0);
    }

    #[test]
    fn test_empty_corpus_scores_zero() {
        let corpus = Corpus::new("empty");
        assert_eq!(LongestGame.evaluate(&corpus).unwrap().raw(), 0);
        assert_eq!(DecisiveGamePercentage.evaluate(&corpus).unwrap().raw(), 0);
        assert_eq!(Decomposed(TotalChecks).evaluate(&corpus).unwrap().raw(), 0);
    }

    #[test]
    fn test_decisive_game_percentage_rounds() {
        let blob = format!(
            "{}\n{PAWN_GRAB}\n{EXCHANGES}",
            fixtures::FOOLS_MATE
        );
        let result = DecisiveGamePercentage.evaluate(&fixtures::corpus(&blob)).unwrap();

        assert_eq!(result.raw(), 67);
        assert_eq!(result.text(), "2 of 3 games decisive");
        assert_eq!(result.examples()[0].game_index, 0);
    }

    #[test]
    fn test_biggest_pawn_lead() {
        let result = Decomposed(BiggestPawnLead).evaluate(&one_game(PAWN_GRAB)).unwrap();

        assert_eq!(result.raw(), 1);
        assert_eq!(result.examples()[0].ply, 3);
        assert_eq!(result.examples()[0].text, "White is 1 pawn(s) up");
    }

    #[test]
    fn test_biggest_material_lead_follows_captures() {
        let result = Decomposed(BiggestMaterialLead)
            .evaluate(&one_game(QUEEN_RAID))
            .unwrap();

        assert_eq!(result.raw(), 6);
        assert_eq!(result.examples()[0].ply, 8);
        assert_eq!(result.examples()[0].text, "Black leads by 6 point(s)");
    }

    #[test]
    fn test_cumulative_color_lead_tracks_running_sum() {
        let white = "[Event \"w\"]\n\n1. e4 e5 1-0\n";
        let black = "[Event \"b\"]\n\n1. e4 e5 0-1\n";
        let draw = "[Event \"d\"]\n\n1. e4 e5 1/2-1/2\n";
        // running: 1 2 1 2 2 3 2 1 0 -1
        let blob = [white, white, black, white, draw, white, black, black, black, black].concat();
        let result = Decomposed(LargestCumulativeColorLead)
            .evaluate(&fixtures::corpus(&blob))
            .unwrap();

        assert_eq!(result.raw(), 3);
        assert_eq!(result.text(), "White led by 3 after game 5");
        assert_eq!(result.examples()[0].game_index, 5);
        assert_eq!(result.examples()[0].value, Some(3));
    }

    #[test]
    fn test_cumulative_color_lead_counts_black_leads() {
        let black = "[Event \"b\"]\n\n1. e4 e5 0-1\n";
        let blob = [black, black].concat();
        let result = Decomposed(LargestCumulativeColorLead)
            .evaluate(&fixtures::corpus(&blob))
            .unwrap();

        assert_eq!(result.raw(), 2);
        assert!(result.text().starts_with("Black led by 2"));
    }

    #[test]
    fn test_longest_capture_streak() {
        let result = Decomposed(LongestCaptureStreak)
            .evaluate(&one_game(EXCHANGES))
            .unwrap();

        assert_eq!(result.raw(), 4);
        assert_eq!(result.examples()[0].ply, 8);
    }

    #[test]
    fn test_total_checks_sums_games() {
        let blob = format!(
            "{}\n{}",
            fixtures::FOOLS_MATE,
            "[Event \"t\"]\n\n1. e4 f5 2. Qh5+ g6 3. Qxg6+ hxg6 0-1\n"
        );
        let result = Decomposed(TotalChecks).evaluate(&fixtures::corpus(&blob)).unwrap();

        assert_eq!(result.raw(), 3);
        assert_eq!(result.text(), "3 checks in 2 games");
        assert_eq!(result.examples()[0].game_index, 1);
        assert_eq!(result.examples()[0].ply, 3);
    }

    #[test]
    fn test_fighting_index_can_go_negative() {
        let draw = "[Event \"d\"]\n\n1. e4 e5 1/2-1/2\n";
        let result = Decomposed(FightingChessIndex).evaluate(&one_game(draw)).unwrap();

        assert_eq!(result.raw(), -SHORT_DRAW_PENALTY);
        assert_eq!(result.manifold(), 0);
    }

    #[test]
    fn test_fighting_index_weights() {
        let fools = fixtures::game(fixtures::FOOLS_MATE);
        assert_eq!(
            FightingChessIndex::weigh(&fools),
            DECISIVE_BONUS + MATE_BONUS + CHECK_BONUS
        );

        let promotions = fixtures::two_promotions_game();
        assert_eq!(
            FightingChessIndex::weigh(&promotions),
            DECISIVE_BONUS + 2 * PROMOTION_BONUS
        );
    }

    fn assert_decomposition_consistent<M: GameMeasure + Copy>(measure: M, pgn: &str) {
        let corpus = one_game(pgn);
        let game = &corpus.games[0];
        let direct = measure.aggregate(vec![measure.inner_evaluate(game).unwrap()]);
        let through_scorer = Decomposed(measure).evaluate(&corpus).unwrap();
        assert_eq!(direct, through_scorer, "{}", measure.name());
    }

    #[test]
    fn test_decomposition_consistency() {
        for pgn in [PAWN_GRAB, QUEEN_RAID, EXCHANGES, fixtures::FOOLS_MATE] {
            assert_decomposition_consistent(BiggestPawnLead, pgn);
            assert_decomposition_consistent(BiggestMaterialLead, pgn);
            assert_decomposition_consistent(LargestCumulativeColorLead, pgn);
            assert_decomposition_consistent(LongestCaptureStreak, pgn);
            assert_decomposition_consistent(TotalChecks, pgn);
            assert_decomposition_consistent(FightingChessIndex, pgn);
        }
    }
}
