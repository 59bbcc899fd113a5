use super::archive::{RawRecord, split_records};
use super::error::IngestError;
use super::log;
use super::rules::{Declaration, MoveOutcome, RulesEngine, ShakmatyRules};
use super::types::{Corpus, GameRecord, GameResult, Ply, SkippedRecord};
use super::visitor::parse_record;

use shakmaty::{CastlingMode, Chess, Color, fen::Fen, san::SanPlus};

/// Loads every record of `blob`. Record indices start at `first_index`.
pub fn ingest_archive(name: &str, blob: &str, first_index: usize) -> Corpus {
    let mut corpus = Corpus::new(name);

    for raw in split_records(blob) {
        let index = first_index + raw.index;
        match normalize_record(&raw, index) {
            Ok(game) => {
                if game.unread_games() > 0 {
                    let reason = IngestError::UnreadGames(game.unread_games());
                    log::warn(format!("{name}: record {index}: {reason}"));
                    corpus.skipped.push(SkippedRecord { index, reason });
                }
                corpus.games.push(game);
            }
            Err(reason) => {
                log::warn(format!("{name}: skipping record {index}: {reason}"));
                corpus.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    log::info(corpus.load_summary());
    corpus
}

pub fn normalize_record(raw: &RawRecord<'_>, index: usize) -> Result<GameRecord, IngestError> {
    normalize_record_with(raw, index, ShakmatyRules::new)
}

/// Same as [`normalize_record`] with a caller-supplied rules engine, built
/// from the record's starting position.
pub fn normalize_record_with<R, F>(
    raw: &RawRecord<'_>,
    index: usize,
    make_engine: F,
) -> Result<GameRecord, IngestError>
where
    R: RulesEngine,
    F: FnOnce(Chess) -> R,
{
    raw.validate()?;
    let mut parsed = parse_record(raw.text)?;
    let start = start_position(parsed.headers.fen.as_deref())?;
    let mut engine = make_engine(start.clone());

    let mut plies: Vec<Ply> = Vec::with_capacity(parsed.sans.len());
    for (token_idx, san) in parsed.sans.iter().enumerate() {
        match apply_with_retry(&mut engine, san, plies.len() + 1, index)? {
            Some(ply) => plies.push(ply),
            None => {
                log::debug(format!(
                    "record {index}: game ended at ply {}, ignoring {} trailing token(s)",
                    plies.len(),
                    parsed.sans.len() - token_idx
                ));
                break;
            }
        }
    }

    let token_result = parsed
        .result_token
        .as_deref()
        .and_then(GameResult::from_token);

    let conclusion = match engine.conclusion() {
        Some(conclusion) => {
            if let Some(token) = token_result
                && token != GameResult::Unresolved
                && token != conclusion.result
            {
                parsed.diagnostics.push(&format!(
                    "result token {token} disagrees with board result {}",
                    conclusion.result
                ));
            }
            conclusion
        }
        None => {
            let declaration = match token_result {
                Some(GameResult::WhiteWins) => Declaration::Resignation(Color::Black),
                Some(GameResult::BlackWins) => Declaration::Resignation(Color::White),
                Some(GameResult::Draw) => Declaration::Draw,
                Some(GameResult::Unresolved) | None => {
                    return Err(IngestError::UnresolvedResult(parsed.result_token));
                }
            };
            engine.declare_end(declaration)
        }
    };

    Ok(GameRecord::new(
        index,
        parsed.headers,
        start,
        plies,
        conclusion.result,
        conclusion.termination,
        parsed.diagnostics.take(),
    )
    .with_unread_games(parsed.unread_games))
}

/// `Ok(None)` when the engine reports the game as already over.
fn apply_with_retry<R: RulesEngine>(
    engine: &mut R,
    san: &SanPlus,
    ply: usize,
    index: usize,
) -> Result<Option<Ply>, IngestError> {
    let mut outcome = engine.apply_san(san);
    if let MoveOutcome::Rejected(reason) = &outcome {
        log::warn(format!(
            "record {index}: token '{san}' at ply {ply} rejected ({reason}), retrying once"
        ));
        outcome = engine.apply_san(san);
    }

    match outcome {
        MoveOutcome::Applied(ply) => Ok(Some(ply)),
        MoveOutcome::GameAlreadyEnded => Ok(None),
        MoveOutcome::Rejected(reason) => Err(IngestError::IllegalMove {
            ply,
            token: san.to_string(),
            reason,
        }),
    }
}

fn start_position(fen: Option<&str>) -> Result<Chess, IngestError> {
    let Some(fen) = fen else {
        return Ok(Chess::default());
    };

    let invalid = |reason: String| IngestError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::fixtures;
    use crate::chess::rules::Conclusion;
    use crate::chess::types::Termination;
    use shakmaty::{Piece, Square};

    fn single(text: &str) -> Result<GameRecord, IngestError> {
        normalize_record(&RawRecord { index: 0, text }, 0)
    }

    /// Rejects the first `failures` attempts at `token`, then behaves.
    struct FlakyRules {
        inner: ShakmatyRules,
        token: &'static str,
        failures: usize,
    }

    impl RulesEngine for FlakyRules {
        fn apply_san(&mut self, san: &SanPlus) -> MoveOutcome {
            if self.failures > 0 && san.to_string() == self.token {
                self.failures -= 1;
                return MoveOutcome::Rejected("transient".to_string());
            }
            self.inner.apply_san(san)
        }

        fn declare_end(&mut self, declaration: Declaration) -> Conclusion {
            self.inner.declare_end(declaration)
        }

        fn conclusion(&self) -> Option<Conclusion> {
            self.inner.conclusion()
        }

        fn occupant(&self, square: Square) -> Option<Piece> {
            self.inner.occupant(square)
        }
    }

    const ITALIAN: &str = "[Event \"Italian\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 1-0\n";

    #[test]
    fn test_tokens_beyond_mate_are_ignored() {
        let game = single(
            "[Event \"Overflow\"]\n\n1. f3 e5 2. g4 Qh4# 3. a3 a6 4. a4 0-1\n",
        )
        .unwrap();

        assert_eq!(game.len(), 4);
        assert_eq!(game.result(), GameResult::BlackWins);
        assert_eq!(game.termination(), Termination::Checkmate);
        assert!(game.plies()[3].mate);
        assert_eq!(game.diagnostics(), None);
    }

    #[test]
    fn test_decisive_token_becomes_resignation() {
        let game = single(ITALIAN).unwrap();

        assert_eq!(game.len(), 6);
        assert_eq!(game.result(), GameResult::WhiteWins);
        assert_eq!(game.termination(), Termination::Resignation);
        assert_eq!(game.whole_moves(), 3);
    }

    #[test]
    fn test_draw_token_becomes_declared_draw() {
        let game = single("[Event \"Draw\"]\n\n1. d4 d5 1/2-1/2\n").unwrap();

        assert_eq!(game.result(), GameResult::Draw);
        assert_eq!(game.termination(), Termination::DrawDeclared);
    }

    #[test]
    fn test_unknown_result_is_fatal_for_the_record() {
        let err = single("[Event \"Open\"]\n\n1. e4 e5 *\n").unwrap_err();
        assert!(matches!(err, IngestError::UnresolvedResult(_)));
    }

    #[test]
    fn test_unmappable_result_tag_is_fatal_for_the_record() {
        let err = single("[Event \"Odd\"]\n[Result \"abandoned\"]\n\n1. e4 e5\n").unwrap_err();
        assert_eq!(
            err,
            IngestError::UnresolvedResult(Some("abandoned".to_string()))
        );
    }

    #[test]
    fn test_board_result_wins_over_token() {
        let game = single("[Event \"Mismatch\"]\n\n1. f3 e5 2. g4 Qh4# 1-0\n").unwrap();

        assert_eq!(game.result(), GameResult::BlackWins);
        assert!(game.diagnostics().unwrap().contains("disagrees"));
    }

    #[test]
    fn test_illegal_token_aborts_record_after_one_retry() {
        let err = single("[Event \"Bad\"]\n\n1. e4 e5 2. Ke3 Nc6 1-0\n").unwrap_err();

        match err {
            IngestError::IllegalMove { ply, token, .. } => {
                assert_eq!(ply, 3);
                assert_eq!(token, "Ke3");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_transient_rejection_recovers_on_retry() {
        let raw = RawRecord {
            index: 0,
            text: ITALIAN,
        };
        let game = normalize_record_with(&raw, 0, |start| FlakyRules {
            inner: ShakmatyRules::new(start),
            token: "Nf3",
            failures: 1,
        })
        .unwrap();

        assert_eq!(game.len(), 6);
        assert_eq!(game.plies()[2].san, "Nf3");
    }

    #[test]
    fn test_persistent_rejection_aborts_record() {
        let raw = RawRecord {
            index: 0,
            text: ITALIAN,
        };
        let err = normalize_record_with(&raw, 0, |start| FlakyRules {
            inner: ShakmatyRules::new(start),
            token: "Nf3",
            failures: 2,
        })
        .unwrap_err();

        assert!(matches!(err, IngestError::IllegalMove { ply: 3, .. }));
    }

    #[test]
    fn test_fen_start_position() {
        let game = single(
            "[Event \"Setup\"]\n[SetUp \"1\"]\n[FEN \"8/P6k/8/8/8/8/8/K7 w - - 0 1\"]\n\n1. a8=Q 1-0\n",
        )
        .unwrap();

        assert_eq!(game.len(), 1);
        assert_eq!(game.headers().fen.as_deref(), Some("8/P6k/8/8/8/8/8/K7 w - - 0 1"));
        assert!(game.plies()[0].promotion().is_some());
    }

    #[test]
    fn test_invalid_fen_is_fatal_for_the_record() {
        let err = single("[Event \"Setup\"]\n[FEN \"not a fen\"]\n\n1. e4 1-0\n").unwrap_err();
        assert!(matches!(err, IngestError::InvalidFen { .. }));
    }

    #[test]
    fn test_archive_skips_bad_records_and_keeps_order() {
        let blob = format!(
            "{ITALIAN}\n[Event \"Bad\"]\n\n1. e4 e5 2. Ke3 1-0\n\n[Event \"Headers only\"]\n\n\n{}",
            fixtures::FOOLS_MATE
        );
        let corpus = ingest_archive("mixed", &blob, 10);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.games[0].index(), 10);
        assert_eq!(corpus.games[1].index(), 13);
        assert_eq!(corpus.skipped.len(), 2);
        assert_eq!(corpus.skipped[0].index, 11);
        assert!(matches!(corpus.skipped[0].reason, IngestError::IllegalMove { .. }));
        assert_eq!(corpus.skipped[1].reason, IngestError::MissingMovetext);

        let summary = corpus.load_summary();
        assert!(summary.contains("2 games loaded, 2 skipped"));
        assert!(summary.contains("record 12: record has no movetext block"));
    }

    #[test]
    fn test_game_without_event_boundary_is_reported() {
        let corpus = ingest_archive(
            "merged",
            "[Event \"a\"]\n\n1. e4 1-0\n\n[Site \"s\"]\n\n1. d4 0-1\n",
            0,
        );

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.games[0].len(), 1);
        assert_eq!(corpus.games[0].unread_games(), 1);
        assert_eq!(corpus.skipped.len(), 1);
        assert_eq!(corpus.skipped[0].index, 0);
        assert_eq!(corpus.skipped[0].reason, IngestError::UnreadGames(1));
        assert!(corpus.load_summary().contains("1 games loaded, 1 skipped"));
    }
}
