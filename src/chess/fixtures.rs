use super::archive::RawRecord;
use super::normalize::{ingest_archive, normalize_record};
use super::types::{Corpus, GameRecord, Ply};
use shakmaty::{CastlingMode, Chess, fen::Fen};

pub const FOOLS_MATE: &str = r#"[Event "Fool's mate"]
[White "Fool"]
[Black "Mate"]
[Result "0-1"]

1. f3 e5 2. g4 Qh4# 0-1
"#;

/// Only one castle in the whole game, short, by White.
pub const ITALIAN_CASTLE: &str = r#"[Event "Italian"]
[White "Giuoco"]
[Black "Piano"]

1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O Nf6 1/2-1/2
"#;

const KNIGHT_SHUFFLE: [&str; 4] = ["Nf3", "Nf6", "Ng1", "Ng8"];

pub fn game(pgn: &str) -> GameRecord {
    game_at(pgn, 0)
}

pub fn game_at(pgn: &str, index: usize) -> GameRecord {
    normalize_record(&RawRecord { index, text: pgn }, index)
        .unwrap_or_else(|err| panic!("fixture does not normalize: {err}\n{pgn}"))
}

pub fn corpus(blob: &str) -> Corpus {
    let corpus = ingest_archive("fixture", blob, 0);
    assert!(corpus.skipped.is_empty(), "{}", corpus.load_summary());
    corpus
}

pub fn position(fen: &str) -> Chess {
    let fen: Fen = fen.parse().unwrap();
    fen.into_position(CastlingMode::Standard).unwrap()
}

/// Knights hopping out and back from the standard start, `plies` long.
pub fn shuffle_game(index: usize, plies: usize, result: &str) -> GameRecord {
    let moves: Vec<&str> = KNIGHT_SHUFFLE.iter().copied().cycle().take(plies).collect();
    let pgn = format!(
        "[Event \"Shuffle {index}\"]\n[White \"Knight {index}\"]\n[Black \"Knight {index}\"]\n\n{} {result}\n",
        moves.join(" ")
    );
    game_at(&pgn, index)
}

/// Black to move; White promotes on plies 10 (a8=Q) and 40 (h8=Q), while
/// both kings shuffle without ever giving check.
pub fn two_promotions_game() -> GameRecord {
    let mut moves: Vec<&str> = vec![
        "Kd6", "Ke2", "Kd5", "Ke1", "Kd6", "Ke2", "Kd5", "Ke1", "Kd6", "a8=Q",
    ];
    for ply in 11..40 {
        let black = ply % 2 == 1;
        let step = if black { (ply - 11) / 2 } else { (ply - 12) / 2 };
        moves.push(match (black, step % 2 == 0) {
            (true, true) => "Ke6",
            (true, false) => "Kd6",
            (false, true) => "Ke2",
            (false, false) => "Ke1",
        });
    }
    moves.push("h8=Q");

    game(&format!(
        "[Event \"Promotions\"]\n[SetUp \"1\"]\n[FEN \"8/P6P/8/3k4/8/8/8/4K3 b - - 0 1\"]\n\n{} 1-0\n",
        moves.join(" ")
    ))
}

/// Copy of `game` with its ply list edited.
pub fn with_plies(game: &GameRecord, edit: impl FnOnce(&mut Vec<Ply>)) -> GameRecord {
    let mut plies = game.plies().to_vec();
    edit(&mut plies);
    GameRecord::new(
        game.index(),
        game.headers().clone(),
        game.start().clone(),
        plies,
        game.result(),
        game.termination(),
        None,
    )
}
