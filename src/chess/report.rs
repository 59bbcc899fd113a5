use super::batch::{ReportRow, RowOutcome};
use super::eval::Example;
use super::types::{Corpus, GameRecord};
use serde_json::{Value, json};
use std::fmt::Write;

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_example(out: &mut String, number: usize, example: &Example) {
    let _ = write!(
        out,
        "  [{number}] game {} ({}), {}",
        example.game_index, example.title, example.label
    );
    if let Some(san) = &example.san {
        let _ = write!(out, ": {san}");
    }
    if let Some(value) = example.value {
        let _ = write!(out, " = {value}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "      {}", example.text);
    let _ = writeln!(out, "{}", indent(&example.board.render(), "      "));
}

pub fn render_row(row: &ReportRow) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ({}) ==", row.name, row.kind.as_str());
    let _ = writeln!(out, "   {}", row.description);

    match &row.outcome {
        RowOutcome::Completed {
            score,
            raw,
            detail,
            examples,
            collected,
        } => {
            let _ = writeln!(out, "score: {score}%   raw: {raw}");
            let _ = writeln!(out, "detail: {detail}");
            for (number, example) in examples.iter().enumerate() {
                render_example(&mut out, number + 1, example);
            }
            if *collected > examples.len() {
                let _ = writeln!(out, "  ... {} more not shown", collected - examples.len());
            }
        }
        RowOutcome::Failed { diagnostic } => {
            let _ = writeln!(out, "FAILED: {diagnostic}");
        }
    }
    out
}

pub fn render_text(corpus: &Corpus, rows: &[ReportRow]) -> String {
    let mut out = corpus.load_summary();
    out.push_str("\n\n");
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

fn game_json(game: &GameRecord) -> Value {
    let headers = game.headers();
    json!({
        "index": game.index(),
        "event": headers.event,
        "site": headers.site,
        "round": headers.round,
        "date": headers.date.map(|date| date.to_string()),
        "white": headers.white,
        "black": headers.black,
        "white_elo": headers.white_elo,
        "black_elo": headers.black_elo,
        "eco": headers.eco,
        "termination_tag": headers.termination,
        "result": game.result().to_string(),
        "termination": game.termination().as_str(),
        "natural_end": game.termination().is_natural(),
        "plies": game.len(),
        "diagnostics": game.diagnostics(),
    })
}

fn example_json(example: &Example, corpus: &Corpus) -> Value {
    let game = corpus
        .iter()
        .find(|game| game.index() == example.game_index)
        .map_or(Value::Null, game_json);
    json!({
        "game_index": example.game_index,
        "title": example.title,
        "ply": example.ply,
        "label": example.label,
        "san": example.san,
        "text": example.text,
        "value": example.value,
        "board": example.board.render(),
        "game": game,
    })
}

pub fn row_json(row: &ReportRow, corpus: &Corpus) -> Value {
    let mut value = json!({
        "name": row.name,
        "kind": row.kind.as_str(),
        "description": row.description,
    });

    let fields = match &row.outcome {
        RowOutcome::Completed {
            score,
            raw,
            detail,
            examples,
            collected,
        } => json!({
            "status": "completed",
            "score": score,
            "raw": raw,
            "detail": detail,
            "collected": collected,
            "examples": examples
                .iter()
                .map(|example| example_json(example, corpus))
                .collect::<Vec<_>>(),
        }),
        RowOutcome::Failed { diagnostic } => json!({
            "status": "failed",
            "diagnostic": diagnostic,
        }),
    };
    if let (Some(target), Value::Object(extra)) = (value.as_object_mut(), fields) {
        target.extend(extra);
    }
    value
}

pub fn to_json(corpus: &Corpus, rows: &[ReportRow]) -> Value {
    json!({
        "corpus": corpus.name,
        "games": corpus.len(),
        "skipped": corpus
            .skipped
            .iter()
            .map(|skipped| json!({ "index": skipped.index, "reason": skipped.reason.to_string() }))
            .collect::<Vec<_>>(),
        "rows": rows.iter().map(|row| row_json(row, corpus)).collect::<Vec<_>>(),
    })
}

pub fn render_json(corpus: &Corpus, rows: &[ReportRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_json(corpus, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::batch::run_batch;
    use crate::chess::catalog::Catalog;
    use crate::chess::config::RunConfig;
    use crate::chess::eval::EvaluatorKind;
    use crate::chess::fixtures;

    fn rows_for(names: &[&str], corpus: &Corpus) -> Vec<ReportRow> {
        let catalog = Catalog::standard().unwrap();
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        run_batch(catalog.select(&names).unwrap(), corpus, &RunConfig::default())
    }

    #[test]
    fn test_text_report_shows_example_with_board() {
        let corpus = fixtures::corpus(fixtures::FOOLS_MATE);
        let rows = rows_for(&["quick_checkmate"], &corpus);
        let text = render_text(&corpus, &rows);

        assert!(text.contains("corpus 'fixture': 1 games loaded, 0 skipped"));
        assert!(text.contains("== quick_checkmate (detector) =="));
        assert!(text.contains("score: 100%   raw: 1"));
        assert!(text.contains("[1] game 0 (Fool - Mate), move 2, Black: Qh4#"));
        assert!(text.contains("      Black mates in 2 moves"));
        assert!(text.contains("      4 . . . . . . P q"));
        assert!(text.contains("        a b c d e f g h"));
    }

    #[test]
    fn test_failed_row_renders_diagnostic() {
        let row = ReportRow {
            name: "broken",
            description: "always fails",
            kind: EvaluatorKind::Detector,
            outcome: RowOutcome::Failed {
                diagnostic: "bad knight".to_string(),
            },
        };

        let corpus = Corpus::new("empty");
        assert!(render_row(&row).contains("FAILED: bad knight"));
        assert_eq!(row_json(&row, &corpus)["status"], "failed");
        assert_eq!(row_json(&row, &corpus)["diagnostic"], "bad knight");
    }

    #[test]
    fn test_hidden_examples_are_counted() {
        let mut corpus = Corpus::new("bishops");
        let game = fixtures::game(
            "[Event \"t\"]\n\n1. h4 a5 2. Rh3 Ra6 3. g3 b6 4. Bg2 Bb7 5. Bh1 Ba8 \
             6. Bg2 Bb7 7. Bh1 Bxh1 1/2-1/2\n",
        );
        corpus.games.push(game);

        let rows = rows_for(&["bishop_in_corner"], &corpus);
        let text = render_row(&rows[0]);
        assert!(text.contains("score: 100%   raw: 4"));
        assert!(text.contains("... 1 more not shown"));
    }

    #[test]
    fn test_json_report() {
        let corpus = fixtures::corpus(fixtures::FOOLS_MATE);
        let rows = rows_for(&["quick_checkmate", "longest_game"], &corpus);
        let value = to_json(&corpus, &rows);

        assert_eq!(value["games"], 1);
        assert_eq!(value["rows"][0]["name"], "quick_checkmate");
        assert_eq!(value["rows"][0]["score"], 100);
        assert_eq!(value["rows"][0]["examples"][0]["ply"], 4);
        assert_eq!(value["rows"][0]["examples"][0]["san"], "Qh4#");
        assert_eq!(value["rows"][1]["kind"], "scorer");
        assert_eq!(value["rows"][1]["raw"], 2);

        let game = &value["rows"][0]["examples"][0]["game"];
        assert_eq!(game["white"], "Fool");
        assert_eq!(game["result"], "0-1");
        assert_eq!(game["termination"], "checkmate");
        assert_eq!(game["natural_end"], true);

        let rendered = render_json(&corpus, &rows).unwrap();
        assert!(rendered.contains("\"status\": \"completed\""));
    }

    #[test]
    fn test_json_example_carries_game_headers() {
        let corpus = fixtures::corpus(
            r#"[Event "Club Open"]
[Site "Leiden"]
[Round "3"]
[Date "2021.05.??"]
[White "Anna"]
[Black "Ben"]
[WhiteElo "1850"]
[BlackElo "1720"]
[ECO "C50"]
[Termination "resignation"]

1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O Nf6 5. d3 O-O 6. a3 h6 7. b4 Bb6
8. Bb2 d6 9. Nc3 a6 10. Ne2 Qe7 11. Ng3 Qe8 12. Nh4 Qe7 13. Qd2 Qe8
14. f4 Qe7 1-0
"#,
        );
        let rows = rows_for(&["longest_game"], &corpus);
        let game = &to_json(&corpus, &rows)["rows"][0]["examples"][0]["game"];

        assert_eq!(game["event"], "Club Open");
        assert_eq!(game["site"], "Leiden");
        assert_eq!(game["round"], "3");
        assert_eq!(game["date"], "2021-05-01");
        assert_eq!(game["white_elo"], 1850);
        assert_eq!(game["black_elo"], 1720);
        assert_eq!(game["eco"], "C50");
        assert_eq!(game["termination_tag"], "resignation");
        assert_eq!(game["termination"], "resignation");
        assert_eq!(game["natural_end"], false);
        assert_eq!(game["plies"], 28);
    }
}
