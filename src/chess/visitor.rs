use super::error::{ErrorAccumulator, IngestError};
use super::types::Headers;

use chrono::{Datelike, NaiveDate};
use pgn_reader::{Outcome, RawTag, Reader, SanPlus, Skip, Visitor};
use smallvec::SmallVec;
use std::mem;
use std::ops::ControlFlow;

pub type MoveList = SmallVec<[SanPlus; 128]>;

/// Tags, mainline SAN tokens and trailing result of one raw record.
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub headers: Headers,
    pub sans: MoveList,
    /// Result token as it appeared after the movetext, else the `Result` tag.
    pub result_token: Option<String>,
    pub diagnostics: ErrorAccumulator,
    /// Games found after the first one in the same record.
    pub unread_games: usize,
}

/// Streaming PGN visitor (pgn-reader).
///
/// Keeps the mainline only: comments, NAGs and variations are dropped and
/// move-number labels never reach the SAN list.
pub struct RecordVisitor {
    headers: HeaderFields,
    result_marker: Option<String>,
    parse_error: ErrorAccumulator,
    pub current: Option<ParsedRecord>,
}

#[derive(Default)]
struct HeaderFields {
    event: String,
    site: String,
    round: String,
    white: String,
    black: String,
    result: String,
    white_elo: String,
    black_elo: String,
    utc_date: String,
    date: String,
    event_date: String,
    eco: String,
    termination: String,
    setup: String,
    fen: String,
}

impl HeaderFields {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn opt_take(field: &mut String) -> Option<String> {
        if field.is_empty() {
            None
        } else {
            Some(mem::take(field))
        }
    }

    fn opt_ref(field: &str) -> Option<&str> {
        (!field.is_empty()).then_some(field)
    }

    fn set_known_tag(&mut self, key: &[u8], value: RawTag<'_>) {
        let slot: &mut String = match key {
            b"Event" => &mut self.event,
            b"Site" => &mut self.site,
            b"Round" => &mut self.round,
            b"White" => &mut self.white,
            b"Black" => &mut self.black,
            b"Result" => &mut self.result,
            b"WhiteElo" => &mut self.white_elo,
            b"BlackElo" => &mut self.black_elo,
            b"UTCDate" => &mut self.utc_date,
            b"Date" => &mut self.date,
            b"EventDate" => &mut self.event_date,
            b"ECO" => &mut self.eco,
            b"Termination" => &mut self.termination,
            b"SetUp" => &mut self.setup,
            b"FEN" => &mut self.fen,
            _ => return,
        };

        if !slot.is_empty() {
            return;
        }

        let bytes = value.as_bytes();
        if bytes.is_empty() {
            return;
        }

        *slot = String::from_utf8_lossy(bytes).trim().to_string();
    }
}

impl Default for RecordVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordVisitor {
    pub fn new() -> Self {
        Self {
            headers: HeaderFields::default(),
            result_marker: None,
            parse_error: ErrorAccumulator::default(),
            current: None,
        }
    }

    fn normalize_date_separators(s: &str) -> String {
        let s = s.trim();
        if s.contains('.') {
            s.replace('.', "-")
        } else {
            s.to_string()
        }
    }

    fn date_completeness_score(raw: &str) -> u8 {
        let norm = Self::normalize_date_separators(raw);
        let parts: Vec<&str> = norm.split('-').collect();
        if parts.len() != 3 {
            return 0;
        }

        let known = |part: &str| !part.contains('?') && part.parse::<u32>().is_ok();
        if !known(parts[0]) {
            return 0;
        }

        1 + u8::from(known(parts[1])) + u8::from(known(parts[2]))
    }

    fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
        let first_day_next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
        };

        first_day_next_month.pred_opt().map(|d| d.day())
    }

    /// Most complete of `UTCDate`, `Date`, `EventDate`; ties go to that order.
    fn parse_best_date(
        candidates: [(Option<&str>, &'static str); 3],
        parse_error: &mut ErrorAccumulator,
    ) -> Option<NaiveDate> {
        let mut ranked: Vec<(u8, usize, &str, &'static str)> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(precedence, (raw, label))| {
                let raw = raw?.trim();
                (!raw.is_empty()).then(|| {
                    (Self::date_completeness_score(raw), precedence, raw, label)
                })
            })
            .collect();

        ranked.sort_by(|left, right| right.0.cmp(&left.0).then_with(|| left.1.cmp(&right.1)));

        ranked
            .into_iter()
            .find_map(|(_, _, raw, label)| Self::parse_date_field(raw, label, parse_error))
    }

    fn parse_date_field(
        raw: &str,
        label: &str,
        parse_error: &mut ErrorAccumulator,
    ) -> Option<NaiveDate> {
        let norm = Self::normalize_date_separators(raw);
        let parts: Vec<&str> = norm.split('-').collect();
        if parts.len() != 3 {
            parse_error.push(&format!("Conversion error: {label}='{raw}'"));
            return None;
        }

        // Unknown year => unknown date without a conversion error.
        if parts[0].contains('?') {
            return None;
        }

        let or_first = |part: &str| {
            if part.contains('?') {
                "01".to_string()
            } else {
                part.to_string()
            }
        };
        let (year, month, day) = match (
            parts[0].parse::<i32>(),
            or_first(parts[1]).parse::<u32>(),
            or_first(parts[2]).parse::<u32>(),
        ) {
            (Ok(y), Ok(m), Ok(d)) => (y, m, d),
            _ => {
                parse_error.push(&format!("Conversion error: {label}='{raw}'"));
                return None;
            }
        };

        let Some(last_day) = Self::last_day_of_month(year, month) else {
            parse_error.push(&format!(
                "Conversion error: {label}='{raw}' (chrono: input is out of range)"
            ));
            return None;
        };

        let date = NaiveDate::from_ymd_opt(year, month, day.min(last_day));
        if date.is_none() {
            parse_error.push(&format!(
                "Conversion error: {label}='{raw}' (chrono: input is out of range)"
            ));
        }
        date
    }

    fn parse_uinteger_field(
        raw: &str,
        label: &str,
        parse_error: &mut ErrorAccumulator,
    ) -> Option<u32> {
        let s = raw.trim();
        if s.is_empty() || s == "?" || s == "-" {
            return None;
        }
        match s.parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                parse_error.push(&format!("Conversion error: {label}='{s}'"));
                None
            }
        }
    }

    fn build_record(&mut self, sans: MoveList) {
        let white_elo =
            Self::parse_uinteger_field(&self.headers.white_elo, "WhiteElo", &mut self.parse_error);
        let black_elo =
            Self::parse_uinteger_field(&self.headers.black_elo, "BlackElo", &mut self.parse_error);
        let date = Self::parse_best_date(
            [
                (HeaderFields::opt_ref(&self.headers.utc_date), "UTCDate"),
                (HeaderFields::opt_ref(&self.headers.date), "Date"),
                (HeaderFields::opt_ref(&self.headers.event_date), "EventDate"),
            ],
            &mut self.parse_error,
        );

        // A FEN tag without SetUp is still honoured; SetUp "0" disables it.
        let fen = if self.headers.setup == "0" {
            None
        } else {
            HeaderFields::opt_take(&mut self.headers.fen)
        };

        let result_tag = HeaderFields::opt_take(&mut self.headers.result);
        let result_token = self.result_marker.take().or_else(|| result_tag.clone());

        self.current = Some(ParsedRecord {
            headers: Headers {
                event: HeaderFields::opt_take(&mut self.headers.event),
                site: HeaderFields::opt_take(&mut self.headers.site),
                round: HeaderFields::opt_take(&mut self.headers.round),
                white: HeaderFields::opt_take(&mut self.headers.white),
                black: HeaderFields::opt_take(&mut self.headers.black),
                white_elo,
                black_elo,
                date,
                eco: HeaderFields::opt_take(&mut self.headers.eco),
                termination: HeaderFields::opt_take(&mut self.headers.termination),
                result_tag,
                fen,
            },
            sans,
            result_token,
            diagnostics: mem::take(&mut self.parse_error),
            unread_games: 0,
        });
    }
}

impl Visitor for RecordVisitor {
    type Tags = ();
    type Movetext = MoveList;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.headers.clear();
        self.result_marker = None;
        self.parse_error = ErrorAccumulator::default();
        self.current = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        self.headers.set_known_tag(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(MoveList::new())
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        movetext.push(san);
        ControlFlow::Continue(())
    }

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.result_marker = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        self.build_record(movetext);
    }
}

/// Runs the visitor over one raw record. Any game after the first is
/// counted in `unread_games`, not parsed into the record.
pub fn parse_record(text: &str) -> Result<ParsedRecord, IngestError> {
    let mut reader = Reader::new(text.as_bytes());
    let mut visitor = RecordVisitor::new();

    let mut record = match reader.read_game(&mut visitor) {
        Ok(Some(())) => visitor.current.take().ok_or(IngestError::MissingMovetext)?,
        Ok(None) => return Err(IngestError::MissingMovetext),
        Err(err) => return Err(IngestError::Parser(err.to_string())),
    };

    while let Ok(Some(())) = reader.read_game(&mut visitor) {
        record.unread_games += 1;
    }
    Ok(record)
}
