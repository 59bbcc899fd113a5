use super::error::IngestError;
use regex::Regex;
use std::sync::LazyLock;

/// Every record starts with an `Event` tag at the beginning of a line.
static RECORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[Event[ \t]").expect("valid boundary regex"));

static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\[[A-Za-z0-9_]+\s+".*"\s*\]\s*$"#).expect("valid tag regex")
});

/// One record's text, with its position in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub index: usize,
    pub text: &'a str,
}

impl RawRecord<'_> {
    /// Checks for a header block followed by a non-empty movetext block.
    pub fn validate(&self) -> Result<(), IngestError> {
        let mut lines = self.text.lines().skip_while(|line| line.trim().is_empty());
        let mut saw_header = false;
        let mut movetext = false;

        for line in lines.by_ref() {
            if TAG_LINE.is_match(line) {
                saw_header = true;
                continue;
            }
            if !line.trim().is_empty() {
                movetext = true;
            }
            break;
        }

        if !saw_header {
            return Err(IngestError::MissingHeaders);
        }
        if movetext || lines.any(|line| !line.trim().is_empty()) {
            Ok(())
        } else {
            Err(IngestError::MissingMovetext)
        }
    }
}

/// Splits `blob` on the record boundary. Text before the first boundary is
/// returned as a record of its own when it is not blank, so that it gets
/// reported instead of silently dropped.
pub fn split_records(blob: &str) -> Vec<RawRecord<'_>> {
    let mut starts: Vec<usize> = RECORD_BOUNDARY.find_iter(blob).map(|m| m.start()).collect();
    let first = starts.first().copied().unwrap_or(blob.len());
    if first != 0 && !blob[..first].trim().is_empty() {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(blob.len());
            RawRecord {
                index,
                text: &blob[start..end],
            }
        })
        .collect()
}
