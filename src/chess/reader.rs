use super::error::ReadError;
use super::log;
use super::normalize::ingest_archive;
use super::types::Corpus;
use clap::ValueEnum;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder as ZstdDecoder;

pub type ArchiveInput = Box<dyn Read>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum CompressionMode {
    #[default]
    Plain,
    Zstd,
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<ArchiveInput, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.display().to_string(),
        source,
    })?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as ArchiveInput)
            .map_err(|source| ReadError::Zstd {
                path: path.display().to_string(),
                source,
            }),
    }
}

/// A pattern with `*` or `?` is globbed, anything else is taken as a path.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, ReadError> {
    if !(pattern.contains('*') || pattern.contains('?')) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let mut paths: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(ReadError::NoMatch(pattern.to_string()));
    }
    Ok(paths)
}

/// Reads a whole archive into memory. Invalid UTF-8 is replaced, not fatal.
pub fn read_archive(path: &Path, compression: CompressionMode) -> Result<String, ReadError> {
    let mut input = open_input_stream(path, compression)?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|source| ReadError::Read {
            path: path.display().to_string(),
            source,
        })?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn(format!("{}: archive is not valid UTF-8", path.display()));
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    })
}

/// Loads every archive named by `patterns` into one corpus. Record indices
/// keep counting across files.
///
/// With a single explicit path an unreadable file is an error; otherwise the
/// file is skipped with a warning.
pub fn load_corpus(patterns: &[String], compression: CompressionMode) -> Result<Corpus, ReadError> {
    let mut paths = Vec::new();
    for pattern in patterns {
        paths.extend(expand_pattern(pattern)?);
    }

    let mut corpus = Corpus::new(patterns.join(", "));
    let single = paths.len() == 1;
    for path in &paths {
        let blob = match read_archive(path, compression) {
            Ok(blob) => blob,
            Err(err) if !single => {
                log::warn(format!("skipping archive: {err}"));
                continue;
            }
            Err(err) => return Err(err),
        };

        let next_index = corpus.games.len() + corpus.skipped.len();
        let loaded = ingest_archive(&path.display().to_string(), &blob, next_index);
        corpus.extend(loaded);
    }

    Ok(corpus)
}
