pub mod chess;

pub use chess::{Catalog, Corpus, RunConfig, load_corpus, run_batch};
