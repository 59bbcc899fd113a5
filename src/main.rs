use chess_resolver::chess::{
    Catalog, CompressionMode, RunConfig, load_corpus,
    config::{DEFAULT_COLLECTION_CEILING, DEFAULT_DISPLAY_CEILING},
    log, report, run_batch,
};
use clap::{Parser, ValueEnum};
use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Archive files or glob patterns
    #[arg(required_unless_present = "list")]
    archives: Vec<String>,

    /// Most examples one detector collects over the whole corpus
    #[arg(long, default_value_t = DEFAULT_COLLECTION_CEILING)]
    collection_ceiling: usize,

    /// Most examples printed per evaluator
    #[arg(long, default_value_t = DEFAULT_DISPLAY_CEILING)]
    display_ceiling: usize,

    /// Archive compression
    #[arg(long, value_enum, ignore_case = true, default_value_t = CompressionMode::Plain)]
    compression: CompressionMode,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Run only the named evaluator (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// List the catalog and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let catalog = Catalog::standard()?;

    if args.list {
        for evaluator in catalog.iter() {
            println!(
                "{:<32} {:<9} {}",
                evaluator.name(),
                evaluator.kind().as_str(),
                evaluator.description()
            );
        }
        return Ok(());
    }

    let config = RunConfig::new(args.collection_ceiling, args.display_ceiling)?;
    let evaluators = catalog.select(&args.only)?;

    let corpus = load_corpus(&args.archives, args.compression)?;
    log::info(format!(
        "running {} evaluator(s) over {} game(s)",
        evaluators.len(),
        corpus.len()
    ));
    let rows = run_batch(evaluators, &corpus, &config);

    match args.format {
        Format::Text => print!("{}", report::render_text(&corpus, &rows)),
        Format::Json => println!("{}", report::render_json(&corpus, &rows)?),
    }
    Ok(())
}
