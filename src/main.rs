use clap::Parser;
use lib::{Conversion, Dataset, PageSource, PipelineConfig, PipelineError, SimpleLogger, TableLocator, run};
use log::debug;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Which table to scrape
    #[arg(value_enum)]
    dataset: Dataset,

    /// Page URL, or path to a saved copy of the page (defaults to the archived snapshot)
    #[arg(short, long)]
    source: Option<String>,

    /// Locate the table by header text instead of its position on the page
    #[arg(long)]
    header: Option<String>,

    /// Exchange-rate CSV with Currency,Rate columns (banks only)
    #[arg(short, long)]
    rates: Option<PathBuf>,

    /// Output CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write the final records as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Progress log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

impl Args {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::for_dataset(self.dataset);
        if let Some(source) = self.source {
            config.source = PageSource::parse(&source);
        }
        if let Some(header) = self.header {
            config.locator = TableLocator::Header(header);
        }
        if let (Some(path), Conversion::Currency { rates_path, .. }) =
            (self.rates, &mut config.conversion)
        {
            *rates_path = path;
        }
        if let Some(csv) = self.csv {
            config.csv_path = csv;
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(log_file) = self.log_file {
            config.log_path = log_file;
        }
        config.json_path = self.json;
        config
    }
}

fn main() -> Result<(), PipelineError> {
    let total_start = Instant::now();
    let args = Args::parse();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }

    let config = args.into_config();
    debug!("Source: {:?} | Table: {:?}", config.source, config.locator);
    debug!(
        "Outputs: csv={} db={} table={} log={}",
        config.csv_path.display(),
        config.db_path.display(),
        config.table,
        config.log_path.display()
    );

    let summary = run(&config)?;

    println!(
        "\nLoaded {} records into {} and ran {} queries in {:.2?}",
        summary.records.len(),
        config.table,
        summary.queries.len(),
        total_start.elapsed()
    );
    Ok(())
}
