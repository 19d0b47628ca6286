use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::extract::extract;
use crate::load::{load_to_db, write_csv, write_json};
use crate::progress::log_progress;
use crate::query::run_query;
use crate::structs::RecordSet;
use crate::transform::{SideInput, transform};
use log::{debug, info};
use rusqlite::Connection;

/// Milestones of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Extracted,
    Transformed,
    FileSaved,
    ConnectionOpen,
    TableLoaded,
    Queried,
    ConnectionClosed,
}

impl Stage {
    pub const SEQUENCE: [Stage; 8] = [
        Stage::Init,
        Stage::Extracted,
        Stage::Transformed,
        Stage::FileSaved,
        Stage::ConnectionOpen,
        Stage::TableLoaded,
        Stage::Queried,
        Stage::ConnectionClosed,
    ];

    /// Line written to the progress log once the stage is reached.
    pub fn milestone(self) -> &'static str {
        match self {
            Stage::Init => "Preliminaries complete. Initiating ETL process",
            Stage::Extracted => "Data extraction complete. Initiating Transformation process",
            Stage::Transformed => "Data transformation complete. Initiating Loading process",
            Stage::FileSaved => "Data saved to CSV file",
            Stage::ConnectionOpen => "SQL Connection initiated",
            Stage::TableLoaded => "Data loaded to Database as a table, Executing queries",
            Stage::Queried => "Process Complete",
            Stage::ConnectionClosed => "Server Connection closed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub query: String,
    pub result: RecordSet,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records: RecordSet,
    pub queries: Vec<QueryOutput>,
    pub stages: Vec<Stage>,
}

/// Milestones reached so far; each one must be the next entry of `Stage::SEQUENCE`.
struct Progress<'a> {
    config: &'a PipelineConfig,
    reached: Vec<Stage>,
}

impl<'a> Progress<'a> {
    fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            reached: Vec::with_capacity(Stage::SEQUENCE.len()),
        }
    }

    fn reach(&mut self, stage: Stage) -> Result<()> {
        debug_assert_eq!(
            Stage::SEQUENCE.get(self.reached.len()),
            Some(&stage),
            "stage reached out of order"
        );
        info!("{}", stage.milestone());
        log_progress(&self.config.log_path, stage.milestone())?;
        self.reached.push(stage);
        Ok(())
    }
}

/// Runs extract, transform, both loads and the fixed queries, strictly in order.
///
/// Any failure ends the run at once. The progress log then stops at the last
/// milestone reached, and the connection is left to drop without an explicit close.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let mut progress = Progress::new(config);
    progress.reach(Stage::Init)?;

    let extracted = extract(config)?;
    println!("{}", extracted);
    progress.reach(Stage::Extracted)?;

    let side = SideInput::load(&config.conversion)?;
    let records = transform(extracted, &side)?;
    println!("{}", records);
    progress.reach(Stage::Transformed)?;

    write_csv(&records, &config.csv_path)?;
    if let Some(json_path) = &config.json_path {
        write_json(&records, json_path)?;
        debug!("Wrote JSON snapshot to {}", json_path.display());
    }
    progress.reach(Stage::FileSaved)?;

    let mut conn = Connection::open(&config.db_path)?;
    progress.reach(Stage::ConnectionOpen)?;

    load_to_db(&mut conn, &records, &config.table)?;
    progress.reach(Stage::TableLoaded)?;

    let mut queries = Vec::with_capacity(config.queries.len());
    for query in &config.queries {
        println!("{}", query);
        let result = run_query(&conn, query)?;
        println!("{}", result);
        queries.push(QueryOutput {
            query: query.clone(),
            result,
        });
    }
    progress.reach(Stage::Queried)?;

    conn.close().map_err(|(_, e)| PipelineError::Store(e))?;
    progress.reach(Stage::ConnectionClosed)?;

    Ok(RunSummary {
        records,
        queries,
        stages: progress.reached,
    })
}
