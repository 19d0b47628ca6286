pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod structs;
pub mod transform;

// Re-export public API
pub use config::{Conversion, Dataset, PageSource, PipelineConfig, TableLocator};
pub use error::{PipelineError, Result};
pub use extract::{extract, fetch_page, parse_table};
pub use load::{load_to_db, write_csv, write_json};
pub use pipeline::{RunSummary, Stage, run};
pub use progress::log_progress;
pub use query::run_query;
pub use structs::{RateTable, Record, RecordSet, SimpleLogger, Value};
pub use transform::{SideInput, transform};
