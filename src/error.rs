#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch Error: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Fetch Error: {url} returned HTTP {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Parse Error: {0}")]
    Parse(String),
    #[error("Missing Rate Error: no exchange rate for {0}")]
    MissingRate(String),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store Error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
