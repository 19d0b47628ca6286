use chrono::{Local, NaiveDateTime};
use std::{fs::OpenOptions, io::Write, path::Path};

/// `2023-Sep-08-09:16:35`
pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

/// Formats one progress line, without the trailing newline.
pub fn format_entry(at: NaiveDateTime, message: &str) -> String {
    format!("{} : {}", at.format(TIMESTAMP_FORMAT), message)
}

/// Appends a timestamped milestone line to the progress log, creating the file if needed.
///
/// The file is never truncated, so consecutive runs accumulate in the same log.
pub fn log_progress(path: &Path, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", format_entry(Local::now().naive_local(), message))
}
