use httpbench_common::{BenchError, MetricsRecord, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `<library>_c<concurrency>.json`, keeping only ASCII alphanumerics of the library name.
pub fn output_file_name(library: &str, concurrency: usize) -> String {
    let library: String = library.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("{library}_c{concurrency}.json")
}

/// Pretty-print `record` into `dir`, creating the directory if needed. Returns the written path.
pub fn write_record(dir: &Path, record: &MetricsRecord) -> Result<PathBuf> {
    let path = dir.join(output_file_name(&record.library, record.concurrency));
    let output_error = |message: String| BenchError::Output {
        path: path.display().to_string(),
        message,
    };

    let json = serde_json::to_string_pretty(record).map_err(|e| output_error(e.to_string()))?;
    fs::create_dir_all(dir).map_err(|e| output_error(e.to_string()))?;
    fs::write(&path, json).map_err(|e| output_error(e.to_string()))?;
    Ok(path)
}
