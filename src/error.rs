use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarginEngineError {
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("No tabular structure could be extracted from {}: {details}", .path.display())]
    Parse { path: PathBuf, details: String },

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MarginEngineError>;
