use std::path::PathBuf;
use thiserror::Error;

pub type DfqResult<T> = Result<T, DfqError>;

#[derive(Error, Debug)]
pub enum DfqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parameter index {index} out of range (plan has {len} parameters)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown header field: {0}")]
    InvalidHeaderKey(String),

    #[error("Unknown or read-only parameter field: {0}")]
    InvalidParameterKey(String),

    #[error("Code '{code}' is not defined in the {catalog} catalog")]
    UnknownCode { catalog: &'static str, code: String },

    #[error("Label '{label}' is not defined in the {catalog} catalog")]
    UnknownLabel { catalog: &'static str, label: String },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Failed to create output directory '{}': {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write DFQ file '{}': {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}
