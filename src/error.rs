//! Error types for machine persistence and folder management

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MachineError {
    #[error("Cannot open file '{path}': {source}")]
    FileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse '{path}': {source}")]
    MalformedDocument {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Machine folder '{name}' already exists in '{parent}'")]
    AlreadyExists { name: String, parent: PathBuf },

    #[error("Cannot create directory '{path}': {source}")]
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Machine '{uuid}' not found in registry")]
    NotFound { uuid: String },

    #[error("Machine '{uuid}' was removed from the registry but '{path}' could not be deleted")]
    PartialDeletion { uuid: String, path: PathBuf },

    #[error("Cannot write file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot encode machine '{name}': {source}")]
    Encode {
        name: String,
        source: serde_json::Error,
    },

    #[error("Invalid machine: {0}")]
    Invalid(String),

    #[error("Cannot lock '{path}': {source}")]
    Lock {
        path: PathBuf,
        source: dir_lock::Error,
    },

    #[error("no home directory found")]
    NoHome,
}
