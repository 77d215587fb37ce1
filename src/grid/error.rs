use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Failed to read grid file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Malformed GRIB {context}: {reason}")]
    MalformedMessage { context: String, reason: String },

    #[error("Unknown parameter short name '{0}'")]
    UnknownParameter(String),

    #[error("No '{short_name}' fields found in '{path}'")]
    VariableNotFound { path: PathBuf, short_name: String },

    #[error("Failed to decode {0}")]
    Decode(String, #[source] grib::GribError),

    #[error("Grid of {0} contains no points")]
    EmptyGrid(String),

    #[error("Grid point {index} is out of range for {context} with {len} values")]
    ValueCountMismatch {
        context: String,
        index: usize,
        len: usize,
    },
}
