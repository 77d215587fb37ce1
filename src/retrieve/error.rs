use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("Invalid retrieval request: {0}")]
    InvalidRequest(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Servers that ignore `Range` answer 200 with the whole file
    #[error("Range request to {url} answered with status {status} instead of 206 Partial Content")]
    RangeIgnored {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Expected {expected} bytes from {url} ({range}), received {received}")]
    LengthMismatch {
        url: String,
        range: String,
        expected: u64,
        received: u64,
    },

    #[error("Failed to parse line {line} of index {url}")]
    IndexParse {
        url: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    // The run exists but none of its fields match the requested parameters
    #[error("No fields matching {params:?} in {url}")]
    NoMatchingFields { url: String, params: Vec<String> },

    #[error("Failed to write target file '{0}'")]
    TargetWrite(PathBuf, #[source] std::io::Error),

    #[error("Data download failed for {0}")]
    DownloadIo(String, #[source] std::io::Error),
}
