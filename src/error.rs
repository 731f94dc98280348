//! Error types for the VCF filter and annotation tools.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while filtering or annotating VCF files.
#[derive(Error, Debug)]
pub enum VcfError {
    /// The criteria file could not be read or is not a JSON object.
    #[error("Failed to load criteria: {0}")]
    CriteriaLoad(String),

    /// A criterion value does not contain a supported operator.
    #[error("Invalid condition for field '{field}': {condition}")]
    InvalidCondition { field: String, condition: String },

    /// Failed to parse a VCF data row.
    #[error("Row parse error: {0}")]
    RowParse(String),

    /// Error while streaming records through the filter.
    #[error("Error processing VCF: {0}")]
    Processing(String),

    /// The input VCF does not exist.
    #[error("VCF file '{}' not found", .0.display())]
    MissingInput(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[cfg(feature = "xlsx")]
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type alias for VCF operations.
pub type Result<T> = std::result::Result<T, VcfError>;

/// Failure of a single remote lookup.
///
/// Kept separate from [`VcfError`] because a lookup failure never aborts a
/// run; the annotator records it and carries on without the data.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The request could not be sent or timed out.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body was not the expected JSON.
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}
