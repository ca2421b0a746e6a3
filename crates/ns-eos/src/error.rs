//! Equation-of-state errors.

use thiserror::Error;

/// Result type for EOS operations.
pub type EosResult<T> = Result<T, EosError>;

/// Errors that can occur while building or querying an EOS.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EosError {
    /// Malformed or too-small table (fewer than 2 rows, unsorted, non-finite).
    #[error("EOS domain error: {what}")]
    Domain { what: String },

    /// Auxiliary column index past the end of the table.
    #[error("Auxiliary column {index} out of range ({len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },

    /// Named column not present.
    #[error("Missing EOS column: {name}")]
    MissingColumn { name: String },

    /// Invalid argument (model parameters, grid bounds).
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// File could not be read.
    #[error("I/O error reading EOS: {message}")]
    Io { message: String },

    /// CSV record could not be decoded.
    #[error("CSV error reading EOS: {message}")]
    Csv { message: String },
}

impl EosError {
    pub(crate) fn domain(what: impl Into<String>) -> Self {
        EosError::Domain { what: what.into() }
    }
}

impl From<std::io::Error> for EosError {
    fn from(e: std::io::Error) -> Self {
        EosError::Io {
            message: e.to_string(),
        }
    }
}

impl From<csv::Error> for EosError {
    fn from(e: csv::Error) -> Self {
        EosError::Csv {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EosError::domain("need at least 2 rows");
        assert!(err.to_string().contains("at least 2 rows"));

        let err = EosError::ColumnOutOfRange { index: 3, len: 1 };
        assert!(err.to_string().contains("3"));
    }
}
