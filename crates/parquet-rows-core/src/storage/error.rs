//! Error type for the storage layer.
use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

/// Errors raised by the storage layer while opening, reading or writing
/// Parquet files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// A filesystem operation failed.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The file is not readable as Parquet.
    #[snafu(display("Failed to read Parquet file {path}: {source}"))]
    ParquetRead {
        /// Path being read.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The Parquet writer rejected the table.
    #[snafu(display("Failed to write Parquet file {path}: {source}"))]
    ParquetWrite {
        /// Path being written.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Arrow rejected a batch while decoding or assembling it.
    #[snafu(display("Arrow error for {path}: {source}"))]
    Arrow {
        /// Path the batch belongs to.
        path: String,
        /// Underlying Arrow error.
        source: ArrowError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
