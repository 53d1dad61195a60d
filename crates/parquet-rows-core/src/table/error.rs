//! Error type for the caller-facing reader and writer handles.
//!
//! Lower layers keep their own enums (`SchemaError`, `RowError`,
//! `DecodeError`, `StorageError`); `TableError` wraps them with the
//! lifecycle failures that only exist at this level.
use snafu::prelude::*;

use crate::{
    column::{AppendError, DecodeError},
    metadata::SchemaError,
    row::RowError,
    storage::StorageError,
};

/// Errors from [`ParquetReader`](super::ParquetReader),
/// [`ParquetWriter`](super::ParquetWriter) and
/// [`DatasetReader`](super::DatasetReader).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    /// The handle must be opened first.
    #[snafu(display("{path} is not open"))]
    NotOpen {
        /// Path of the handle.
        path: String,
    },

    /// The writer was already closed and its file written.
    #[snafu(display("{path} is already closed"))]
    Closed {
        /// Path of the handle.
        path: String,
    },

    /// An earlier `close` failed; the buffered rows were not written and the
    /// writer accepts no further calls.
    #[snafu(display("{path} failed to close; its rows were not written"))]
    CloseFailed {
        /// Path of the handle.
        path: String,
    },

    /// The schema declaration was rejected.
    #[snafu(display("Schema error: {source}"))]
    Schema {
        /// Underlying schema error.
        source: SchemaError,
    },

    /// A row was rejected. Earlier rows are unaffected.
    #[snafu(display("Row rejected: {source}"))]
    Row {
        /// Underlying row error.
        source: RowError,
    },

    /// Strict decoding failed.
    #[snafu(display("Decode error: {source}"))]
    Decode {
        /// Underlying decode error.
        source: DecodeError,
    },

    /// Finishing the column builders failed at close.
    #[snafu(display("Failed to finish columns: {source}"))]
    Finish {
        /// Underlying builder error.
        source: AppendError,
    },

    /// The storage layer failed.
    #[snafu(display("Storage error: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(source, backtrace)]
        source: StorageError,
    },

    /// A dataset file does not have the same columns as the first file.
    #[snafu(display(
        "Dataset file {file} has columns {found:?}, expected {expected:?}"
    ))]
    DatasetMismatch {
        /// The offending file.
        file: String,
        /// Column names of the first file.
        expected: Vec<String>,
        /// Column names of the offending file.
        found: Vec<String>,
    },

    /// A dataset directory contains no data files.
    #[snafu(display("Dataset directory {path} contains no data files"))]
    EmptyDataset {
        /// The directory.
        path: String,
    },

    /// The path is neither a regular file nor a directory.
    #[snafu(display("Unsupported node type: {path}"))]
    UnsupportedNode {
        /// The path.
        path: String,
    },

    /// Row groups must hold at least one row.
    #[snafu(display("Row group size must be positive, got {size}"))]
    InvalidRowGroupSize {
        /// The rejected size.
        size: usize,
    },

    /// Read batches must hold at least one row.
    #[snafu(display("Batch size must be positive, got {size}"))]
    InvalidBatchSize {
        /// The rejected size.
        size: usize,
    },
}

/// Result alias for reader and writer operations.
pub type TableResult<T> = Result<T, TableError>;
