//! Error types for column access and column building.
//!
//! `DecodeError` only surfaces in strict decoding; the permissive read path
//! turns it into a null value. `AppendError` is what a single column
//! append can fail with, and is wrapped by the row marshaller.
use arrow::{datatypes::DataType, error::ArrowError};
use snafu::prelude::*;

use crate::metadata::LogicalType;

/// Errors while decoding a value from a column's chunks.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    /// The logical row is not inside any chunk.
    #[snafu(display("Row {row} is out of range for a column of {len} rows"))]
    RowOutOfRange {
        /// Requested logical row.
        row: usize,
        /// Total rows across all chunks.
        len: usize,
    },

    /// The stored Arrow type has no decoder.
    #[snafu(display("No decoder for stored type {data_type:?}"))]
    UnsupportedType {
        /// Arrow type found in the chunk.
        data_type: DataType,
    },
}

/// Errors while appending to a column builder.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppendError {
    /// The value cannot be coerced to the column's declared type.
    #[snafu(display("Column '{column}' expects {expected}, got {found}"))]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Declared type.
        expected: LogicalType,
        /// Short description of the rejected value.
        found: String,
    },

    /// A fixed-size binary value has the wrong length.
    #[snafu(display("Column '{column}' expects {expected} bytes, got {actual}"))]
    SizeMismatch {
        /// Column name.
        column: String,
        /// Declared width.
        expected: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// The builder was already sealed by `finish`.
    #[snafu(display("Column '{column}' is sealed; no further appends are allowed"))]
    Sealed {
        /// Column name.
        column: String,
    },

    /// A coerced scalar did not match the accumulator variant. This is an
    /// internal invariant violation, not a user error.
    #[snafu(display("Column '{column}' received a scalar not valid for {expected}"))]
    UnexpectedScalar {
        /// Column name.
        column: String,
        /// Declared type.
        expected: LogicalType,
    },

    /// The underlying Arrow builder rejected the value.
    #[snafu(display("Arrow rejected a value for column '{column}': {source}"))]
    Arrow {
        /// Column name.
        column: String,
        /// Underlying Arrow error.
        source: ArrowError,
    },
}
