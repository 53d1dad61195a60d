//! # parquet-rows
//!
//! Read and write Parquet files one row at a time.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//!
//! ## Example
//!
//! ```rust,no_run
//! use parquet_rows::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = SchemaDeclaration::from_json(&json!({
//!     "id": { "type": "INT64" },
//!     "at": { "type": "TIMESTAMP", "unit": "MILLI" },
//! }))?;
//!
//! let mut writer = ParquetWriter::create(&schema, "rows.parquet")?;
//! writer.append_json(&json!([1, "2024-03-01T12:00:00Z"]))?;
//! writer.close()?;
//!
//! let reader = ParquetReader::open_path("rows.parquet")?;
//! assert_eq!(reader.row_count()?, 1);
//! println!("{}", reader.read_row(0)?.to_json());
//! # Ok(())
//! # }
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Low-level column access, for callers working on Arrow chunks directly.
pub mod column {
    pub use parquet_rows_core::column::{
        AppendError, ChunkPosition, ChunkedColumn, ColumnBuilder, DecodeError, Scalar, locate,
        try_value_at, value_at,
    };
}

pub use parquet_rows_core::metadata::{
    ColumnDeclaration, LogicalType, SchemaBuilder, SchemaDeclaration, SchemaError, TableSchema,
    TimeUnit, TypeId, TypeParameters, TypeRegistryError, logical_type_of,
};
pub use parquet_rows_core::row::{Row, RowError, RowMarshaller};
pub use parquet_rows_core::storage::StorageError;
pub use parquet_rows_core::table::{
    DatasetReader, DecodeMode, ParquetReader, ParquetWriter, ReaderOptions, TableError,
    TableResult, WriterOptions,
};
pub use parquet_rows_core::value::{ExternalValue, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER, Value};
