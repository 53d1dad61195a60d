//! Row-oriented marshalling for Parquet files.
//!
//! Parquet stores data column by column; callers often want to produce and
//! consume it one row at a time. This crate sits between the two:
//!
//! - A closed type registry mapping declared column types onto Arrow storage
//!   types, and a schema builder that validates declarations up front
//!   (`metadata` module).
//! - Per-column access over chunked Arrow arrays for reading, and per-column
//!   builders that coerce dynamically typed host values for writing
//!   (`column` module).
//! - A row marshaller joining the per-column paths into rows (`row` module).
//! - A capability interface over host values, with adapters for the native
//!   [`Value`] enum and `serde_json::Value` (`value` module).
//! - A thin storage layer over the `parquet` crate (`storage` module) and
//!   the caller-facing reader, dataset reader and writer handles (`table`
//!   module).
//!
//! Higher-level wrappers (for example, the `parquet-rows` facade) are
//! expected to re-export from here rather than reach into module paths.
#![deny(missing_docs)]
pub mod column;
pub mod metadata;
pub mod row;
pub mod storage;
pub mod table;
pub mod value;

pub use metadata::{
    ColumnDeclaration, LogicalType, SchemaBuilder, SchemaDeclaration, SchemaError, TableSchema,
    TimeUnit, TypeId, TypeParameters,
};
pub use row::{Row, RowError};
pub use table::{
    DatasetReader, DecodeMode, ParquetReader, ParquetWriter, ReaderOptions, TableError,
    TableResult, WriterOptions,
};
pub use value::{ExternalValue, Value};
