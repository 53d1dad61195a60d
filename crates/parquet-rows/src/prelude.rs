//! Wrapper prelude.
//!
//! The `parquet-rows` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::{
    ColumnDeclaration, DatasetReader, DecodeMode, ExternalValue, LogicalType, ParquetReader,
    ParquetWriter, ReaderOptions, Row, SchemaDeclaration, TableError, TimeUnit, TypeId, Value,
    WriterOptions,
};
