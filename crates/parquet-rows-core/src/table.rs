//! Caller-facing reader and writer handles.
//!
//! - [`ParquetReader`]: open one file, then read rows by index.
//! - [`DatasetReader`]: the same over a directory of files.
//! - [`ParquetWriter`]: append rows against a declared schema, then close
//!   to write them as one table.
//!
//! Handles are synchronous and hold no locks; share one across threads only
//! behind the caller's own synchronisation.
pub mod dataset;
pub mod error;
pub mod options;
pub mod reader;
pub mod writer;

pub use dataset::DatasetReader;
pub use error::{TableError, TableResult};
pub use options::{DEFAULT_BATCH_SIZE, DecodeMode, ReaderOptions, WriterOptions};
pub use reader::ParquetReader;
pub use writer::ParquetWriter;
