//! Single-file reader.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use snafu::prelude::*;

use crate::{
    column::{ChunkedColumn, DecodeMode},
    metadata::LogicalType,
    row::{self, Row},
    storage,
    table::{
        error::{
            DecodeSnafu, InvalidBatchSizeSnafu, NotOpenSnafu, StorageSnafu, TableResult,
        },
        options::ReaderOptions,
    },
    value::Value,
};

#[derive(Debug)]
struct OpenFile {
    names: Arc<[String]>,
    columns: Vec<ChunkedColumn>,
    row_count: usize,
}

/// Reads rows out of one Parquet file.
///
/// `open` loads every column's chunks into memory; rows are then decoded
/// on demand, one value per column, without further I/O.
#[derive(Debug)]
pub struct ParquetReader {
    path: PathBuf,
    options: ReaderOptions,
    file: Option<OpenFile>,
}

impl ParquetReader {
    /// A closed reader for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, ReaderOptions::default())
    }

    /// A closed reader for `path`.
    pub fn with_options(path: impl Into<PathBuf>, options: ReaderOptions) -> Self {
        ParquetReader {
            path: path.into(),
            options,
            file: None,
        }
    }

    /// Create a reader and open it.
    pub fn open_path(path: impl Into<PathBuf>) -> TableResult<Self> {
        let mut reader = Self::new(path);
        reader.open()?;
        Ok(reader)
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reader configuration.
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Load the file. Returns `true` once the reader is open; opening an
    /// open reader is a no-op. On failure the reader stays closed.
    pub fn open(&mut self) -> TableResult<bool> {
        if self.file.is_some() {
            return Ok(true);
        }
        ensure!(
            self.options.batch_size > 0,
            InvalidBatchSizeSnafu {
                size: self.options.batch_size
            }
        );

        let loaded =
            storage::open_for_read(&self.path, self.options.batch_size).context(StorageSnafu)?;

        if self.options.decode_mode == DecodeMode::Permissive {
            for column in loaded.columns.iter().filter(|c| c.logical_type().is_none()) {
                warn!(
                    "{}: column '{}' has stored type {:?} with no decoder; it will read as null",
                    self.path.display(),
                    column.name(),
                    column.data_type()
                );
            }
        }

        let names: Arc<[String]> = loaded
            .columns
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        self.file = Some(OpenFile {
            names,
            columns: loaded.columns,
            row_count: loaded.row_count,
        });
        Ok(true)
    }

    /// Release the loaded chunks. Returns the open state afterwards, which
    /// is always `false`; closing a closed reader is a no-op.
    pub fn close(&mut self) -> bool {
        if self.file.take().is_some() {
            debug!("closed {}", self.path.display());
        }
        false
    }

    /// Whether `open` has succeeded and `close` has not been called since.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn file(&self) -> TableResult<&OpenFile> {
        self.file.as_ref().context(NotOpenSnafu {
            path: self.path.display().to_string(),
        })
    }

    pub(crate) fn shared_names(&self) -> TableResult<&Arc<[String]>> {
        Ok(&self.file()?.names)
    }

    /// Column names in file order.
    pub fn column_names(&self) -> TableResult<Vec<String>> {
        Ok(self.file()?.names.to_vec())
    }

    /// Number of columns.
    pub fn column_count(&self) -> TableResult<usize> {
        Ok(self.file()?.columns.len())
    }

    /// Number of rows.
    pub fn row_count(&self) -> TableResult<usize> {
        Ok(self.file()?.row_count)
    }

    /// Stored column types mapped into the supported set; `None` for a
    /// stored type outside it.
    pub fn logical_types(&self) -> TableResult<Vec<Option<LogicalType>>> {
        Ok(self
            .file()?
            .columns
            .iter()
            .map(ChunkedColumn::logical_type)
            .collect())
    }

    /// Decode row `index`.
    ///
    /// In permissive mode an out-of-range index yields a row of nulls.
    pub fn read_row(&self, index: usize) -> TableResult<Row> {
        let file = self.file()?;
        row::read_row(&file.names, &file.columns, index, self.options.decode_mode)
            .context(DecodeSnafu)
    }

    /// Decode row `index` as values in column order.
    pub fn read_row_positional(&self, index: usize) -> TableResult<Vec<Value>> {
        Ok(self.read_row(index)?.into_values())
    }
}
