//! Storage layer backed by the `parquet` crate.
//!
//! This module is the only place that touches the filesystem:
//! - [`open_for_read`] loads a file and splits every column into its
//!   per-batch chunks;
//! - [`open_for_write`] creates the output file and returns a
//!   [`WriteHandle`], whose [`write_table`](WriteHandle::write_table) writes
//!   the finished columns and closes the file;
//! - [`list_data_files`] enumerates the files of a dataset directory.
//!
//! Everything above this layer works on in-memory chunks only.
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::ArrayRef,
    datatypes::SchemaRef,
    record_batch::{RecordBatch, RecordBatchOptions},
};
use bytes::Bytes;
use log::debug;
use parquet::{
    arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder},
    file::properties::WriterProperties,
};
use snafu::prelude::*;

use crate::column::ChunkedColumn;

pub mod error;

pub use error::{StorageError, StorageResult};
use error::{ArrowSnafu, IoSnafu, ParquetReadSnafu, ParquetWriteSnafu};

/// A Parquet file loaded into per-column chunk sequences.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Arrow schema stored in the file.
    pub schema: SchemaRef,
    /// One chunk sequence per schema field, in field order.
    pub columns: Vec<ChunkedColumn>,
    /// Total rows in the file.
    pub row_count: usize,
}

/// Read the whole file at `path` and decode it in batches of `batch_size`
/// rows. Each decoded batch contributes one chunk to every column.
pub fn open_for_read(path: &Path, batch_size: usize) -> StorageResult<LoadedFile> {
    let display = path.display().to_string();

    let data = std::fs::read(path).context(IoSnafu {
        path: display.clone(),
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(data))
        .context(ParquetReadSnafu {
            path: display.clone(),
        })?
        .with_batch_size(batch_size);

    let schema = Arc::clone(builder.schema());
    let row_groups = builder.metadata().num_row_groups();
    let reader = builder.build().context(ParquetReadSnafu {
        path: display.clone(),
    })?;

    let mut chunks: Vec<Vec<ArrayRef>> = vec![Vec::new(); schema.fields().len()];
    let mut row_count = 0usize;
    for batch in reader {
        let batch = batch.context(ArrowSnafu {
            path: display.clone(),
        })?;
        row_count += batch.num_rows();
        for (slot, column) in chunks.iter_mut().zip(batch.columns()) {
            slot.push(Arc::clone(column));
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(chunks)
        .map(|(field, chunks)| ChunkedColumn::new(field.name(), field.data_type().clone(), chunks))
        .collect();

    debug!("opened {display}: {row_count} rows, {row_groups} row groups");
    Ok(LoadedFile {
        schema,
        columns,
        row_count,
    })
}

/// Files of a dataset directory, sorted by name. Hidden entries (leading
/// `.` or `_`) and subdirectories are skipped.
pub fn list_data_files(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    let io_context = || IoSnafu {
        path: dir.display().to_string(),
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).context(io_context())? {
        let entry = entry.context(io_context())?;
        let hidden = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name.starts_with('_'));
        if hidden || !entry.file_type().context(io_context())?.is_file() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

/// An output file waiting for its table.
#[derive(Debug)]
pub struct WriteHandle {
    path: PathBuf,
    file: File,
    schema: SchemaRef,
    row_group_size: usize,
}

/// Create (or truncate) the file at `path` for writing a table of `schema`.
pub fn open_for_write(
    path: &Path,
    schema: SchemaRef,
    row_group_size: usize,
) -> StorageResult<WriteHandle> {
    let file = File::create(path).context(IoSnafu {
        path: path.display().to_string(),
    })?;
    debug!("created {}", path.display());
    Ok(WriteHandle {
        path: path.to_path_buf(),
        file,
        schema,
        row_group_size,
    })
}

impl WriteHandle {
    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Maximum rows per row group used by [`write_table`](Self::write_table).
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Change the maximum rows per row group. Applies to the table written
    /// at close.
    pub fn set_row_group_size(&mut self, row_group_size: usize) {
        self.row_group_size = row_group_size;
    }

    /// Write `columns` (one finished chunk per schema field, each
    /// `row_count` long) as a single table and close the file.
    pub fn write_table(self, columns: Vec<ArrayRef>, row_count: usize) -> StorageResult<()> {
        let display = self.path.display().to_string();

        let options = RecordBatchOptions::new().with_row_count(Some(row_count));
        let batch = RecordBatch::try_new_with_options(Arc::clone(&self.schema), columns, &options)
            .context(ArrowSnafu {
                path: display.clone(),
            })?;

        let props = WriterProperties::builder()
            .set_max_row_group_size(self.row_group_size)
            .build();
        let mut writer = ArrowWriter::try_new(self.file, Arc::clone(&self.schema), Some(props))
            .context(ParquetWriteSnafu {
                path: display.clone(),
            })?;
        if row_count > 0 {
            writer.write(&batch).context(ParquetWriteSnafu {
                path: display.clone(),
            })?;
        }
        writer.close().context(ParquetWriteSnafu {
            path: display.clone(),
        })?;

        debug!(
            "wrote {display}: {row_count} rows, row group size {}",
            self.row_group_size
        );
        Ok(())
    }
}
