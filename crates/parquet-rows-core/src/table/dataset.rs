//! Multi-file reader over a dataset directory.
//!
//! A dataset is either a single Parquet file or a directory of them. The
//! files are read in name order and must share the same column names; a
//! logical row index is resolved to a file with the same running-offset
//! walk used for chunks within a column.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;
use snafu::prelude::*;

use crate::{
    column::{DecodeMode, error::RowOutOfRangeSnafu, locate},
    metadata::LogicalType,
    row::Row,
    storage,
    table::{
        error::{
            DatasetMismatchSnafu, DecodeSnafu, EmptyDatasetSnafu, NotOpenSnafu, StorageSnafu,
            TableResult, UnsupportedNodeSnafu,
        },
        options::ReaderOptions,
        reader::ParquetReader,
    },
    value::Value,
};

#[derive(Debug)]
struct OpenDataset {
    names: Arc<[String]>,
    row_counts: Vec<usize>,
    total_rows: usize,
}

/// Reads rows across every data file of a dataset.
#[derive(Debug)]
pub struct DatasetReader {
    path: PathBuf,
    options: ReaderOptions,
    readers: Vec<ParquetReader>,
    state: Option<OpenDataset>,
}

impl DatasetReader {
    /// Resolve the files of `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> TableResult<Self> {
        Self::with_options(path, ReaderOptions::default())
    }

    /// Resolve the files of `path`. A directory contributes its visible
    /// regular files in name order; a file is a dataset of one.
    pub fn with_options(path: impl Into<PathBuf>, options: ReaderOptions) -> TableResult<Self> {
        let path = path.into();
        let display = path.display().to_string();

        let meta = std::fs::metadata(&path)
            .context(storage::error::IoSnafu {
                path: display.clone(),
            })
            .context(StorageSnafu)?;

        let files = if meta.is_dir() {
            let files = storage::list_data_files(&path).context(StorageSnafu)?;
            ensure!(!files.is_empty(), EmptyDatasetSnafu { path: display });
            files
        } else if meta.is_file() {
            vec![path.clone()]
        } else {
            return UnsupportedNodeSnafu { path: display }.fail();
        };

        let readers = files
            .into_iter()
            .map(|file| ParquetReader::with_options(file, options))
            .collect();
        Ok(DatasetReader {
            path,
            options,
            readers,
            state: None,
        })
    }

    /// Resolve and open `path`.
    pub fn open_path(path: impl Into<PathBuf>) -> TableResult<Self> {
        let mut dataset = Self::new(path)?;
        dataset.open()?;
        Ok(dataset)
    }

    /// Dataset path as given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data files in read order.
    pub fn files(&self) -> Vec<&Path> {
        self.readers.iter().map(ParquetReader::path).collect()
    }

    /// Open every file and check they agree on column names. If any file
    /// fails, every file is closed again.
    pub fn open(&mut self) -> TableResult<bool> {
        if self.state.is_some() {
            return Ok(true);
        }
        match self.open_all() {
            Ok(state) => {
                debug!(
                    "opened dataset {}: {} files, {} rows",
                    self.path.display(),
                    self.readers.len(),
                    state.total_rows
                );
                self.state = Some(state);
                Ok(true)
            }
            Err(e) => {
                self.readers.iter_mut().for_each(|r| {
                    r.close();
                });
                Err(e)
            }
        }
    }

    fn open_all(&mut self) -> TableResult<OpenDataset> {
        let mut names: Option<Arc<[String]>> = None;
        let mut row_counts = Vec::with_capacity(self.readers.len());

        for reader in &mut self.readers {
            reader.open()?;
            let file_names = reader.shared_names()?;
            let expected = names.get_or_insert_with(|| Arc::clone(file_names));
            ensure!(
                expected[..] == file_names[..],
                DatasetMismatchSnafu {
                    file: reader.path().display().to_string(),
                    expected: expected.to_vec(),
                    found: file_names.to_vec(),
                }
            );
            row_counts.push(reader.row_count()?);
        }

        let names = names.context(EmptyDatasetSnafu {
            path: self.path.display().to_string(),
        })?;
        let total_rows = row_counts.iter().sum();
        Ok(OpenDataset {
            names,
            row_counts,
            total_rows,
        })
    }

    /// Close every file. Returns the open state afterwards (`false`).
    pub fn close(&mut self) -> bool {
        self.state = None;
        self.readers.iter_mut().for_each(|r| {
            r.close();
        });
        false
    }

    /// Whether the dataset is open.
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> TableResult<&OpenDataset> {
        self.state.as_ref().context(NotOpenSnafu {
            path: self.path.display().to_string(),
        })
    }

    /// Column names shared by every file.
    pub fn column_names(&self) -> TableResult<Vec<String>> {
        Ok(self.state()?.names.to_vec())
    }

    /// Number of columns.
    pub fn column_count(&self) -> TableResult<usize> {
        Ok(self.state()?.names.len())
    }

    /// Rows across all files.
    pub fn row_count(&self) -> TableResult<usize> {
        Ok(self.state()?.total_rows)
    }

    /// Stored column types of the first file.
    pub fn logical_types(&self) -> TableResult<Vec<Option<LogicalType>>> {
        self.state()?;
        match self.readers.first() {
            Some(reader) => reader.logical_types(),
            None => Ok(Vec::new()),
        }
    }

    /// Decode dataset row `index`.
    pub fn read_row(&self, index: usize) -> TableResult<Row> {
        let state = self.state()?;
        match locate(state.row_counts.iter().copied(), index) {
            Some(pos) => self.readers[pos.chunk].read_row(pos.index),
            None => match self.options.decode_mode {
                DecodeMode::Permissive => Ok(Row::new(
                    Arc::clone(&state.names),
                    vec![Value::Null; state.names.len()],
                )),
                DecodeMode::Strict => RowOutOfRangeSnafu {
                    row: index,
                    len: state.total_rows,
                }
                .fail()
                .context(DecodeSnafu),
            },
        }
    }

    /// Decode dataset row `index` as values in column order.
    pub fn read_row_positional(&self, index: usize) -> TableResult<Vec<Value>> {
        Ok(self.read_row(index)?.into_values())
    }
}
