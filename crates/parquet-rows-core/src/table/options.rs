//! Reader and writer configuration.
use parquet::file::properties::DEFAULT_MAX_ROW_GROUP_SIZE;

pub use crate::column::DecodeMode;

/// Rows per decoded batch when none is configured. Each batch becomes one
/// chunk per column.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Reader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Rows per decoded batch. Must be positive.
    pub batch_size: usize,
    /// Whether decode failures read as null or surface as errors.
    pub decode_mode: DecodeMode,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            decode_mode: DecodeMode::Permissive,
        }
    }
}

impl ReaderOptions {
    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the decode mode.
    pub fn with_decode_mode(mut self, decode_mode: DecodeMode) -> Self {
        self.decode_mode = decode_mode;
        self
    }
}

/// Writer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Maximum rows per row group. Must be positive.
    pub row_group_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            row_group_size: DEFAULT_MAX_ROW_GROUP_SIZE,
        }
    }
}

impl WriterOptions {
    /// Set the maximum rows per row group.
    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size;
        self
    }
}
