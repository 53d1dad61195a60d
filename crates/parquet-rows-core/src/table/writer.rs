//! Single-file writer.
use std::path::{Path, PathBuf};

use log::{info, warn};
use snafu::prelude::*;

use crate::{
    metadata::{SchemaDeclaration, TableSchema},
    row::RowMarshaller,
    storage::{self, WriteHandle},
    table::{
        error::{
            CloseFailedSnafu, ClosedSnafu, FinishSnafu, InvalidRowGroupSizeSnafu, NotOpenSnafu,
            RowSnafu, SchemaSnafu, StorageSnafu, TableResult,
        },
        options::WriterOptions,
    },
    value::ExternalValue,
};

/// Accumulates rows in memory and writes them as one Parquet table when
/// closed.
///
/// Rows can be appended before or after `open`; `open` only creates the
/// output file. `close` finishes every column, writes the table using the
/// row group size in effect at that moment, and closes the file.
#[derive(Debug)]
pub struct ParquetWriter {
    path: PathBuf,
    options: WriterOptions,
    marshaller: RowMarshaller,
    handle: Option<WriteHandle>,
    lifecycle: Lifecycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Accepting,
    Closed,
    // The handle and the sealed builders are gone; nothing can be retried.
    Failed,
}

impl ParquetWriter {
    /// A writer for `path` from a caller-facing schema declaration.
    pub fn new(declaration: &SchemaDeclaration, path: impl Into<PathBuf>) -> TableResult<Self> {
        let schema = declaration.build().context(SchemaSnafu)?;
        Ok(Self::from_schema(schema, path))
    }

    /// A writer for `path` from a built schema.
    pub fn from_schema(schema: TableSchema, path: impl Into<PathBuf>) -> Self {
        Self::with_options(schema, path, WriterOptions::default())
    }

    /// A writer for `path` from a built schema and explicit options.
    pub fn with_options(
        schema: TableSchema,
        path: impl Into<PathBuf>,
        options: WriterOptions,
    ) -> Self {
        ParquetWriter {
            path: path.into(),
            options,
            marshaller: RowMarshaller::new(schema),
            handle: None,
            lifecycle: Lifecycle::Accepting,
        }
    }

    /// Create a writer and open it.
    pub fn create(declaration: &SchemaDeclaration, path: impl Into<PathBuf>) -> TableResult<Self> {
        let mut writer = Self::new(declaration, path)?;
        writer.open()?;
        Ok(writer)
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Table schema.
    pub fn schema(&self) -> &TableSchema {
        self.marshaller.schema()
    }

    /// Writer configuration.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Rows accepted so far.
    pub fn row_count(&self) -> usize {
        self.marshaller.row_count()
    }

    /// Whether the output file is open.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether `close` has completed and the table was written.
    pub fn is_closed(&self) -> bool {
        self.lifecycle == Lifecycle::Closed
    }

    /// Whether an earlier `close` failed.
    pub fn is_failed(&self) -> bool {
        self.lifecycle == Lifecycle::Failed
    }

    /// Whether rows were accepted that no successful `close` has written.
    pub fn has_unwritten_rows(&self) -> bool {
        self.lifecycle != Lifecycle::Closed && self.marshaller.row_count() > 0
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }

    fn ensure_writable(&self) -> TableResult<()> {
        match self.lifecycle {
            Lifecycle::Accepting => Ok(()),
            Lifecycle::Closed => ClosedSnafu {
                path: self.path_string(),
            }
            .fail(),
            Lifecycle::Failed => CloseFailedSnafu {
                path: self.path_string(),
            }
            .fail(),
        }
    }

    /// Create the output file. Opening an open writer is a no-op.
    pub fn open(&mut self) -> TableResult<bool> {
        self.ensure_writable()?;
        if self.handle.is_none() {
            let schema = self.marshaller.schema().arrow_schema().clone();
            let handle = storage::open_for_write(&self.path, schema, self.options.row_group_size)
                .context(StorageSnafu)?;
            self.handle = Some(handle);
        }
        Ok(true)
    }

    /// Append a positional row.
    pub fn append_row<V: ExternalValue>(&mut self, row: &[V]) -> TableResult<()> {
        self.ensure_writable()?;
        self.marshaller.append_row(row).context(RowSnafu)
    }

    /// Append a name-keyed row.
    pub fn append_record<K, V, I>(&mut self, record: I) -> TableResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ExternalValue,
    {
        self.ensure_writable()?;
        self.marshaller.append_record(record).context(RowSnafu)
    }

    /// Append a JSON array (positional) or object (name-keyed) row.
    pub fn append_json(&mut self, row: &serde_json::Value) -> TableResult<()> {
        self.ensure_writable()?;
        self.marshaller.append_json(row).context(RowSnafu)
    }

    /// Set the maximum rows per row group for the table written at close.
    pub fn set_row_group_size(&mut self, size: usize) -> TableResult<()> {
        ensure!(size > 0, InvalidRowGroupSizeSnafu { size });
        self.options.row_group_size = size;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_row_group_size(size);
        }
        Ok(())
    }

    /// Finish the columns, write the table and close the file.
    ///
    /// Closing a closed writer is a no-op. The builders are sealed even when
    /// the write itself fails, so a failed close cannot be retried: the
    /// failing call returns the underlying error and every later call
    /// returns [`CloseFailed`](crate::table::TableError::CloseFailed).
    pub fn close(&mut self) -> TableResult<()> {
        if self.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        self.ensure_writable()?;
        let handle = self.handle.take().context(NotOpenSnafu {
            path: self.path_string(),
        })?;

        let rows = self.marshaller.row_count();
        let written = self
            .marshaller
            .finish()
            .context(FinishSnafu)
            .and_then(|columns| handle.write_table(columns, rows).context(StorageSnafu));
        if written.is_err() {
            self.lifecycle = Lifecycle::Failed;
            return written;
        }

        self.lifecycle = Lifecycle::Closed;
        info!("wrote {} rows to {}", rows, self.path.display());
        Ok(())
    }
}

impl Drop for ParquetWriter {
    fn drop(&mut self) {
        if self.has_unwritten_rows() {
            warn!(
                "{} dropped without a successful close; {} buffered rows were not written",
                self.path.display(),
                self.marshaller.row_count()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        metadata::{ColumnDeclaration, TypeId},
        table::TableError,
        value::Value,
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn declaration() -> SchemaDeclaration {
        SchemaDeclaration::new()
            .column("id", ColumnDeclaration::new(TypeId::Int32))
            .column("name", ColumnDeclaration::new(TypeId::Utf8))
    }

    #[test]
    fn close_before_open_is_an_error() -> TestResult {
        let tmp = TempDir::new()?;
        let mut writer = ParquetWriter::new(&declaration(), tmp.path().join("t.parquet"))?;
        writer.append_row(&[Value::Int(1), Value::from("a")])?;
        assert!(matches!(writer.close(), Err(TableError::NotOpen { .. })));
        assert!(!writer.is_closed());
        Ok(())
    }

    #[test]
    fn second_close_is_a_no_op() -> TestResult {
        let tmp = TempDir::new()?;
        let mut writer = ParquetWriter::create(&declaration(), tmp.path().join("t.parquet"))?;
        writer.append_json(&json!([1, "a"]))?;
        writer.close()?;
        writer.close()?;
        assert!(writer.is_closed());
        assert!(matches!(
            writer.append_row(&[Value::Int(2), Value::from("b")]),
            Err(TableError::Closed { .. })
        ));
        assert!(matches!(writer.open(), Err(TableError::Closed { .. })));
        Ok(())
    }

    #[test]
    fn rows_buffered_before_open_count_as_unwritten() -> TestResult {
        let tmp = TempDir::new()?;
        let mut writer = ParquetWriter::new(&declaration(), tmp.path().join("t.parquet"))?;
        assert!(!writer.has_unwritten_rows());

        writer.append_json(&json!([1, "a"]))?;
        assert!(!writer.is_open());
        assert!(writer.has_unwritten_rows());

        writer.open()?;
        writer.close()?;
        assert!(!writer.has_unwritten_rows());
        Ok(())
    }

    #[test]
    fn row_group_size_must_be_positive() -> TestResult {
        let tmp = TempDir::new()?;
        let mut writer = ParquetWriter::new(&declaration(), tmp.path().join("t.parquet"))?;
        assert!(matches!(
            writer.set_row_group_size(0),
            Err(TableError::InvalidRowGroupSize { size: 0 })
        ));
        writer.set_row_group_size(2)?;
        assert_eq!(writer.options().row_group_size, 2);
        Ok(())
    }

    #[test]
    fn invalid_declarations_surface_as_schema_errors() {
        let decl = SchemaDeclaration::new()
            .column("a", ColumnDeclaration::new(TypeId::FixedSizeBinary));
        assert!(matches!(
            ParquetWriter::new(&decl, "unused.parquet"),
            Err(TableError::Schema { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_close_is_never_reported_as_success() -> TestResult {
        let mut writer = ParquetWriter::create(&declaration(), "/dev/full")?;
        writer.append_json(&json!([1, "a"]))?;

        assert!(matches!(writer.close(), Err(TableError::Storage { .. })));
        assert!(!writer.is_closed());
        assert!(writer.is_failed());
        assert!(!writer.is_open());

        assert!(writer.has_unwritten_rows());
        assert!(matches!(writer.close(), Err(TableError::CloseFailed { .. })));
        assert!(matches!(
            writer.append_json(&json!([2, "b"])),
            Err(TableError::CloseFailed { .. })
        ));
        assert!(matches!(writer.open(), Err(TableError::CloseFailed { .. })));
        Ok(())
    }

    #[test]
    fn unwritable_paths_fail_at_open() -> TestResult {
        let tmp = TempDir::new()?;
        let mut writer =
            ParquetWriter::new(&declaration(), tmp.path().join("missing").join("t.parquet"))?;
        assert!(matches!(writer.open(), Err(TableError::Storage { .. })));
        assert!(!writer.is_open());
        Ok(())
    }
}
