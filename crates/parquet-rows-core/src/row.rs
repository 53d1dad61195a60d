//! Row marshalling between the row view and the column view.
//!
//! Reading assembles one [`Row`] from a decode per column; the same decoded
//! values back both the positional and the name-keyed representation.
//!
//! Writing goes through a [`RowMarshaller`], which owns one
//! [`ColumnBuilder`] per schema column. A row is coerced in full before any
//! builder is touched, so a rejected row leaves every column at the same
//! length.
use std::sync::Arc;

use arrow::array::ArrayRef;
use snafu::prelude::*;

use crate::{
    column::{AppendError, ChunkedColumn, ColumnBuilder, DecodeError, DecodeMode, Scalar},
    metadata::TableSchema,
    value::{ExternalValue, Value},
};

/// Errors raised while appending a row.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RowError {
    /// The positional row does not have one value per column.
    #[snafu(display("Row has {actual} values but the schema has {expected} columns"))]
    ArityMismatch {
        /// Schema column count.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },

    /// A mapping row names a column the schema does not have.
    #[snafu(display("Unknown column: {name}"))]
    UnknownColumn {
        /// The unrecognised key.
        name: String,
    },

    /// A JSON row was neither an array nor an object.
    #[snafu(display("A row must be an array or an object, got {found}"))]
    InvalidRow {
        /// JSON kind that was supplied.
        found: String,
    },

    /// A column rejected its value.
    #[snafu(display("{source}"))]
    Append {
        /// Column-level failure.
        source: AppendError,
    },
}

/// One decoded row, with the column names it was read under.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    names: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Pair decoded values with their column names.
    ///
    /// `names` and `values` must have the same length.
    pub fn new(names: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Row { names, values }
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Positional representation.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at column position `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the column called `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n == name)?;
        self.values.get(index)
    }

    /// `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Name-keyed representation as a JSON object in column order.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Decode logical `row` of every column in order.
///
/// Under [`DecodeMode::Permissive`] this never fails: out-of-range rows and
/// undecodable stored types come back as [`Value::Null`].
pub fn read_row(
    names: &Arc<[String]>,
    columns: &[ChunkedColumn],
    row: usize,
    mode: DecodeMode,
) -> Result<Row, DecodeError> {
    let values = columns
        .iter()
        .map(|column| column.read(row, mode))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(Arc::clone(names), values))
}

/// Owns the column builders of a table being written.
#[derive(Debug)]
pub struct RowMarshaller {
    schema: TableSchema,
    builders: Vec<ColumnBuilder>,
    rows: usize,
}

impl RowMarshaller {
    /// One open builder per schema column.
    pub fn new(schema: TableSchema) -> Self {
        let builders = schema
            .columns()
            .iter()
            .map(|c| ColumnBuilder::new(c.name(), c.logical_type()))
            .collect();
        RowMarshaller {
            schema,
            builders,
            rows: 0,
        }
    }

    /// Schema rows are appended against.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Rows appended so far.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Per-column builders, in schema order.
    pub fn builders(&self) -> &[ColumnBuilder] {
        &self.builders
    }

    /// Append a positional row: one value per column, in schema order.
    pub fn append_row<V: ExternalValue>(&mut self, row: &[V]) -> Result<(), RowError> {
        ensure!(
            row.len() == self.builders.len(),
            ArityMismatchSnafu {
                expected: self.builders.len(),
                actual: row.len(),
            }
        );
        let scalars = self
            .builders
            .iter()
            .zip(row)
            .map(|(builder, value)| builder.coerce(value))
            .collect::<Result<Vec<_>, _>>()
            .context(AppendSnafu)?;
        self.push(scalars)
    }

    /// Append a name-keyed row. Columns without a key are appended as null;
    /// a key outside the schema rejects the row.
    pub fn append_record<K, V, I>(&mut self, record: I) -> Result<(), RowError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ExternalValue,
    {
        let mut slots: Vec<Option<V>> = std::iter::repeat_with(|| None)
            .take(self.builders.len())
            .collect();
        for (key, value) in record {
            let key = key.as_ref();
            let index = self
                .schema
                .index_of(key)
                .context(UnknownColumnSnafu { name: key })?;
            slots[index] = Some(value);
        }

        let scalars = self
            .builders
            .iter()
            .zip(&slots)
            .map(|(builder, slot)| match slot {
                Some(value) => builder.coerce(value),
                None => builder.coerce(&Value::Null),
            })
            .collect::<Result<Vec<_>, _>>()
            .context(AppendSnafu)?;
        self.push(scalars)
    }

    /// Append a JSON row: an array is positional, an object is name-keyed.
    pub fn append_json(&mut self, row: &serde_json::Value) -> Result<(), RowError> {
        match row {
            serde_json::Value::Array(values) => self.append_row(values.as_slice()),
            serde_json::Value::Object(map) => self.append_record(map),
            other => InvalidRowSnafu {
                found: json_kind(other),
            }
            .fail(),
        }
    }

    fn push(&mut self, scalars: Vec<Scalar>) -> Result<(), RowError> {
        for (builder, scalar) in self.builders.iter_mut().zip(scalars) {
            builder.push(scalar).context(AppendSnafu)?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Seal every builder and return the finished chunks in schema order.
    pub fn finish(&mut self) -> Result<Vec<ArrayRef>, AppendError> {
        self.builders.iter_mut().map(ColumnBuilder::finish).collect()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
