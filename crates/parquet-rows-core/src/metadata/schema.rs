//! Column declarations and the finished table schema.
//!
//! A [`SchemaBuilder`] collects `(name, type, parameters)` declarations in
//! final column order and turns them into an immutable [`TableSchema`],
//! which also carries the Arrow schema handed to the storage layer.
//! [`SchemaDeclaration`] is the caller-facing form (an ordered mapping of
//! column name to `{type, width?, unit?}`), deserializable from JSON.
use std::{collections::HashSet, sync::Arc};

use arrow::datatypes::{Field, Schema, SchemaRef};
use serde::Deserialize;
use snafu::prelude::*;

use crate::metadata::logical_type::{
    LogicalType, TimeUnit, TypeId, TypeParameters, TypeRegistryError, logical_type_of,
};

/// Errors raised while declaring a schema.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    /// A column name was declared twice.
    #[snafu(display("Duplicate column name: {name}"))]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// The type identifier is outside the supported set.
    #[snafu(display("Unsupported type for column '{column}': {source}"))]
    UnsupportedType {
        /// Column being declared.
        column: String,
        /// Registry error describing the identifier.
        source: TypeRegistryError,
    },

    /// A required type parameter is missing or out of range.
    #[snafu(display("Invalid type parameters for column '{column}': {source}"))]
    InvalidParameters {
        /// Column being declared.
        column: String,
        /// Registry error describing the parameter problem.
        source: TypeRegistryError,
    },

    /// `build` was called before any column was declared.
    #[snafu(display("Schema must declare at least one column"))]
    EmptySchema,

    /// The declaration document is not an object of column objects.
    #[snafu(display("Invalid schema declaration: {detail}"))]
    InvalidDeclaration {
        /// What was wrong with the document.
        detail: String,
    },

    /// The declaration document is not valid JSON.
    #[snafu(display("Schema declaration is not valid JSON: {source}"))]
    MalformedJson {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A column entry in the declaration document could not be parsed.
    #[snafu(display("Invalid declaration for column '{column}': {source}"))]
    MalformedColumn {
        /// Column whose entry is malformed.
        column: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

fn classify(column: &str, source: TypeRegistryError) -> SchemaError {
    let column = column.to_string();
    match source {
        TypeRegistryError::UnsupportedTypeId { .. } => {
            SchemaError::UnsupportedType { column, source }
        }
        _ => SchemaError::InvalidParameters { column, source },
    }
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    name: String,
    logical_type: LogicalType,
}

impl ColumnSchema {
    /// Column name, unique within its schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }
}

/// Finished, immutable table schema.
///
/// Column order defines both the positional layout of rows and the physical
/// column index in the file.
#[derive(Debug, Clone)]
pub struct TableSchema {
    columns: Vec<ColumnSchema>,
    arrow: SchemaRef,
}

impl TableSchema {
    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns (never true for a built schema).
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of the column called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Arrow schema consumed by the storage layer. All fields are nullable.
    pub fn arrow_schema(&self) -> &SchemaRef {
        &self.arrow
    }
}

impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

/// Accumulates column declarations in order.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<ColumnSchema>,
    seen: HashSet<String>,
}

impl SchemaBuilder {
    /// Start an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the next column from a type identifier and its parameters.
    pub fn declare_column(
        &mut self,
        name: impl Into<String>,
        type_id: TypeId,
        params: &TypeParameters,
    ) -> Result<&mut Self, SchemaError> {
        let name = name.into();
        let logical_type = logical_type_of(type_id, params).map_err(|e| classify(&name, e))?;
        self.push(name, logical_type)
    }

    /// Declare the next column from an already-constructed type.
    ///
    /// The type is re-validated, so a `FixedSizeBinary(0)` or a `Time32`
    /// with a nanosecond unit is still rejected.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        logical_type: LogicalType,
    ) -> Result<&mut Self, SchemaError> {
        let params = match logical_type {
            LogicalType::FixedSizeBinary(width) => TypeParameters::width(i64::from(width)),
            LogicalType::Timestamp(unit) | LogicalType::Time32(unit) | LogicalType::Time64(unit) => {
                TypeParameters::unit(unit)
            }
            _ => TypeParameters::default(),
        };
        self.declare_column(name, logical_type.type_id(), &params)
    }

    fn push(&mut self, name: String, logical_type: LogicalType) -> Result<&mut Self, SchemaError> {
        ensure!(
            self.seen.insert(name.clone()),
            DuplicateNameSnafu { name }
        );
        self.columns.push(ColumnSchema { name, logical_type });
        Ok(self)
    }

    /// Finish the schema. No columns can be declared afterwards.
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        ensure!(!self.columns.is_empty(), EmptySchemaSnafu);

        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name.clone(), c.logical_type.to_arrow(), true))
            .collect();

        Ok(TableSchema {
            columns: self.columns,
            arrow: Arc::new(Schema::new(fields)),
        })
    }
}

/// A type identifier given either by name or by Arrow type code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    /// Numeric Arrow type code, e.g. `9` for INT64.
    Code(i64),
    /// Type name, e.g. `"INT64"` or `"UTF8"`.
    Name(String),
}

impl TypeRef {
    fn resolve(&self) -> Result<TypeId, TypeRegistryError> {
        match self {
            TypeRef::Code(code) => TypeId::from_code(*code),
            TypeRef::Name(name) => name.parse(),
        }
    }
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        TypeRef::Code(id.code())
    }
}

/// A time unit given either by name or by Arrow time unit code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnitRef {
    /// Numeric Arrow time unit code (1 = milli, 2 = micro, 3 = nano).
    Code(i64),
    /// Unit name, e.g. `"MILLI"`.
    Name(String),
}

impl UnitRef {
    fn resolve(&self) -> Result<TimeUnit, TypeRegistryError> {
        match self {
            UnitRef::Code(code) => TimeUnit::from_code(*code),
            UnitRef::Name(name) => name.parse(),
        }
    }
}

impl From<TimeUnit> for UnitRef {
    fn from(unit: TimeUnit) -> Self {
        UnitRef::Code(unit.code())
    }
}

/// `{type, width?, unit?}` entry of a schema declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnDeclaration {
    /// Type identifier.
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// Byte width for fixed-size binary columns.
    #[serde(default)]
    pub width: Option<i64>,
    /// Time unit for timestamp/time columns.
    #[serde(default)]
    pub unit: Option<UnitRef>,
}

impl ColumnDeclaration {
    /// Declaration of a column with no type parameters.
    pub fn new(type_id: TypeId) -> Self {
        ColumnDeclaration {
            type_ref: type_id.into(),
            width: None,
            unit: None,
        }
    }

    /// Attach a byte width.
    pub fn with_width(mut self, width: i64) -> Self {
        self.width = Some(width);
        self
    }

    /// Attach a time unit.
    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Ordered mapping of column name to column declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDeclaration {
    columns: Vec<(String, ColumnDeclaration)>,
}

impl SchemaDeclaration {
    /// Empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column declaration.
    pub fn column(mut self, name: impl Into<String>, decl: ColumnDeclaration) -> Self {
        self.columns.push((name.into(), decl));
        self
    }

    /// Declared entries in order.
    pub fn entries(&self) -> &[(String, ColumnDeclaration)] {
        &self.columns
    }

    /// Parse a JSON object such as
    /// `{"id": {"type": "INT64"}, "ts": {"type": "TIMESTAMP", "unit": "MILLI"}}`.
    ///
    /// Key order is preserved and becomes column order.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let value: serde_json::Value = serde_json::from_str(text).context(MalformedJsonSnafu)?;
        Self::from_json(&value)
    }

    /// Build a declaration from an already-parsed JSON object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SchemaError> {
        let object = value.as_object().context(InvalidDeclarationSnafu {
            detail: "expected an object mapping column names to declarations",
        })?;

        let mut columns = Vec::with_capacity(object.len());
        for (name, entry) in object {
            let decl = ColumnDeclaration::deserialize(entry)
                .context(MalformedColumnSnafu { column: name })?;
            columns.push((name.clone(), decl));
        }
        Ok(SchemaDeclaration { columns })
    }

    /// Resolve every entry and finish the schema.
    pub fn build(&self) -> Result<TableSchema, SchemaError> {
        let mut builder = SchemaBuilder::new();
        for (name, decl) in &self.columns {
            let type_id = decl.type_ref.resolve().map_err(|e| classify(name, e))?;
            let unit = decl
                .unit
                .as_ref()
                .map(UnitRef::resolve)
                .transpose()
                .map_err(|e| classify(name, e))?;
            let params = TypeParameters {
                width: decl.width,
                unit,
            };
            builder.declare_column(name.clone(), type_id, &params)?;
        }
        builder.build()
    }
}
