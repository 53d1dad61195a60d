//! Type registry and schema declaration.
//!
//! - [`logical_type`]: the closed set of column types and their mapping to
//!   Arrow storage types.
//! - [`schema`]: ordered column declarations and the finished table schema.
pub mod logical_type;
pub mod schema;

pub use logical_type::{
    LogicalType, TimeUnit, TypeId, TypeParameters, TypeRegistryError, logical_type_of,
};
pub use schema::{
    ColumnDeclaration, ColumnSchema, SchemaBuilder, SchemaDeclaration, SchemaError, TableSchema,
    TypeRef, UnitRef,
};
