//! Per-column read and write paths.
//!
//! - [`accessor`]: locating and decoding a logical row across chunks.
//! - [`builder`]: coercing host values and accumulating a column.
pub mod accessor;
pub mod builder;
pub mod error;

pub use accessor::{
    ChunkPosition, ChunkedColumn, DecodeMode, decode, locate, try_value_at, value_at,
};
pub use builder::{ColumnBuilder, Scalar};
pub use error::{AppendError, DecodeError};
