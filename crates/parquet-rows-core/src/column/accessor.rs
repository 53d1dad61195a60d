//! Read-side column access over a sequence of physical chunks.
//!
//! A column arrives from the storage layer as an ordered list of Arrow
//! arrays (one per decoded batch). [`locate`] maps a logical row onto
//! `(chunk, local index)` with a running offset; [`decode`] reads the value
//! at that position straight from the chunk's buffers:
//! - booleans are one bit per row, LSB first within each byte;
//! - fixed-width numerics and temporals are a flat native array;
//! - strings and binaries are an `i32` offsets array over a data buffer.
//!
//! Nothing is copied out of a chunk except the decoded value itself.
use arrow::{
    array::{Array, ArrayRef, AsArray},
    buffer::BooleanBuffer,
    datatypes::{
        DataType, Date32Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
        Time32MillisecondType, Time64MicrosecondType, Time64NanosecondType, TimeUnit,
        TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType, UInt8Type,
        UInt16Type, UInt32Type, UInt64Type,
    },
};

use crate::{
    column::error::{DecodeError, RowOutOfRangeSnafu, UnsupportedTypeSnafu},
    metadata::LogicalType,
    value::Value,
};

/// Position of a logical row inside a chunk sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPosition {
    /// Index of the owning chunk.
    pub chunk: usize,
    /// Row index local to that chunk.
    pub index: usize,
}

/// Find the chunk owning logical `row`, given chunk lengths in order.
///
/// Empty chunks are skipped. Returns `None` when `row` is past the end.
pub fn locate<I>(lengths: I, row: usize) -> Option<ChunkPosition>
where
    I: IntoIterator<Item = usize>,
{
    let mut base = 0usize;
    for (chunk, len) in lengths.into_iter().enumerate() {
        if row >= base && row < base + len {
            return Some(ChunkPosition {
                chunk,
                index: row - base,
            });
        }
        base += len;
    }
    None
}

/// Decode logical `row` of a chunked column, failing on out-of-range rows
/// and stored types without a decoder.
pub fn try_value_at(chunks: &[ArrayRef], row: usize) -> Result<Value, DecodeError> {
    match locate(chunks.iter().map(|c| c.len()), row) {
        Some(pos) => decode(chunks[pos.chunk].as_ref(), pos.index),
        None => RowOutOfRangeSnafu {
            row,
            len: chunks.iter().map(|c| c.len()).sum::<usize>(),
        }
        .fail(),
    }
}

/// Decode logical `row` of a chunked column, yielding [`Value::Null`]
/// wherever [`try_value_at`] would fail.
pub fn value_at(chunks: &[ArrayRef], row: usize) -> Value {
    try_value_at(chunks, row).unwrap_or(Value::Null)
}

fn bit_at(bits: &BooleanBuffer, index: usize) -> bool {
    let i = bits.offset() + index;
    (bits.values()[i / 8] >> (i % 8)) & 1 == 1
}

fn span_at<'a>(offsets: &[i32], data: &'a [u8], index: usize) -> &'a [u8] {
    let start = offsets[index] as usize;
    let end = offsets[index + 1] as usize;
    &data[start..end]
}

macro_rules! native_at {
    ($array:expr, $ty:ty, $index:expr) => {
        $array.as_primitive::<$ty>().values()[$index]
    };
}

/// Decode the value at `index` of a single chunk.
///
/// `index` must be inside the chunk.
pub fn decode(array: &dyn Array, index: usize) -> Result<Value, DecodeError> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Boolean => Value::Bool(bit_at(array.as_boolean().values(), index)),

        DataType::UInt8 => Value::Int(native_at!(array, UInt8Type, index).into()),
        DataType::Int8 => Value::Int(native_at!(array, Int8Type, index).into()),
        DataType::UInt16 => Value::Int(native_at!(array, UInt16Type, index).into()),
        DataType::Int16 => Value::Int(native_at!(array, Int16Type, index).into()),
        DataType::UInt32 => Value::Int(native_at!(array, UInt32Type, index).into()),
        DataType::Int32 => Value::Int(native_at!(array, Int32Type, index).into()),
        DataType::Date32 => Value::Int(native_at!(array, Date32Type, index).into()),
        DataType::Time32(TimeUnit::Millisecond) => {
            Value::Int(native_at!(array, Time32MillisecondType, index).into())
        }

        DataType::UInt64 => Value::integer(native_at!(array, UInt64Type, index)),
        DataType::Int64 => Value::integer(native_at!(array, Int64Type, index)),
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            Value::integer(native_at!(array, TimestampMillisecondType, index))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            Value::integer(native_at!(array, TimestampMicrosecondType, index))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            Value::integer(native_at!(array, TimestampNanosecondType, index))
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            Value::integer(native_at!(array, Time64MicrosecondType, index))
        }
        DataType::Time64(TimeUnit::Nanosecond) => {
            Value::integer(native_at!(array, Time64NanosecondType, index))
        }

        DataType::Float32 => Value::Float(native_at!(array, Float32Type, index).into()),
        DataType::Float64 => Value::Float(native_at!(array, Float64Type, index)),

        DataType::Utf8 => {
            let strings = array.as_string::<i32>();
            let bytes = span_at(strings.value_offsets(), strings.values(), index);
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        DataType::Binary => {
            let binary = array.as_binary::<i32>();
            Value::Bytes(span_at(binary.value_offsets(), binary.values(), index).to_vec())
        }
        DataType::FixedSizeBinary(_) => {
            Value::Bytes(array.as_fixed_size_binary().value(index).to_vec())
        }

        other => {
            return UnsupportedTypeSnafu {
                data_type: other.clone(),
            }
            .fail();
        }
    };
    Ok(value)
}

/// How decode failures are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Out-of-range rows and undecodable stored types read as null.
    #[default]
    Permissive,
    /// Decode failures are returned as [`DecodeError`].
    Strict,
}

/// One column of an opened file: its name, stored type and chunks.
#[derive(Debug, Clone)]
pub struct ChunkedColumn {
    name: String,
    data_type: DataType,
    chunks: Vec<ArrayRef>,
    len: usize,
}

impl ChunkedColumn {
    /// Wrap a column's chunks. Chunks share buffers with the storage layer.
    pub fn new(name: impl Into<String>, data_type: DataType, chunks: Vec<ArrayRef>) -> Self {
        let len = chunks.iter().map(|c| c.len()).sum();
        ChunkedColumn {
            name: name.into(),
            data_type,
            chunks,
            len,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored Arrow type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Stored type mapped into the closed set, if it is part of it.
    pub fn logical_type(&self) -> Option<LogicalType> {
        LogicalType::from_arrow(&self.data_type)
    }

    /// Physical chunks in order.
    pub fn chunks(&self) -> &[ArrayRef] {
        &self.chunks
    }

    /// Total rows across chunks.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Chunk and local index of logical `row`.
    pub fn locate(&self, row: usize) -> Option<ChunkPosition> {
        locate(self.chunks.iter().map(|c| c.len()), row)
    }

    /// Strict decode of logical `row`.
    pub fn try_value_at(&self, row: usize) -> Result<Value, DecodeError> {
        try_value_at(&self.chunks, row)
    }

    /// Permissive decode of logical `row`.
    pub fn value_at(&self, row: usize) -> Value {
        value_at(&self.chunks, row)
    }

    /// Decode logical `row` under `mode`.
    pub fn read(&self, row: usize, mode: DecodeMode) -> Result<Value, DecodeError> {
        match mode {
            DecodeMode::Permissive => Ok(self.value_at(row)),
            DecodeMode::Strict => self.try_value_at(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{
            BinaryArray, BooleanArray, Decimal128Array, FixedSizeBinaryArray, Int32Array,
            Int64Array, StringArray, TimestampMillisecondArray, UInt64Array,
        },
        buffer::{Buffer, OffsetBuffer, ScalarBuffer},
    };

    use super::*;

    #[test]
    fn locate_walks_running_offsets() {
        assert_eq!(
            locate([3, 5], 6),
            Some(ChunkPosition { chunk: 1, index: 3 })
        );
        assert_eq!(
            locate([3, 5], 0),
            Some(ChunkPosition { chunk: 0, index: 0 })
        );
        assert_eq!(
            locate([3, 5], 3),
            Some(ChunkPosition { chunk: 1, index: 0 })
        );
        assert_eq!(locate([3, 5], 8), None);
        assert_eq!(
            locate([0, 2, 0, 1], 2),
            Some(ChunkPosition { chunk: 3, index: 0 })
        );
        assert_eq!(locate(Vec::<usize>::new(), 0), None);
    }

    #[test]
    fn boolean_bits_are_lsb_first() {
        let bits = BooleanBuffer::new(Buffer::from_vec(vec![0b0000_0101u8, 0b0000_0001]), 0, 10);
        let chunk: ArrayRef = Arc::new(BooleanArray::new(bits, None));
        let chunks = [chunk];

        assert_eq!(value_at(&chunks, 0), Value::Bool(true));
        assert_eq!(value_at(&chunks, 1), Value::Bool(false));
        assert_eq!(value_at(&chunks, 2), Value::Bool(true));
        assert_eq!(value_at(&chunks, 8), Value::Bool(true));
        assert_eq!(value_at(&chunks, 9), Value::Bool(false));
    }

    #[test]
    fn boolean_respects_slice_offset() {
        let bits = BooleanBuffer::new(Buffer::from_vec(vec![0b0000_0101u8, 0b0000_0001]), 0, 10);
        let sliced = BooleanArray::new(bits, None).slice(2, 7);
        assert_eq!(decode(&sliced, 0).unwrap(), Value::Bool(true));
        assert_eq!(decode(&sliced, 1).unwrap(), Value::Bool(false));
        assert_eq!(decode(&sliced, 6).unwrap(), Value::Bool(true));
    }

    #[test]
    fn strings_follow_offsets() {
        let offsets = OffsetBuffer::new(ScalarBuffer::from(vec![0i32, 3, 3, 7]));
        let data = Buffer::from_vec(b"fooquux".to_vec());
        let chunk: ArrayRef = Arc::new(StringArray::new(offsets, data, None));
        let chunks = [chunk];

        assert_eq!(value_at(&chunks, 0), Value::String("foo".into()));
        assert_eq!(value_at(&chunks, 1), Value::String(String::new()));
        assert_eq!(value_at(&chunks, 2), Value::String("quux".into()));
    }

    #[test]
    fn binaries_decode_to_bytes() {
        let variable = BinaryArray::from(vec![&b"ab"[..], &b""[..], &b"\x00\xff"[..]]);
        assert_eq!(decode(&variable, 2).unwrap(), Value::Bytes(vec![0, 255]));
        assert_eq!(decode(&variable, 1).unwrap(), Value::Bytes(vec![]));

        let fixed =
            FixedSizeBinaryArray::try_from_iter(vec![vec![1u8, 2, 3, 4], vec![5, 6, 7, 8]].into_iter())
                .unwrap();
        assert_eq!(decode(&fixed, 1).unwrap(), Value::Bytes(vec![5, 6, 7, 8]));
    }

    #[test]
    fn values_span_multiple_chunks() {
        let first: ArrayRef = Arc::new(Int32Array::from(vec![10, 11, 12]));
        let second: ArrayRef = Arc::new(Int32Array::from(vec![20, 21, 22, 23, 24]));
        let column = ChunkedColumn::new("n", DataType::Int32, vec![first, second]);

        assert_eq!(column.len(), 8);
        assert_eq!(column.locate(6), Some(ChunkPosition { chunk: 1, index: 3 }));
        assert_eq!(column.value_at(6), Value::Int(23));
        assert_eq!(column.value_at(2), Value::Int(12));
        assert_eq!(column.logical_type(), Some(LogicalType::Int32));
    }

    #[test]
    fn out_of_range_rows_are_null_or_errors() {
        let chunk: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let chunks = [chunk];
        assert_eq!(value_at(&chunks, 2), Value::Null);
        assert_eq!(
            try_value_at(&chunks, 2).unwrap_err(),
            DecodeError::RowOutOfRange { row: 2, len: 2 }
        );
    }

    #[test]
    fn null_slots_decode_to_null() {
        let chunk: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), None, Some(3)]));
        assert_eq!(value_at(&[chunk], 1), Value::Null);
    }

    #[test]
    fn unsupported_stored_types_are_null_unless_strict() {
        let chunk: ArrayRef = Arc::new(Decimal128Array::from(vec![1_i128]));
        let chunks = [chunk];
        assert_eq!(value_at(&chunks, 0), Value::Null);
        assert!(matches!(
            try_value_at(&chunks, 0),
            Err(DecodeError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn sixty_four_bit_values_switch_to_big_int_past_the_safe_range() {
        let chunk: ArrayRef = Arc::new(Int64Array::from(vec![
            9_007_199_254_740_991,
            9_007_199_254_740_992,
            -9_007_199_254_740_991,
            -9_007_199_254_740_992,
        ]));
        let chunks = [chunk];
        assert_eq!(value_at(&chunks, 0), Value::Int(9_007_199_254_740_991));
        assert_eq!(value_at(&chunks, 1), Value::BigInt(9_007_199_254_740_992));
        assert_eq!(value_at(&chunks, 2), Value::Int(-9_007_199_254_740_991));
        assert_eq!(value_at(&chunks, 3), Value::BigInt(-9_007_199_254_740_992));

        let unsigned: ArrayRef = Arc::new(UInt64Array::from(vec![u64::MAX]));
        assert_eq!(
            value_at(&[unsigned], 0),
            Value::BigInt(i128::from(u64::MAX))
        );

        let ts: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![1_700_000_000_000]));
        assert_eq!(value_at(&[ts], 0), Value::Int(1_700_000_000_000));
    }
}
