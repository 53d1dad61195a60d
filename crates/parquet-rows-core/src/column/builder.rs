//! Write-side column accumulation.
//!
//! A [`ColumnBuilder`] owns one Arrow builder chosen by the column's declared
//! [`LogicalType`]. Incoming host values are coerced against the declared
//! type, never against their own runtime shape, and appended. `finish` seals
//! the builder and hands back the finished chunk.
//!
//! Coercion ([`ColumnBuilder::coerce`]) and accumulation
//! ([`ColumnBuilder::push`]) are separate steps so a row can be fully
//! validated before any column is touched.
use std::sync::Arc;

use arrow::array::{
    ArrayBuilder, ArrayRef, BinaryBuilder, BooleanBuilder, Date32Builder, FixedSizeBinaryBuilder,
    Float32Builder, Float64Builder, Int8Builder, Int16Builder, Int32Builder, Int64Builder,
    StringBuilder, Time32MillisecondBuilder, Time64MicrosecondBuilder, Time64NanosecondBuilder,
    TimestampMicrosecondBuilder, TimestampMillisecondBuilder, TimestampNanosecondBuilder,
    UInt8Builder, UInt16Builder, UInt32Builder, UInt64Builder,
};
use chrono::{DateTime, Utc};
use snafu::prelude::*;

use crate::{
    column::error::{
        AppendError, ArrowSnafu, SealedSnafu, SizeMismatchSnafu, TypeMismatchSnafu,
        UnexpectedScalarSnafu,
    },
    metadata::{LogicalType, TimeUnit},
    value::ExternalValue,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// A host value already coerced to a column's native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Null slot.
    Null,
    /// Boolean.
    Bool(bool),
    /// `UInt8`.
    UInt8(u8),
    /// `Int8`.
    Int8(i8),
    /// `UInt16`.
    UInt16(u16),
    /// `Int16`.
    Int16(i16),
    /// `UInt32`.
    UInt32(u32),
    /// `Int32`, `Date32` and `Time32`.
    Int32(i32),
    /// `UInt64`.
    UInt64(u64),
    /// `Int64`, `Timestamp` and `Time64`.
    Int64(i64),
    /// `Float32`.
    Float32(f32),
    /// `Float64`.
    Float64(f64),
    /// UTF-8 text.
    Text(String),
    /// Variable or fixed-size bytes.
    Bytes(Vec<u8>),
}

#[derive(Debug)]
enum Accumulator {
    Bool(BooleanBuilder),
    UInt8(UInt8Builder),
    Int8(Int8Builder),
    UInt16(UInt16Builder),
    Int16(Int16Builder),
    UInt32(UInt32Builder),
    Int32(Int32Builder),
    UInt64(UInt64Builder),
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
    Binary(BinaryBuilder),
    FixedSizeBinary(FixedSizeBinaryBuilder),
    Date32(Date32Builder),
    TimestampMilli(TimestampMillisecondBuilder),
    TimestampMicro(TimestampMicrosecondBuilder),
    TimestampNano(TimestampNanosecondBuilder),
    Time32Milli(Time32MillisecondBuilder),
    Time64Micro(Time64MicrosecondBuilder),
    Time64Nano(Time64NanosecondBuilder),
}

/// Run `$body` with `$b` bound to whichever Arrow builder is inside.
macro_rules! with_builder {
    ($acc:expr, $b:ident => $body:expr) => {
        match $acc {
            Accumulator::Bool($b) => $body,
            Accumulator::UInt8($b) => $body,
            Accumulator::Int8($b) => $body,
            Accumulator::UInt16($b) => $body,
            Accumulator::Int16($b) => $body,
            Accumulator::UInt32($b) => $body,
            Accumulator::Int32($b) => $body,
            Accumulator::UInt64($b) => $body,
            Accumulator::Int64($b) => $body,
            Accumulator::Float32($b) => $body,
            Accumulator::Float64($b) => $body,
            Accumulator::Utf8($b) => $body,
            Accumulator::Binary($b) => $body,
            Accumulator::FixedSizeBinary($b) => $body,
            Accumulator::Date32($b) => $body,
            Accumulator::TimestampMilli($b) => $body,
            Accumulator::TimestampMicro($b) => $body,
            Accumulator::TimestampNano($b) => $body,
            Accumulator::Time32Milli($b) => $body,
            Accumulator::Time64Micro($b) => $body,
            Accumulator::Time64Nano($b) => $body,
        }
    };
}

impl Accumulator {
    fn for_type(logical_type: LogicalType) -> Self {
        match logical_type {
            LogicalType::Bool => Accumulator::Bool(BooleanBuilder::new()),
            LogicalType::UInt8 => Accumulator::UInt8(UInt8Builder::new()),
            LogicalType::Int8 => Accumulator::Int8(Int8Builder::new()),
            LogicalType::UInt16 => Accumulator::UInt16(UInt16Builder::new()),
            LogicalType::Int16 => Accumulator::Int16(Int16Builder::new()),
            LogicalType::UInt32 => Accumulator::UInt32(UInt32Builder::new()),
            LogicalType::Int32 => Accumulator::Int32(Int32Builder::new()),
            LogicalType::UInt64 => Accumulator::UInt64(UInt64Builder::new()),
            LogicalType::Int64 => Accumulator::Int64(Int64Builder::new()),
            LogicalType::Float32 => Accumulator::Float32(Float32Builder::new()),
            LogicalType::Float64 => Accumulator::Float64(Float64Builder::new()),
            LogicalType::Utf8String => Accumulator::Utf8(StringBuilder::new()),
            LogicalType::Binary => Accumulator::Binary(BinaryBuilder::new()),
            LogicalType::FixedSizeBinary(width) => {
                Accumulator::FixedSizeBinary(FixedSizeBinaryBuilder::new(width))
            }
            LogicalType::Date32 => Accumulator::Date32(Date32Builder::new()),
            LogicalType::Timestamp(TimeUnit::Milli) => {
                Accumulator::TimestampMilli(TimestampMillisecondBuilder::new())
            }
            LogicalType::Timestamp(TimeUnit::Micro) => {
                Accumulator::TimestampMicro(TimestampMicrosecondBuilder::new())
            }
            LogicalType::Timestamp(TimeUnit::Nano) => {
                Accumulator::TimestampNano(TimestampNanosecondBuilder::new())
            }
            // Schema validation admits only milliseconds for Time32.
            LogicalType::Time32(_) => Accumulator::Time32Milli(Time32MillisecondBuilder::new()),
            LogicalType::Time64(TimeUnit::Nano) => {
                Accumulator::Time64Nano(Time64NanosecondBuilder::new())
            }
            LogicalType::Time64(_) => Accumulator::Time64Micro(Time64MicrosecondBuilder::new()),
        }
    }

    fn len(&self) -> usize {
        with_builder!(self, b => b.len())
    }

    fn append_null(&mut self) {
        with_builder!(self, b => b.append_null())
    }

    fn finish(&mut self) -> ArrayRef {
        with_builder!(self, b => Arc::new(b.finish()) as ArrayRef)
    }

    /// Append a coerced scalar. Returns `Ok(false)` when the scalar does
    /// not belong to this accumulator.
    fn append(&mut self, scalar: Scalar) -> Result<bool, arrow::error::ArrowError> {
        match (self, scalar) {
            (acc, Scalar::Null) => acc.append_null(),
            (Accumulator::Bool(b), Scalar::Bool(v)) => b.append_value(v),
            (Accumulator::UInt8(b), Scalar::UInt8(v)) => b.append_value(v),
            (Accumulator::Int8(b), Scalar::Int8(v)) => b.append_value(v),
            (Accumulator::UInt16(b), Scalar::UInt16(v)) => b.append_value(v),
            (Accumulator::Int16(b), Scalar::Int16(v)) => b.append_value(v),
            (Accumulator::UInt32(b), Scalar::UInt32(v)) => b.append_value(v),
            (Accumulator::Int32(b), Scalar::Int32(v)) => b.append_value(v),
            (Accumulator::Date32(b), Scalar::Int32(v)) => b.append_value(v),
            (Accumulator::Time32Milli(b), Scalar::Int32(v)) => b.append_value(v),
            (Accumulator::UInt64(b), Scalar::UInt64(v)) => b.append_value(v),
            (Accumulator::Int64(b), Scalar::Int64(v)) => b.append_value(v),
            (Accumulator::TimestampMilli(b), Scalar::Int64(v)) => b.append_value(v),
            (Accumulator::TimestampMicro(b), Scalar::Int64(v)) => b.append_value(v),
            (Accumulator::TimestampNano(b), Scalar::Int64(v)) => b.append_value(v),
            (Accumulator::Time64Micro(b), Scalar::Int64(v)) => b.append_value(v),
            (Accumulator::Time64Nano(b), Scalar::Int64(v)) => b.append_value(v),
            (Accumulator::Float32(b), Scalar::Float32(v)) => b.append_value(v),
            (Accumulator::Float64(b), Scalar::Float64(v)) => b.append_value(v),
            (Accumulator::Utf8(b), Scalar::Text(v)) => b.append_value(v),
            (Accumulator::Binary(b), Scalar::Bytes(v)) => b.append_value(v),
            (Accumulator::FixedSizeBinary(b), Scalar::Bytes(v)) => b.append_value(v)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug)]
enum BuilderState {
    Open(Accumulator),
    Sealed,
}

/// Accumulates one column's values until `finish`.
#[derive(Debug)]
pub struct ColumnBuilder {
    name: String,
    logical_type: LogicalType,
    state: BuilderState,
}

impl ColumnBuilder {
    /// Create an open builder for a declared column.
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        ColumnBuilder {
            name: name.into(),
            logical_type,
            state: BuilderState::Open(Accumulator::for_type(logical_type)),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    /// Whether `finish` has been called.
    pub fn is_sealed(&self) -> bool {
        matches!(self.state, BuilderState::Sealed)
    }

    /// Values appended so far. Zero once sealed.
    pub fn len(&self) -> usize {
        match &self.state {
            BuilderState::Open(acc) => acc.len(),
            BuilderState::Sealed => 0,
        }
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coerce a host value to this column's native representation without
    /// appending it.
    pub fn coerce<V>(&self, value: &V) -> Result<Scalar, AppendError>
    where
        V: ExternalValue + ?Sized,
    {
        ensure!(
            !self.is_sealed(),
            SealedSnafu {
                column: self.name.clone()
            }
        );
        if value.is_null() {
            return Ok(Scalar::Null);
        }

        let scalar = match self.logical_type {
            LogicalType::Bool => value.as_bool().map(Scalar::Bool),
            LogicalType::UInt8 => narrow(value.as_int(8, false)).map(Scalar::UInt8),
            LogicalType::Int8 => narrow(value.as_int(8, true)).map(Scalar::Int8),
            LogicalType::UInt16 => narrow(value.as_int(16, false)).map(Scalar::UInt16),
            LogicalType::Int16 => narrow(value.as_int(16, true)).map(Scalar::Int16),
            LogicalType::UInt32 => narrow(value.as_int(32, false)).map(Scalar::UInt32),
            LogicalType::Int32 | LogicalType::Time32(_) => {
                narrow(value.as_int(32, true)).map(Scalar::Int32)
            }
            LogicalType::UInt64 => narrow(value.as_int(64, false)).map(Scalar::UInt64),
            LogicalType::Int64 | LogicalType::Time64(_) => {
                narrow(value.as_int(64, true)).map(Scalar::Int64)
            }
            LogicalType::Float32 => value.as_float(32).map(|v| Scalar::Float32(v as f32)),
            LogicalType::Float64 => value.as_float(64).map(Scalar::Float64),
            LogicalType::Utf8String => value.as_string().map(|s| Scalar::Text(s.into_owned())),
            LogicalType::Binary => value.as_bytes().map(|b| Scalar::Bytes(b.into_owned())),
            LogicalType::FixedSizeBinary(width) => match value.as_bytes() {
                Some(bytes) => {
                    let expected = width as usize;
                    ensure!(
                        bytes.len() == expected,
                        SizeMismatchSnafu {
                            column: self.name.clone(),
                            expected,
                            actual: bytes.len(),
                        }
                    );
                    Some(Scalar::Bytes(bytes.into_owned()))
                }
                None => None,
            },
            LogicalType::Date32 => narrow(value.as_int(32, true))
                .or_else(|| value.as_datetime().and_then(days_since_epoch))
                .map(Scalar::Int32),
            LogicalType::Timestamp(unit) => narrow(value.as_int(64, true))
                .or_else(|| value.as_datetime().and_then(|dt| since_epoch(dt, unit)))
                .map(Scalar::Int64),
        };

        scalar.context(TypeMismatchSnafu {
            column: self.name.clone(),
            expected: self.logical_type,
            found: describe(value),
        })
    }

    /// Append an already-coerced scalar.
    pub fn push(&mut self, scalar: Scalar) -> Result<(), AppendError> {
        let BuilderState::Open(acc) = &mut self.state else {
            return SealedSnafu {
                column: self.name.clone(),
            }
            .fail();
        };
        let accepted = acc.append(scalar).context(ArrowSnafu {
            column: self.name.clone(),
        })?;
        ensure!(
            accepted,
            UnexpectedScalarSnafu {
                column: self.name.clone(),
                expected: self.logical_type,
            }
        );
        Ok(())
    }

    /// Coerce and append a host value.
    pub fn append<V>(&mut self, value: &V) -> Result<(), AppendError>
    where
        V: ExternalValue + ?Sized,
    {
        let scalar = self.coerce(value)?;
        self.push(scalar)
    }

    /// Seal the builder and return the finished chunk.
    pub fn finish(&mut self) -> Result<ArrayRef, AppendError> {
        match std::mem::replace(&mut self.state, BuilderState::Sealed) {
            BuilderState::Open(mut acc) => Ok(acc.finish()),
            BuilderState::Sealed => SealedSnafu {
                column: self.name.clone(),
            }
            .fail(),
        }
    }
}

fn narrow<T: TryFrom<i128>>(value: Option<i128>) -> Option<T> {
    value.and_then(|v| T::try_from(v).ok())
}

fn days_since_epoch(dt: DateTime<Utc>) -> Option<i32> {
    i32::try_from(dt.timestamp().div_euclid(SECONDS_PER_DAY)).ok()
}

fn since_epoch(dt: DateTime<Utc>, unit: TimeUnit) -> Option<i64> {
    match unit {
        TimeUnit::Milli => Some(dt.timestamp_millis()),
        TimeUnit::Micro => Some(dt.timestamp_micros()),
        TimeUnit::Nano => dt.timestamp_nanos_opt(),
    }
}

fn describe<V: ExternalValue + ?Sized>(value: &V) -> String {
    if let Some(b) = value.as_bool() {
        format!("boolean {b}")
    } else if let Some(i) = value.as_integer() {
        format!("integer {i}")
    } else if let Some(n) = value.as_number() {
        format!("number {n}")
    } else if let Some(s) = value.as_string() {
        format!("string {s:?}")
    } else if let Some(b) = value.as_bytes() {
        format!("{} bytes", b.len())
    } else {
        "an unrecognised value".to_string()
    }
}
