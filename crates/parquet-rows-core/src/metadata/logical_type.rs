//! The closed set of column types supported by the marshalling core.
//!
//! Callers name a column type with a [`TypeId`] (by name or by its numeric
//! Arrow type code) plus optional [`TypeParameters`]. [`logical_type_of`]
//! validates that pair and produces a [`LogicalType`], which is the only
//! type representation the builders and accessors ever see. Anything outside
//! the closed set is rejected here, at declaration time, rather than at the
//! first row write.
use std::{fmt, str::FromStr};

use arrow::datatypes::{DataType, TimeUnit as ArrowTimeUnit};
use snafu::prelude::*;

/// Errors raised while resolving a type identifier and its parameters.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum TypeRegistryError {
    /// The identifier does not name a type in the supported set.
    #[snafu(display("unsupported type identifier: {type_id}"))]
    UnsupportedTypeId {
        /// The identifier as supplied by the caller.
        type_id: String,
    },

    /// The identifier does not name a supported time unit.
    #[snafu(display("unsupported time unit identifier: {unit}"))]
    UnsupportedUnitId {
        /// The identifier as supplied by the caller.
        unit: String,
    },

    /// A fixed-size binary type was declared without a byte width.
    #[snafu(display("{type_id} requires a byte width"))]
    MissingWidth {
        /// The type that needs the width.
        type_id: TypeId,
    },

    /// A fixed-size binary width was zero, negative, or too large.
    #[snafu(display("invalid byte width {width} (must be > 0 and fit in i32)"))]
    InvalidWidth {
        /// Declared width.
        width: i64,
    },

    /// A temporal type was declared without a time unit.
    #[snafu(display("{type_id} requires a time unit"))]
    MissingUnit {
        /// The type that needs the unit.
        type_id: TypeId,
    },

    /// The time unit is valid in general but not for this type.
    #[snafu(display("{type_id} does not support time unit {unit}"))]
    UnitNotSupported {
        /// The temporal type.
        type_id: TypeId,
        /// The rejected unit.
        unit: TimeUnit,
    },
}

/// Identifier of a supported column type.
///
/// Numeric codes match Arrow's `Type::type` enumeration so schemas written
/// against the Arrow C++ constants keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    /// Boolean, bit-packed.
    Bool,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Variable-length bytes.
    Binary,
    /// Bytes of a declared fixed width.
    FixedSizeBinary,
    /// Days since the UNIX epoch.
    Date32,
    /// Instant since the UNIX epoch in a declared unit.
    Timestamp,
    /// Time of day, 32-bit, milliseconds.
    Time32,
    /// Time of day, 64-bit, micro- or nanoseconds.
    Time64,
}

impl TypeId {
    /// Every supported identifier, in code order.
    pub const ALL: [TypeId; 18] = [
        TypeId::Bool,
        TypeId::UInt8,
        TypeId::Int8,
        TypeId::UInt16,
        TypeId::Int16,
        TypeId::UInt32,
        TypeId::Int32,
        TypeId::UInt64,
        TypeId::Int64,
        TypeId::Float32,
        TypeId::Float64,
        TypeId::Utf8,
        TypeId::Binary,
        TypeId::FixedSizeBinary,
        TypeId::Date32,
        TypeId::Timestamp,
        TypeId::Time32,
        TypeId::Time64,
    ];

    /// Arrow type code for this identifier.
    pub fn code(self) -> i64 {
        match self {
            TypeId::Bool => 1,
            TypeId::UInt8 => 2,
            TypeId::Int8 => 3,
            TypeId::UInt16 => 4,
            TypeId::Int16 => 5,
            TypeId::UInt32 => 6,
            TypeId::Int32 => 7,
            TypeId::UInt64 => 8,
            TypeId::Int64 => 9,
            // 10 is HALF_FLOAT, which Parquet cannot store.
            TypeId::Float32 => 11,
            TypeId::Float64 => 12,
            TypeId::Utf8 => 13,
            TypeId::Binary => 14,
            TypeId::FixedSizeBinary => 15,
            TypeId::Date32 => 16,
            // 17 is DATE64, covered by DATE32.
            TypeId::Timestamp => 18,
            TypeId::Time32 => 19,
            TypeId::Time64 => 20,
        }
    }

    /// Resolve an Arrow type code.
    pub fn from_code(code: i64) -> Result<Self, TypeRegistryError> {
        TypeId::ALL
            .into_iter()
            .find(|id| id.code() == code)
            .context(UnsupportedTypeIdSnafu {
                type_id: code.to_string(),
            })
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            TypeId::Bool => "BOOL",
            TypeId::UInt8 => "UINT8",
            TypeId::Int8 => "INT8",
            TypeId::UInt16 => "UINT16",
            TypeId::Int16 => "INT16",
            TypeId::UInt32 => "UINT32",
            TypeId::Int32 => "INT32",
            TypeId::UInt64 => "UINT64",
            TypeId::Int64 => "INT64",
            TypeId::Float32 => "FLOAT",
            TypeId::Float64 => "DOUBLE",
            TypeId::Utf8 => "STRING",
            TypeId::Binary => "BINARY",
            TypeId::FixedSizeBinary => "FIXED_SIZE_BINARY",
            TypeId::Date32 => "DATE32",
            TypeId::Timestamp => "TIMESTAMP",
            TypeId::Time32 => "TIME32",
            TypeId::Time64 => "TIME64",
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeId {
    type Err = TypeRegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s.trim().to_ascii_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => TypeId::Bool,
            "UINT8" => TypeId::UInt8,
            "INT8" => TypeId::Int8,
            "UINT16" => TypeId::UInt16,
            "INT16" => TypeId::Int16,
            "UINT32" => TypeId::UInt32,
            "INT32" => TypeId::Int32,
            "UINT64" => TypeId::UInt64,
            "INT64" => TypeId::Int64,
            "FLOAT" | "FLOAT32" => TypeId::Float32,
            "DOUBLE" | "FLOAT64" => TypeId::Float64,
            "STRING" | "UTF8" => TypeId::Utf8,
            "BINARY" => TypeId::Binary,
            "FIXED_SIZE_BINARY" => TypeId::FixedSizeBinary,
            "DATE32" => TypeId::Date32,
            "TIMESTAMP" => TypeId::Timestamp,
            "TIME32" => TypeId::Time32,
            "TIME64" => TypeId::Time64,
            _ => {
                return UnsupportedTypeIdSnafu {
                    type_id: s.to_string(),
                }
                .fail();
            }
        };
        Ok(id)
    }
}

/// Resolution of temporal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Milliseconds.
    Milli,
    /// Microseconds.
    Micro,
    /// Nanoseconds.
    Nano,
}

impl TimeUnit {
    /// Arrow time unit code (`SECOND` is 0 and unsupported).
    pub fn code(self) -> i64 {
        match self {
            TimeUnit::Milli => 1,
            TimeUnit::Micro => 2,
            TimeUnit::Nano => 3,
        }
    }

    /// Resolve an Arrow time unit code.
    pub fn from_code(code: i64) -> Result<Self, TypeRegistryError> {
        match code {
            1 => Ok(TimeUnit::Milli),
            2 => Ok(TimeUnit::Micro),
            3 => Ok(TimeUnit::Nano),
            _ => UnsupportedUnitIdSnafu {
                unit: code.to_string(),
            }
            .fail(),
        }
    }

    /// Number of units in one second.
    pub fn per_second(self) -> i64 {
        match self {
            TimeUnit::Milli => 1_000,
            TimeUnit::Micro => 1_000_000,
            TimeUnit::Nano => 1_000_000_000,
        }
    }

    fn to_arrow(self) -> ArrowTimeUnit {
        match self {
            TimeUnit::Milli => ArrowTimeUnit::Millisecond,
            TimeUnit::Micro => ArrowTimeUnit::Microsecond,
            TimeUnit::Nano => ArrowTimeUnit::Nanosecond,
        }
    }

    fn from_arrow(unit: &ArrowTimeUnit) -> Option<Self> {
        match unit {
            ArrowTimeUnit::Second => None,
            ArrowTimeUnit::Millisecond => Some(TimeUnit::Milli),
            ArrowTimeUnit::Microsecond => Some(TimeUnit::Micro),
            ArrowTimeUnit::Nanosecond => Some(TimeUnit::Nano),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Milli => write!(f, "ms"),
            TimeUnit::Micro => write!(f, "us"),
            TimeUnit::Nano => write!(f, "ns"),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = TypeRegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MILLI" | "MILLIS" | "MS" => Ok(TimeUnit::Milli),
            "MICRO" | "MICROS" | "US" => Ok(TimeUnit::Micro),
            "NANO" | "NANOS" | "NS" => Ok(TimeUnit::Nano),
            _ => UnsupportedUnitIdSnafu {
                unit: s.to_string(),
            }
            .fail(),
        }
    }
}

/// Optional parameters attached to a type identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeParameters {
    /// Byte width, required for `FIXED_SIZE_BINARY`.
    pub width: Option<i64>,
    /// Time unit, required for `TIMESTAMP`, `TIME32` and `TIME64`.
    pub unit: Option<TimeUnit>,
}

impl TypeParameters {
    /// Parameters carrying only a byte width.
    pub fn width(width: i64) -> Self {
        TypeParameters {
            width: Some(width),
            unit: None,
        }
    }

    /// Parameters carrying only a time unit.
    pub fn unit(unit: TimeUnit) -> Self {
        TypeParameters {
            width: None,
            unit: Some(unit),
        }
    }
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Boolean value.
    Bool,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    Utf8String,
    /// Variable-length bytes.
    Binary,
    /// Bytes of exactly `width` length; `width > 0`.
    FixedSizeBinary(i32),
    /// Days since the UNIX epoch.
    Date32,
    /// Instant since the UNIX epoch.
    Timestamp(TimeUnit),
    /// Time of day stored in 32 bits.
    Time32(TimeUnit),
    /// Time of day stored in 64 bits.
    Time64(TimeUnit),
}

impl LogicalType {
    /// The identifier this type was declared with.
    pub fn type_id(&self) -> TypeId {
        match self {
            LogicalType::Bool => TypeId::Bool,
            LogicalType::UInt8 => TypeId::UInt8,
            LogicalType::Int8 => TypeId::Int8,
            LogicalType::UInt16 => TypeId::UInt16,
            LogicalType::Int16 => TypeId::Int16,
            LogicalType::UInt32 => TypeId::UInt32,
            LogicalType::Int32 => TypeId::Int32,
            LogicalType::UInt64 => TypeId::UInt64,
            LogicalType::Int64 => TypeId::Int64,
            LogicalType::Float32 => TypeId::Float32,
            LogicalType::Float64 => TypeId::Float64,
            LogicalType::Utf8String => TypeId::Utf8,
            LogicalType::Binary => TypeId::Binary,
            LogicalType::FixedSizeBinary(_) => TypeId::FixedSizeBinary,
            LogicalType::Date32 => TypeId::Date32,
            LogicalType::Timestamp(_) => TypeId::Timestamp,
            LogicalType::Time32(_) => TypeId::Time32,
            LogicalType::Time64(_) => TypeId::Time64,
        }
    }

    /// Arrow data type used for the column's physical chunks.
    pub fn to_arrow(&self) -> DataType {
        match self {
            LogicalType::Bool => DataType::Boolean,
            LogicalType::UInt8 => DataType::UInt8,
            LogicalType::Int8 => DataType::Int8,
            LogicalType::UInt16 => DataType::UInt16,
            LogicalType::Int16 => DataType::Int16,
            LogicalType::UInt32 => DataType::UInt32,
            LogicalType::Int32 => DataType::Int32,
            LogicalType::UInt64 => DataType::UInt64,
            LogicalType::Int64 => DataType::Int64,
            LogicalType::Float32 => DataType::Float32,
            LogicalType::Float64 => DataType::Float64,
            LogicalType::Utf8String => DataType::Utf8,
            LogicalType::Binary => DataType::Binary,
            LogicalType::FixedSizeBinary(width) => DataType::FixedSizeBinary(*width),
            LogicalType::Date32 => DataType::Date32,
            LogicalType::Timestamp(unit) => DataType::Timestamp(unit.to_arrow(), None),
            LogicalType::Time32(unit) => DataType::Time32(unit.to_arrow()),
            LogicalType::Time64(unit) => DataType::Time64(unit.to_arrow()),
        }
    }

    /// Map a stored Arrow type back into the closed set.
    ///
    /// Returns `None` for anything the marshaller does not decode (nested
    /// types, decimals, second-resolution temporals, large offsets, ...).
    /// Timestamp time zones are ignored.
    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        Some(match data_type {
            DataType::Boolean => LogicalType::Bool,
            DataType::UInt8 => LogicalType::UInt8,
            DataType::Int8 => LogicalType::Int8,
            DataType::UInt16 => LogicalType::UInt16,
            DataType::Int16 => LogicalType::Int16,
            DataType::UInt32 => LogicalType::UInt32,
            DataType::Int32 => LogicalType::Int32,
            DataType::UInt64 => LogicalType::UInt64,
            DataType::Int64 => LogicalType::Int64,
            DataType::Float32 => LogicalType::Float32,
            DataType::Float64 => LogicalType::Float64,
            DataType::Utf8 => LogicalType::Utf8String,
            DataType::Binary => LogicalType::Binary,
            DataType::FixedSizeBinary(width) if *width > 0 => LogicalType::FixedSizeBinary(*width),
            DataType::Date32 => LogicalType::Date32,
            DataType::Timestamp(unit, _) => LogicalType::Timestamp(TimeUnit::from_arrow(unit)?),
            DataType::Time32(ArrowTimeUnit::Millisecond) => LogicalType::Time32(TimeUnit::Milli),
            DataType::Time64(unit) => LogicalType::Time64(TimeUnit::from_arrow(unit)?),
            _ => return None,
        })
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Bool => write!(f, "bool"),
            LogicalType::UInt8 => write!(f, "uint8"),
            LogicalType::Int8 => write!(f, "int8"),
            LogicalType::UInt16 => write!(f, "uint16"),
            LogicalType::Int16 => write!(f, "int16"),
            LogicalType::UInt32 => write!(f, "uint32"),
            LogicalType::Int32 => write!(f, "int32"),
            LogicalType::UInt64 => write!(f, "uint64"),
            LogicalType::Int64 => write!(f, "int64"),
            LogicalType::Float32 => write!(f, "float32"),
            LogicalType::Float64 => write!(f, "float64"),
            LogicalType::Utf8String => write!(f, "utf8"),
            LogicalType::Binary => write!(f, "binary"),
            LogicalType::FixedSizeBinary(width) => write!(f, "fixed_size_binary[{width}]"),
            LogicalType::Date32 => write!(f, "date32"),
            LogicalType::Timestamp(unit) => write!(f, "timestamp[{unit}]"),
            LogicalType::Time32(unit) => write!(f, "time32[{unit}]"),
            LogicalType::Time64(unit) => write!(f, "time64[{unit}]"),
        }
    }
}

/// Resolve a type identifier plus parameters into a [`LogicalType`].
///
/// Parameters that do not apply to `type_id` are ignored. `TIME32` only
/// admits milliseconds and `TIME64` only micro- or nanoseconds, matching
/// what Arrow and Parquet can represent.
pub fn logical_type_of(
    type_id: TypeId,
    params: &TypeParameters,
) -> Result<LogicalType, TypeRegistryError> {
    let required_unit = || params.unit.context(MissingUnitSnafu { type_id });

    Ok(match type_id {
        TypeId::Bool => LogicalType::Bool,
        TypeId::UInt8 => LogicalType::UInt8,
        TypeId::Int8 => LogicalType::Int8,
        TypeId::UInt16 => LogicalType::UInt16,
        TypeId::Int16 => LogicalType::Int16,
        TypeId::UInt32 => LogicalType::UInt32,
        TypeId::Int32 => LogicalType::Int32,
        TypeId::UInt64 => LogicalType::UInt64,
        TypeId::Int64 => LogicalType::Int64,
        TypeId::Float32 => LogicalType::Float32,
        TypeId::Float64 => LogicalType::Float64,
        TypeId::Utf8 => LogicalType::Utf8String,
        TypeId::Binary => LogicalType::Binary,
        TypeId::FixedSizeBinary => {
            let width = params.width.context(MissingWidthSnafu { type_id })?;
            let valid = i32::try_from(width).ok().filter(|w| *w > 0);
            LogicalType::FixedSizeBinary(valid.context(InvalidWidthSnafu { width })?)
        }
        TypeId::Date32 => LogicalType::Date32,
        TypeId::Timestamp => LogicalType::Timestamp(required_unit()?),
        TypeId::Time32 => {
            let unit = required_unit()?;
            ensure!(
                unit == TimeUnit::Milli,
                UnitNotSupportedSnafu { type_id, unit }
            );
            LogicalType::Time32(unit)
        }
        TypeId::Time64 => {
            let unit = required_unit()?;
            ensure!(
                unit != TimeUnit::Milli,
                UnitNotSupportedSnafu { type_id, unit }
            );
            LogicalType::Time64(unit)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_every_type_id() {
        for id in TypeId::ALL {
            assert_eq!(TypeId::from_code(id.code()).unwrap(), id);
            assert_eq!(id.name().parse::<TypeId>().unwrap(), id);
        }
    }

    #[test]
    fn excluded_arrow_codes_are_unsupported() {
        // HALF_FLOAT, DATE64, INTERVAL_MONTHS, DECIMAL128, LIST
        for code in [10, 17, 21, 23, 25, 0, -1] {
            let err = TypeId::from_code(code).unwrap_err();
            assert!(
                matches!(&err, TypeRegistryError::UnsupportedTypeId { type_id } if *type_id == code.to_string()),
                "unexpected error: {err:?}"
            );
        }
        assert!("DECIMAL".parse::<TypeId>().is_err());
    }

    #[test]
    fn names_are_case_insensitive_and_accept_aliases() {
        assert_eq!("utf8".parse::<TypeId>().unwrap(), TypeId::Utf8);
        assert_eq!("String".parse::<TypeId>().unwrap(), TypeId::Utf8);
        assert_eq!("boolean".parse::<TypeId>().unwrap(), TypeId::Bool);
        assert_eq!("float64".parse::<TypeId>().unwrap(), TypeId::Float64);
        assert_eq!("micro".parse::<TimeUnit>().unwrap(), TimeUnit::Micro);
        assert!("SECOND".parse::<TimeUnit>().is_err());
        assert!(TimeUnit::from_code(0).is_err());
    }

    #[test]
    fn fixed_size_binary_requires_positive_width() {
        let id = TypeId::FixedSizeBinary;
        assert_eq!(
            logical_type_of(id, &TypeParameters::default()).unwrap_err(),
            TypeRegistryError::MissingWidth { type_id: id }
        );
        for width in [0, -3, i64::from(i32::MAX) + 1] {
            assert_eq!(
                logical_type_of(id, &TypeParameters::width(width)).unwrap_err(),
                TypeRegistryError::InvalidWidth { width }
            );
        }
        assert_eq!(
            logical_type_of(id, &TypeParameters::width(16)).unwrap(),
            LogicalType::FixedSizeBinary(16)
        );
    }

    #[test]
    fn temporal_types_validate_their_unit() {
        assert_eq!(
            logical_type_of(TypeId::Timestamp, &TypeParameters::default()).unwrap_err(),
            TypeRegistryError::MissingUnit {
                type_id: TypeId::Timestamp
            }
        );
        for unit in [TimeUnit::Milli, TimeUnit::Micro, TimeUnit::Nano] {
            assert_eq!(
                logical_type_of(TypeId::Timestamp, &TypeParameters::unit(unit)).unwrap(),
                LogicalType::Timestamp(unit)
            );
        }

        assert!(logical_type_of(TypeId::Time32, &TypeParameters::unit(TimeUnit::Milli)).is_ok());
        assert_eq!(
            logical_type_of(TypeId::Time32, &TypeParameters::unit(TimeUnit::Nano)).unwrap_err(),
            TypeRegistryError::UnitNotSupported {
                type_id: TypeId::Time32,
                unit: TimeUnit::Nano
            }
        );
        assert!(logical_type_of(TypeId::Time64, &TypeParameters::unit(TimeUnit::Micro)).is_ok());
        assert!(logical_type_of(TypeId::Time64, &TypeParameters::unit(TimeUnit::Milli)).is_err());
    }

    #[test]
    fn arrow_mapping_is_reversible_for_the_closed_set() {
        let all = [
            LogicalType::Bool,
            LogicalType::UInt8,
            LogicalType::Int8,
            LogicalType::UInt16,
            LogicalType::Int16,
            LogicalType::UInt32,
            LogicalType::Int32,
            LogicalType::UInt64,
            LogicalType::Int64,
            LogicalType::Float32,
            LogicalType::Float64,
            LogicalType::Utf8String,
            LogicalType::Binary,
            LogicalType::FixedSizeBinary(4),
            LogicalType::Date32,
            LogicalType::Timestamp(TimeUnit::Nano),
            LogicalType::Time32(TimeUnit::Milli),
            LogicalType::Time64(TimeUnit::Micro),
        ];
        for ty in all {
            assert_eq!(LogicalType::from_arrow(&ty.to_arrow()), Some(ty), "{ty}");
        }

        assert_eq!(LogicalType::from_arrow(&DataType::LargeUtf8), None);
        assert_eq!(LogicalType::from_arrow(&DataType::Decimal128(10, 2)), None);
        assert_eq!(
            LogicalType::from_arrow(&DataType::Timestamp(ArrowTimeUnit::Second, None)),
            None
        );
        assert_eq!(
            LogicalType::from_arrow(&DataType::Timestamp(
                ArrowTimeUnit::Millisecond,
                Some("UTC".into())
            )),
            Some(LogicalType::Timestamp(TimeUnit::Milli))
        );
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(LogicalType::FixedSizeBinary(8).to_string(), "fixed_size_binary[8]");
        assert_eq!(LogicalType::Timestamp(TimeUnit::Micro).to_string(), "timestamp[us]");
        assert_eq!(TypeId::Utf8.to_string(), "STRING");
    }
}
