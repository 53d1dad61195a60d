#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::{fs::File, path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, Int32Array, LargeStringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::arrow::ArrowWriter;
use parquet_rows_core::{
    ColumnDeclaration, DecodeMode, LogicalType, ParquetReader, ParquetWriter, ReaderOptions,
    SchemaDeclaration, TableError, TimeUnit, TypeId, Value,
    column::AppendError,
    row::RowError,
};
use serde_json::json;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn every_type() -> Result<SchemaDeclaration, Box<dyn std::error::Error>> {
    let decl = SchemaDeclaration::from_json_str(
        r#"{
            "b": { "type": "BOOL" },
            "u8": { "type": "UINT8" },
            "i8": { "type": "INT8" },
            "u16": { "type": "UINT16" },
            "i16": { "type": "INT16" },
            "u32": { "type": "UINT32" },
            "i32": { "type": "INT32" },
            "u64": { "type": "UINT64" },
            "i64": { "type": "INT64" },
            "f32": { "type": "FLOAT" },
            "f64": { "type": "DOUBLE" },
            "s": { "type": "STRING" },
            "bin": { "type": "BINARY" },
            "fsb": { "type": "FIXED_SIZE_BINARY", "width": 4 },
            "d": { "type": "DATE32" },
            "ts": { "type": "TIMESTAMP", "unit": "MICRO" },
            "t32": { "type": 19, "unit": 1 },
            "t64": { "type": "TIME64", "unit": "NANO" }
        }"#,
    )?;
    Ok(decl)
}

fn full_row() -> Vec<Value> {
    vec![
        Value::Bool(true),
        Value::from(u8::MAX),
        Value::from(i8::MIN),
        Value::from(u16::MAX),
        Value::from(i16::MIN),
        Value::from(u32::MAX),
        Value::from(i32::MIN),
        Value::from(u64::MAX),
        Value::from(i64::MIN),
        Value::Float(1.5),
        Value::Float(2.25),
        Value::from("héllo"),
        Value::Bytes(vec![0, 1, 2]),
        Value::Bytes(vec![1, 2, 3, 4]),
        Value::Int(19_000),
        Value::Int(1_700_000_000_000_000),
        Value::Int(3_600_000),
        Value::Int(3_600_000_000_000),
    ]
}

#[test]
fn every_type_round_trips() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("all.parquet");

    let mut writer = ParquetWriter::create(&every_type()?, &path)?;
    writer.append_row(&full_row())?;
    writer.append_row(&vec![Value::Null; 18])?;
    writer.append_record([("s", Value::from("partial")), ("i32", Value::Int(7))])?;
    writer.close()?;

    let mut reader = ParquetReader::new(&path);
    assert!(reader.open()?);
    assert_eq!(reader.row_count()?, 3);
    assert_eq!(reader.column_count()?, 18);
    assert_eq!(reader.column_names()?[13], "fsb");

    let types = reader.logical_types()?;
    assert_eq!(types[13], Some(LogicalType::FixedSizeBinary(4)));
    assert_eq!(types[15], Some(LogicalType::Timestamp(TimeUnit::Micro)));
    assert_eq!(types[16], Some(LogicalType::Time32(TimeUnit::Milli)));
    assert_eq!(types[17], Some(LogicalType::Time64(TimeUnit::Nano)));

    let first = reader.read_row_positional(0)?;
    assert_eq!(first, full_row());
    assert_eq!(first[7], Value::BigInt(i128::from(u64::MAX)));
    assert_eq!(first[8], Value::BigInt(i128::from(i64::MIN)));

    let nulls = reader.read_row(1)?;
    assert!(nulls.values().iter().all(Value::is_null));

    let partial = reader.read_row(2)?;
    assert_eq!(partial.get_by_name("s"), Some(&Value::from("partial")));
    assert_eq!(partial.get_by_name("i32"), Some(&Value::Int(7)));
    assert_eq!(partial.get_by_name("b"), Some(&Value::Null));

    assert!(!reader.close());
    Ok(())
}

#[test]
fn empty_tables_report_zero_rows() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("empty.parquet");

    let decl = SchemaDeclaration::new()
        .column("id", ColumnDeclaration::new(TypeId::Int64))
        .column("name", ColumnDeclaration::new(TypeId::Utf8));
    let mut writer = ParquetWriter::create(&decl, &path)?;
    writer.close()?;

    let reader = ParquetReader::open_path(&path)?;
    assert_eq!(reader.row_count()?, 0);
    assert_eq!(reader.column_names()?, vec!["id", "name"]);
    Ok(())
}

#[test]
fn int64_safe_integer_boundary() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("boundary.parquet");

    let decl = SchemaDeclaration::new().column("n", ColumnDeclaration::new(TypeId::Int64));
    let mut writer = ParquetWriter::create(&decl, &path)?;
    writer.append_json(&json!([9_007_199_254_740_991_i64]))?;
    writer.append_json(&json!([9_007_199_254_740_992_i64]))?;
    writer.append_json(&json!(["-9007199254740993"]))?;
    writer.close()?;

    let reader = ParquetReader::open_path(&path)?;
    assert_eq!(
        reader.read_row_positional(0)?,
        vec![Value::Int(9_007_199_254_740_991)]
    );
    assert_eq!(
        reader.read_row_positional(1)?,
        vec![Value::BigInt(9_007_199_254_740_992)]
    );
    assert_eq!(
        reader.read_row_positional(2)?,
        vec![Value::BigInt(-9_007_199_254_740_993)]
    );

    assert_eq!(reader.read_row(0)?.to_json(), json!({"n": 9_007_199_254_740_991_i64}));
    assert_eq!(reader.read_row(1)?.to_json(), json!({"n": "9007199254740992"}));
    Ok(())
}

#[test]
fn fixed_size_binary_enforces_width() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("fsb.parquet");

    let decl = SchemaDeclaration::new().column(
        "digest",
        ColumnDeclaration::new(TypeId::FixedSizeBinary).with_width(4),
    );
    let mut writer = ParquetWriter::create(&decl, &path)?;

    let err = writer.append_row(&[Value::Bytes(vec![1, 2, 3])]).unwrap_err();
    assert!(matches!(
        err,
        TableError::Row {
            source: RowError::Append {
                source: AppendError::SizeMismatch {
                    expected: 4,
                    actual: 3,
                    ..
                }
            }
        }
    ));
    writer.append_row(&[Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])])?;
    writer.close()?;

    let reader = ParquetReader::open_path(&path)?;
    assert_eq!(reader.row_count()?, 1);
    assert_eq!(
        reader.read_row_positional(0)?,
        vec![Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])]
    );
    Ok(())
}

#[test]
fn rejected_rows_are_not_written() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("rejected.parquet");

    let decl = SchemaDeclaration::new()
        .column("id", ColumnDeclaration::new(TypeId::UInt8))
        .column("name", ColumnDeclaration::new(TypeId::Utf8));
    let mut writer = ParquetWriter::create(&decl, &path)?;

    writer.append_json(&json!([1, "one"]))?;
    assert!(matches!(
        writer.append_json(&json!([2])),
        Err(TableError::Row {
            source: RowError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        })
    ));
    assert!(writer.append_json(&json!(["two", "two"])).is_err());
    assert!(writer.append_json(&json!([300, "three hundred"])).is_err());
    assert!(matches!(
        writer.append_json(&json!({"id": 3, "colour": "red"})),
        Err(TableError::Row {
            source: RowError::UnknownColumn { .. }
        })
    ));
    writer.append_json(&json!({"name": "four", "id": 4}))?;
    assert_eq!(writer.row_count(), 2);
    writer.close()?;

    let reader = ParquetReader::open_path(&path)?;
    assert_eq!(reader.row_count()?, 2);
    assert_eq!(
        reader.read_row(1)?.to_json(),
        json!({"id": 4, "name": "four"})
    );
    Ok(())
}

#[test]
fn rows_resolve_across_chunks_and_row_groups() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("chunks.parquet");

    let decl = SchemaDeclaration::new()
        .column("n", ColumnDeclaration::new(TypeId::Int32))
        .column("flag", ColumnDeclaration::new(TypeId::Bool));
    let mut writer = ParquetWriter::create(&decl, &path)?;
    writer.set_row_group_size(2)?;
    for i in 0..8 {
        writer.append_row(&[Value::Int(i), Value::Bool(i % 3 == 0)])?;
    }
    writer.close()?;

    let options = ReaderOptions::default().with_batch_size(3);
    let mut reader = ParquetReader::with_options(&path, options);
    reader.open()?;
    assert_eq!(reader.row_count()?, 8);
    for i in 0..8 {
        assert_eq!(
            reader.read_row_positional(i)?,
            vec![Value::Int(i as i64), Value::Bool(i % 3 == 0)]
        );
    }
    Ok(())
}

#[test]
fn timestamps_and_dates_accept_rfc3339_text() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("times.parquet");

    let decl = SchemaDeclaration::new()
        .column(
            "at",
            ColumnDeclaration::new(TypeId::Timestamp).with_unit(TimeUnit::Milli),
        )
        .column("day", ColumnDeclaration::new(TypeId::Date32));
    let mut writer = ParquetWriter::create(&decl, &path)?;
    writer.append_json(&json!(["2024-03-01T12:00:00Z", "2024-03-01T12:00:00Z"]))?;
    writer.append_json(&json!([0, 0]))?;
    writer.close()?;

    let reader = ParquetReader::open_path(&path)?;
    assert_eq!(
        reader.read_row_positional(0)?,
        vec![Value::Int(1_709_294_400_000), Value::Int(19_783)]
    );
    assert_eq!(
        reader.read_row_positional(1)?,
        vec![Value::Int(0), Value::Int(0)]
    );
    Ok(())
}

fn write_with_unsupported_column(path: &Path) -> TestResult {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("note", DataType::LargeUtf8, false),
    ]));
    let ids: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
    let notes: ArrayRef = Arc::new(LargeStringArray::from(vec!["a", "b"]));
    let batch = RecordBatch::try_new(schema.clone(), vec![ids, notes])?;

    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[test]
fn unsupported_stored_types_read_as_null_unless_strict() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("large.parquet");
    write_with_unsupported_column(&path)?;

    let reader = ParquetReader::open_path(&path)?;
    assert_eq!(reader.logical_types()?, vec![Some(LogicalType::Int32), None]);
    assert_eq!(
        reader.read_row_positional(1)?,
        vec![Value::Int(2), Value::Null]
    );
    assert_eq!(
        reader.read_row_positional(5)?,
        vec![Value::Null, Value::Null]
    );

    let strict = ReaderOptions::default().with_decode_mode(DecodeMode::Strict);
    let mut reader = ParquetReader::with_options(&path, strict);
    reader.open()?;
    assert!(matches!(reader.read_row(0), Err(TableError::Decode { .. })));
    Ok(())
}

#[test]
fn lifecycle_errors() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("life.parquet");

    let decl = SchemaDeclaration::new().column("n", ColumnDeclaration::new(TypeId::Int16));
    let mut writer = ParquetWriter::new(&decl, &path)?;
    writer.append_row(&[Value::Int(1)])?;
    writer.open()?;
    writer.append_row(&[Value::Int(2)])?;
    writer.close()?;
    writer.close()?;
    assert!(matches!(
        writer.append_row(&[Value::Int(3)]),
        Err(TableError::Closed { .. })
    ));

    let mut reader = ParquetReader::open_path(&path)?;
    assert_eq!(reader.row_count()?, 2);
    assert!(!reader.close());
    assert!(!reader.close());
    assert!(matches!(reader.row_count(), Err(TableError::NotOpen { .. })));

    assert!(reader.open()?);
    assert_eq!(reader.read_row_positional(1)?, vec![Value::Int(2)]);
    Ok(())
}
