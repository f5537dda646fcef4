//! Parquet reading.
//!
//! Columnar Arrow batches are converted into row snapshots once, at load time,
//! so the rest of the viewer only deals with [`Value`]s.

use arrow::array::{
    Array, BinaryArray, BooleanArray, Date32Array, Date64Array, FixedSizeBinaryArray,
    Float32Array, Float64Array, Int8Array, Int16Array, Int32Array, Int64Array, LargeBinaryArray,
    LargeStringArray, RecordBatch, StringArray, StructArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray, UInt8Array,
    UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::{DateTime, Utc};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use super::{Dataset, Value};
use crate::error::{AppError, Result};
use crate::file_utils::PathExt;

/// Reads a whole Parquet file into memory.
pub fn read_parquet(path: &Path) -> Result<Dataset> {
    let start = Instant::now();
    let file = File::open(path)
        .map_err(|e| AppError::DatasetLoad(format!("{}: {}", path.display(), e)))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        append_batch_rows(&batch, &mut rows)?;
    }

    info!(
        "Read {} rows x {} columns from {} in {:?}",
        rows.len(),
        columns.len(),
        path.format_for_log(),
        start.elapsed()
    );

    Ok(Dataset::new(columns, rows).with_source(path))
}

fn append_batch_rows(batch: &RecordBatch, rows: &mut Vec<Vec<Value>>) -> Result<()> {
    let first = rows.len();
    rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(batch.num_columns())));

    for column in batch.columns() {
        for row in 0..batch.num_rows() {
            let value = array_value(column.as_ref(), row)?;
            rows[first + row].push(value);
        }
    }

    debug!("Converted batch of {} rows", batch.num_rows());
    Ok(())
}

/// Converts one Arrow cell to a [`Value`].
///
/// Types without a dedicated variant are kept as their display string.
pub fn array_value(array: &dyn Array, row: usize) -> Result<Value> {
    if row >= array.len() || array.is_null(row) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Null => Some(Value::Null),
        DataType::Boolean => downcast::<BooleanArray>(array).map(|a| Value::Bool(a.value(row))),

        DataType::Int8 => downcast::<Int8Array>(array).map(|a| Value::Int(a.value(row).into())),
        DataType::Int16 => downcast::<Int16Array>(array).map(|a| Value::Int(a.value(row).into())),
        DataType::Int32 => downcast::<Int32Array>(array).map(|a| Value::Int(a.value(row).into())),
        DataType::Int64 => downcast::<Int64Array>(array).map(|a| Value::Int(a.value(row))),
        DataType::UInt8 => downcast::<UInt8Array>(array).map(|a| Value::Int(a.value(row).into())),
        DataType::UInt16 => {
            downcast::<UInt16Array>(array).map(|a| Value::Int(a.value(row).into()))
        }
        DataType::UInt32 => {
            downcast::<UInt32Array>(array).map(|a| Value::Int(a.value(row).into()))
        }
        DataType::UInt64 => downcast::<UInt64Array>(array).map(|a| {
            let v = a.value(row);
            i64::try_from(v)
                .map(Value::Int)
                .unwrap_or(Value::Float(v as f64))
        }),

        DataType::Float32 => {
            downcast::<Float32Array>(array).map(|a| Value::Float(a.value(row).into()))
        }
        DataType::Float64 => downcast::<Float64Array>(array).map(|a| Value::Float(a.value(row))),

        DataType::Utf8 => downcast::<StringArray>(array).map(|a| Value::from(a.value(row))),
        DataType::LargeUtf8 => {
            downcast::<LargeStringArray>(array).map(|a| Value::from(a.value(row)))
        }

        DataType::Binary => {
            downcast::<BinaryArray>(array).map(|a| Value::Bytes(a.value(row).to_vec()))
        }
        DataType::LargeBinary => {
            downcast::<LargeBinaryArray>(array).map(|a| Value::Bytes(a.value(row).to_vec()))
        }
        DataType::FixedSizeBinary(_) => {
            downcast::<FixedSizeBinaryArray>(array).map(|a| Value::Bytes(a.value(row).to_vec()))
        }

        DataType::Date32 => downcast::<Date32Array>(array)
            .and_then(|a| timestamp(i64::from(a.value(row)) * 86_400, 1)),
        DataType::Date64 => {
            downcast::<Date64Array>(array).and_then(|a| timestamp(a.value(row), 1_000))
        }
        DataType::Timestamp(unit, _) => timestamp_value(array, row, *unit),

        DataType::Struct(_) => match downcast::<StructArray>(array) {
            Some(a) => {
                let mut fields = Vec::with_capacity(a.num_columns());
                for (name, child) in a.column_names().into_iter().zip(a.columns()) {
                    fields.push((name.to_string(), array_value(child.as_ref(), row)?));
                }
                Some(Value::Record(fields))
            }
            None => None,
        },

        _ => None,
    };

    match value {
        Some(value) => Ok(value),
        None => {
            let formatter = ArrayFormatter::try_new(array, &FormatOptions::default())?;
            Ok(Value::Str(formatter.value(row).to_string()))
        }
    }
}

fn downcast<T: 'static>(array: &dyn Array) -> Option<&T> {
    array.as_any().downcast_ref::<T>()
}

fn timestamp_value(array: &dyn Array, row: usize, unit: TimeUnit) -> Option<Value> {
    match unit {
        TimeUnit::Second => {
            downcast::<TimestampSecondArray>(array).and_then(|a| timestamp(a.value(row), 1))
        }
        TimeUnit::Millisecond => downcast::<TimestampMillisecondArray>(array)
            .and_then(|a| timestamp(a.value(row), 1_000)),
        TimeUnit::Microsecond => downcast::<TimestampMicrosecondArray>(array)
            .and_then(|a| timestamp(a.value(row), 1_000_000)),
        TimeUnit::Nanosecond => downcast::<TimestampNanosecondArray>(array)
            .and_then(|a| timestamp(a.value(row), 1_000_000_000)),
    }
}

/// Builds a UTC timestamp from a count of `1/per_second` ticks since the epoch.
fn timestamp(ticks: i64, per_second: i64) -> Option<Value> {
    let secs = ticks.div_euclid(per_second);
    let sub = ticks.rem_euclid(per_second);
    let nanos = u32::try_from(sub * (1_000_000_000 / per_second)).ok()?;
    DateTime::<Utc>::from_timestamp(secs, nanos).map(Value::Timestamp)
}
