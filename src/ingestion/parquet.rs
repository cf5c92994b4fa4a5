//! Reading a persisted long-format Parquet file back into memory.

use std::collections::HashMap;
use std::path::Path;

use parquet::basic::Type as PhysicalType;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field as ParquetField;

use crate::error::EngineResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Read a flat Parquet file into a [`DataSet`].
///
/// The schema is taken from the file: `INT32`/`INT64` columns become [`DataType::Int64`],
/// `FLOAT`/`DOUBLE` become [`DataType::Float64`], `BOOLEAN` becomes [`DataType::Bool`] and
/// everything else is read as [`DataType::Utf8`].
pub fn read_parquet(path: impl AsRef<Path>) -> EngineResult<DataSet> {
    let reader = SerializedFileReader::try_from(path.as_ref())?;

    let fields: Vec<Field> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| Field::new(c.name(), logical_type(c.physical_type())))
        .collect();
    let schema = Schema::new(fields);

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for row_res in reader.into_iter() {
        let row = row_res?;

        let mut map: HashMap<&str, &ParquetField> = HashMap::new();
        for (name, field) in row.get_column_iter() {
            map.insert(name.as_str(), field);
        }

        let out_row = schema
            .fields
            .iter()
            .map(|f| {
                map.get(f.name.as_str())
                    .map(|v| convert_parquet_field(v))
                    .unwrap_or(Value::Null)
            })
            .collect();
        rows.push(out_row);
    }

    Ok(DataSet::new(schema, rows))
}

fn logical_type(physical: PhysicalType) -> DataType {
    match physical {
        PhysicalType::INT32 | PhysicalType::INT64 => DataType::Int64,
        PhysicalType::FLOAT | PhysicalType::DOUBLE => DataType::Float64,
        PhysicalType::BOOLEAN => DataType::Bool,
        _ => DataType::Utf8,
    }
}

fn convert_parquet_field(f: &ParquetField) -> Value {
    match f {
        ParquetField::Null => Value::Null,
        ParquetField::Bool(b) => Value::Bool(*b),
        ParquetField::Byte(v) => Value::Int64(i64::from(*v)),
        ParquetField::Short(v) => Value::Int64(i64::from(*v)),
        ParquetField::Int(v) => Value::Int64(i64::from(*v)),
        ParquetField::Long(v) => Value::Int64(*v),
        ParquetField::UByte(v) => Value::Int64(i64::from(*v)),
        ParquetField::UShort(v) => Value::Int64(i64::from(*v)),
        ParquetField::UInt(v) => Value::Int64(i64::from(*v)),
        ParquetField::ULong(v) => i64::try_from(*v).map(Value::Int64).unwrap_or(Value::Null),
        ParquetField::Float(v) => Value::Float64(f64::from(*v)),
        ParquetField::Double(v) => Value::Float64(*v),
        ParquetField::Str(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    }
}
