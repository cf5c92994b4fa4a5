//! Persisting a long-format [`DataSet`] as a single Parquet file.
//!
//! Writes are all-or-nothing: data goes to a hidden temporary file next to the target, which is
//! persisted into place only after the Parquet footer has been written and flushed. On failure the
//! temporary is dropped and the target is left as it was.
//!
//! Columns are Snappy-compressed. Snappy trades some file size against Brotli for much faster
//! writes and reads, and is the codec every Parquet reader supports.
//!
//! Concurrent writers targeting the same path are not coordinated; the last rename wins.

use std::fs::File;
use std::path::{is_separator, Path, PathBuf};
use std::sync::Arc;

use log::info;
use parquet::basic::{Compression, LogicalType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::{Type, TypePtr};

use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// File extension of persisted output.
pub const PARQUET_EXTENSION: &str = "parquet";

/// Returns `path` with `.parquet` appended unless it already ends in it (case-insensitive).
///
/// Fails with [`EngineError::Config`] when `path` names a directory (trailing separator, `..`,
/// a root, or an empty path).
pub fn with_parquet_extension(path: impl AsRef<Path>) -> EngineResult<PathBuf> {
    let path = path.as_ref();
    let trailing_separator = path
        .as_os_str()
        .as_encoded_bytes()
        .last()
        .is_some_and(|&b| is_separator(char::from(b)));
    if trailing_separator || path.file_name().is_none() {
        return Err(EngineError::Config {
            message: format!("output path has no file name: '{}'", path.display()),
        });
    }
    Ok(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(PARQUET_EXTENSION) => path.to_path_buf(),
        _ => {
            let mut s = path.as_os_str().to_os_string();
            s.push(".");
            s.push(PARQUET_EXTENSION);
            PathBuf::from(s)
        }
    })
}

/// Write `dataset` to `path` as Parquet, appending the extension if missing.
///
/// Returns the path actually written.
pub fn write_parquet(dataset: &DataSet, path: impl AsRef<Path>) -> EngineResult<PathBuf> {
    let target = with_parquet_extension(path)?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    write_parquet_file(dataset, tmp.as_file().try_clone()?)?;
    tmp.persist(&target).map_err(|e| EngineError::from(e.error))?;

    info!("wrote {} rows to {}", dataset.row_count(), target.display());
    Ok(target)
}

fn write_parquet_file(dataset: &DataSet, file: File) -> EngineResult<()> {
    let schema = parquet_schema(&dataset.schema)?;
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );

    let mut writer = SerializedFileWriter::new(file, schema, props)?;

    if dataset.row_count() > 0 {
        let mut rg = writer.next_row_group()?;
        let mut col_idx: usize = 0;
        while let Some(mut col) = rg.next_column()? {
            let data_type = dataset.schema.fields[col_idx].data_type;
            let cells = dataset.rows.iter().map(|row| &row[col_idx]);
            write_column(col.untyped(), data_type, cells)?;
            col.close()?;
            col_idx += 1;
        }
        rg.close()?;
    }

    let file = writer.into_inner()?;
    file.sync_all()?;
    Ok(())
}

fn parquet_schema(schema: &Schema) -> EngineResult<TypePtr> {
    let mut fields: Vec<TypePtr> = Vec::with_capacity(schema.fields.len());
    for f in &schema.fields {
        let builder = match f.data_type {
            DataType::Int64 => Type::primitive_type_builder(&f.name, PhysicalType::INT64),
            DataType::Float64 => Type::primitive_type_builder(&f.name, PhysicalType::DOUBLE),
            DataType::Bool => Type::primitive_type_builder(&f.name, PhysicalType::BOOLEAN),
            DataType::Utf8 => Type::primitive_type_builder(&f.name, PhysicalType::BYTE_ARRAY)
                .with_logical_type(Some(LogicalType::String)),
        };
        fields.push(Arc::new(builder.with_repetition(Repetition::OPTIONAL).build()?));
    }
    Ok(Arc::new(
        Type::group_type_builder("schema").with_fields(fields).build()?,
    ))
}

/// Non-null values plus definition levels (1 = present, 0 = null) for an OPTIONAL column.
fn split_levels<'a, T, I, F>(cells: I, mut extract: F) -> (Vec<T>, Vec<i16>)
where
    I: Iterator<Item = &'a Value>,
    F: FnMut(&'a Value) -> Option<T>,
{
    let mut values = Vec::new();
    let mut levels = Vec::new();
    for cell in cells {
        match extract(cell) {
            Some(v) => {
                values.push(v);
                levels.push(1);
            }
            None => levels.push(0),
        }
    }
    (values, levels)
}

fn write_column<'a, I>(writer: &mut ColumnWriter<'_>, data_type: DataType, cells: I) -> EngineResult<()>
where
    I: Iterator<Item = &'a Value>,
{
    match (writer, data_type) {
        (ColumnWriter::Int64ColumnWriter(w), DataType::Int64) => {
            let (values, levels) = split_levels(cells, |v| match v {
                Value::Int64(i) => Some(*i),
                _ => None,
            });
            w.write_batch(&values, Some(&levels[..]), None)?;
        }
        (ColumnWriter::DoubleColumnWriter(w), DataType::Float64) => {
            let (values, levels) = split_levels(cells, Value::as_f64);
            w.write_batch(&values, Some(&levels[..]), None)?;
        }
        (ColumnWriter::BoolColumnWriter(w), DataType::Bool) => {
            let (values, levels) = split_levels(cells, |v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            });
            w.write_batch(&values, Some(&levels[..]), None)?;
        }
        (ColumnWriter::ByteArrayColumnWriter(w), DataType::Utf8) => {
            let (values, levels) = split_levels(cells, |v| v.as_str().map(ByteArray::from));
            w.write_batch(&values, Some(&levels[..]), None)?;
        }
        (_, data_type) => {
            return Err(EngineError::Config {
                message: format!("no parquet column writer for {data_type:?}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::with_parquet_extension;
    use crate::error::EngineError;

    #[test]
    fn appends_extension_only_when_missing() {
        assert_eq!(with_parquet_extension("out").unwrap(), PathBuf::from("out.parquet"));
        assert_eq!(with_parquet_extension("out.csv").unwrap(), PathBuf::from("out.csv.parquet"));
        assert_eq!(with_parquet_extension("out.parquet").unwrap(), PathBuf::from("out.parquet"));
        assert_eq!(with_parquet_extension("out.PARQUET").unwrap(), PathBuf::from("out.PARQUET"));
        assert_eq!(
            with_parquet_extension(Path::new("dir/crime")).unwrap(),
            PathBuf::from("dir/crime.parquet")
        );
    }

    #[test]
    fn directory_like_paths_are_rejected() {
        for path in ["out/", "dir/out/", "..", "/", ""] {
            let err = with_parquet_extension(path).unwrap_err();
            assert!(matches!(err, EngineError::Config { .. }), "{path:?}");
        }
    }
}
