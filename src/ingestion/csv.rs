//! CSV ingestion of raw wide-format report files.

use std::io::Read;
use std::path::Path;

use crate::config::NormalizeOptions;
use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Load a delimited text file into an all-text [`DataSet`].
///
/// Rules:
///
/// - The file must have a header row; header names are trimmed.
/// - Every column is loaded as [`DataType::Utf8`]; numeric interpretation happens later, per
///   column, during transformation.
/// - Empty or whitespace-only cells become [`Value::Null`].
/// - Rows with a different number of fields than the header, invalid UTF-8 and unreadable files
///   fail with [`EngineError::InputFormat`].
pub fn load_table(path: impl AsRef<Path>, options: &NormalizeOptions) -> EngineResult<DataSet> {
    let path = path.as_ref();
    let delimiter = options.delimiter_for(path)?;
    let input_format = |source: csv::Error| EngineError::InputFormat {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(input_format)?;
    load_table_from_reader(&mut rdr).map_err(input_format)
}

/// Load CSV data from an existing CSV reader into an all-text [`DataSet`].
pub fn load_table_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> Result<DataSet, csv::Error> {
    let headers = rdr.headers()?.clone();
    let schema = Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h.trim(), DataType::Utf8))
            .collect(),
    );

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = record.iter().map(text_value).collect();
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn text_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::Utf8(trimmed.to_owned())
    }
}
