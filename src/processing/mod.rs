//! Per-file normalization: schema resolution and wide-to-long transformation.
//!
//! - [`resolve`]: inspects a header and produces a [`ResolvedSchema`]
//! - [`transform`]: reshapes a loaded table into the long format
//! - [`metrics`]: numeric coercion and derived rates
//! - [`identifiers`]: `date` and `geoid` synthesis
//!
//! ## Example
//!
//! ```rust
//! use crime_normalize::config::NormalizeOptions;
//! use crime_normalize::processing::{normalize_table, resolve_schema};
//! use crime_normalize::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let wide = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("agency_name", DataType::Utf8),
//!         Field::new("population", DataType::Utf8),
//!         Field::new("actual_murder", DataType::Utf8),
//!         Field::new("actual_arson", DataType::Utf8),
//!     ]),
//!     vec![vec![
//!         Value::Utf8("Springfield".into()),
//!         Value::Utf8("100000".into()),
//!         Value::Utf8("3".into()),
//!         Value::Null,
//!     ]],
//! );
//!
//! let options = NormalizeOptions::default();
//! let names: Vec<&str> = wide.schema.field_names().collect();
//! let schema = resolve_schema(&names, &options).unwrap();
//! assert_eq!(schema.suffixes().collect::<Vec<_>>(), vec!["murder", "arson"]);
//!
//! let long = normalize_table(&wide, &options).unwrap();
//! assert_eq!(long.row_count(), 2);
//! assert_eq!(
//!     long.value(0, "crime_rate"),
//!     Some(&Value::Float64(3.0 / 100_000.0 * 100_000.0))
//! );
//! assert_eq!(long.value(1, "crime_rate"), Some(&Value::Null));
//! ```

pub mod identifiers;
pub mod metrics;
pub mod resolve;
pub mod transform;

pub use resolve::{resolve_schema, OffenseColumns, PopulationColumns, ResolvedSchema, SchemaError};
pub use transform::{transform, transform_with_stats, TransformStats};

use crate::config::NormalizeOptions;
use crate::types::DataSet;

/// Resolve `table`'s header and transform it in one step.
///
/// Fails with [`SchemaError::EmptyPrefix`] for options whose prefixes would match every column.
pub fn normalize_table(table: &DataSet, options: &NormalizeOptions) -> Result<DataSet, SchemaError> {
    let names: Vec<&str> = table.schema.field_names().collect();
    let schema = resolve_schema(&names, options)?;
    Ok(transform(table, &schema, options))
}

#[cfg(test)]
mod tests {
    use super::{normalize_table, SchemaError};
    use crate::config::NormalizeOptions;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    #[test]
    fn empty_actual_prefix_does_not_turn_identifiers_into_offenses() {
        let wide = DataSet::new(
            Schema::new(vec![
                Field::new("agency_name", DataType::Utf8),
                Field::new("state_abb", DataType::Utf8),
                Field::new("actual_murder", DataType::Utf8),
            ]),
            vec![vec![
                Value::Utf8("Albany PD".into()),
                Value::Utf8("NY".into()),
                Value::Utf8("2".into()),
            ]],
        );
        let options = NormalizeOptions {
            actual_prefix: String::new(),
            ..Default::default()
        };

        let err = normalize_table(&wide, &options).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyPrefix { option: "actual_prefix" }));
    }
}
