//! Wide-to-long record transformation.
//!
//! Order matters and is fixed:
//!
//! 1. narrow the table to resolved identifier, population and offense columns
//! 2. drop excluded territories
//! 3. drop rows without an entity name
//! 4. emit one row per offense type, with `actual_count` coerced to a number
//! 5. derive `clearance_ratio` when the file pairs cleared counts with actual counts
//! 6. derive `crime_rate` from the coalesced population
//!
//! `index_total` never appears in the output while [`NormalizeOptions::exclude_index_total`] is
//! set, even if the schema was resolved with different options.

use log::{debug, warn};

use super::identifiers::{period_date, place_geoid};
use super::metrics::{clearance_ratio, coalesce, coerce_f64, crime_rate};
use super::resolve::{ResolvedSchema, ENTITY_NAME_COLUMN, TERRITORY_COLUMN};
use crate::config::{NormalizeOptions, INDEX_TOTAL};
use crate::types::{DataSet, DataType, Field, Schema, Value};

pub const OFFENSE_TYPE: &str = "offense_type";
pub const ACTUAL_COUNT: &str = "actual_count";
pub const CLEARANCE_RATIO: &str = "clearance_ratio";
pub const CRIME_RATE: &str = "crime_rate";
pub const POPULATION: &str = "population";
pub const DATE: &str = "date";
pub const GEOID: &str = "geoid";

/// Row accounting for one transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Rows in the wide input table.
    pub input_rows: usize,
    /// Rows dropped because their territory code is excluded.
    pub territory_dropped: usize,
    /// Rows dropped because their entity name is missing.
    pub missing_name_dropped: usize,
    /// Long-format rows emitted.
    pub output_rows: usize,
}

/// Transform a wide table into the long format. See the module docs for the processing order.
pub fn transform(table: &DataSet, schema: &ResolvedSchema, options: &NormalizeOptions) -> DataSet {
    transform_with_stats(table, schema, options).0
}

/// Like [`transform`], also returning row accounting.
pub fn transform_with_stats(
    table: &DataSet,
    schema: &ResolvedSchema,
    options: &NormalizeOptions,
) -> (DataSet, TransformStats) {
    let mut stats = TransformStats {
        input_rows: table.row_count(),
        ..Default::default()
    };

    let narrowed = table.select_columns(&retained_columns(schema));

    let kept = match narrowed.schema.index_of(TERRITORY_COLUMN) {
        Some(idx) => narrowed.filter_rows(|row| !is_excluded_territory(&row[idx], options)),
        None => narrowed,
    };
    stats.territory_dropped = stats.input_rows - kept.row_count();

    let named = match kept.schema.index_of(ENTITY_NAME_COLUMN) {
        Some(idx) => kept.filter_rows(|row| row[idx].as_str().is_some_and(|s| !s.trim().is_empty())),
        None => {
            if kept.row_count() > 0 {
                warn!(
                    "no '{ENTITY_NAME_COLUMN}' column; dropping all {} rows",
                    kept.row_count()
                );
            }
            kept.filter_rows(|_| false)
        }
    };
    stats.missing_name_dropped = stats.input_rows - stats.territory_dropped - named.row_count();

    let layout = Layout::new(&named.schema, schema, options);
    let mut rows = Vec::with_capacity(named.row_count() * layout.offenses.len());
    for row in &named.rows {
        layout.reshape_row(row, &mut rows);
    }
    stats.output_rows = rows.len();

    debug!(
        "transformed {} input rows into {} long rows ({} territory, {} unnamed dropped)",
        stats.input_rows, stats.output_rows, stats.territory_dropped, stats.missing_name_dropped
    );

    (DataSet::new(layout.output_schema, rows), stats)
}

fn retained_columns(schema: &ResolvedSchema) -> Vec<&str> {
    let mut cols: Vec<&str> = schema.optional_columns.iter().map(String::as_str).collect();
    cols.extend(schema.population.names());
    for offense in &schema.offenses {
        cols.push(offense.actual.as_str());
        if let Some(cleared) = &offense.cleared {
            cols.push(cleared.as_str());
        }
    }
    cols
}

fn is_excluded_territory(value: &Value, options: &NormalizeOptions) -> bool {
    match value.as_str() {
        Some(code) => {
            let code = code.trim();
            options.territories.iter().any(|t| t.eq_ignore_ascii_case(code))
        }
        None => false,
    }
}

struct OffenseSlot<'a> {
    suffix: &'a str,
    actual: usize,
    cleared: Option<usize>,
}

/// Column positions in the narrowed table and the output schema they feed.
struct Layout<'a> {
    output_schema: Schema,
    carried: Vec<usize>,
    date_from: Option<(usize, usize)>,
    geoid_from: Option<(usize, usize)>,
    population: Vec<usize>,
    offenses: Vec<OffenseSlot<'a>>,
    with_clearance: bool,
}

impl<'a> Layout<'a> {
    fn new(input: &Schema, schema: &'a ResolvedSchema, options: &NormalizeOptions) -> Self {
        let mut fields: Vec<Field> = Vec::new();
        let mut carried = Vec::new();
        for name in &schema.optional_columns {
            if let Some(idx) = input.index_of(name) {
                carried.push(idx);
                fields.push(Field::new(name.as_str(), DataType::Utf8));
            }
        }

        let pair = |a: &str, b: &str| Some((input.index_of(a)?, input.index_of(b)?));
        let date_from = if schema.has_column(DATE) { None } else { pair("year", "month") };
        if date_from.is_some() {
            fields.push(Field::new(DATE, DataType::Utf8));
        }
        let geoid_from = if schema.has_column(GEOID) {
            None
        } else {
            pair("fips_state_code", "fips_place_code")
        };
        if geoid_from.is_some() {
            fields.push(Field::new(GEOID, DataType::Utf8));
        }

        let population = schema
            .population
            .names()
            .filter_map(|name| input.index_of(name))
            .collect();

        let offenses: Vec<OffenseSlot<'a>> = schema
            .offenses
            .iter()
            .filter(|o| !(options.exclude_index_total && o.suffix == INDEX_TOTAL))
            .filter_map(|o| {
                Some(OffenseSlot {
                    suffix: o.suffix.as_str(),
                    actual: input.index_of(&o.actual)?,
                    cleared: o.cleared.as_deref().and_then(|c| input.index_of(c)),
                })
            })
            .collect();
        let with_clearance = options.with_clearance && offenses.iter().any(|o| o.cleared.is_some());

        fields.push(Field::new(POPULATION, DataType::Float64));
        fields.push(Field::new(OFFENSE_TYPE, DataType::Utf8));
        fields.push(Field::new(ACTUAL_COUNT, DataType::Float64));
        if with_clearance {
            fields.push(Field::new(CLEARANCE_RATIO, DataType::Float64));
        }
        fields.push(Field::new(CRIME_RATE, DataType::Float64));

        Self {
            output_schema: Schema::new(fields),
            carried,
            date_from,
            geoid_from,
            population,
            offenses,
            with_clearance,
        }
    }

    fn reshape_row(&self, row: &[Value], out: &mut Vec<Vec<Value>>) {
        let mut base: Vec<Value> = self.carried.iter().map(|&i| row[i].clone()).collect();
        if let Some((year, month)) = self.date_from {
            base.push(Value::from_string(period_date(&row[year], &row[month])));
        }
        if let Some((state, place)) = self.geoid_from {
            base.push(Value::from_string(place_geoid(&row[state], &row[place])));
        }

        let population = coalesce(self.population.iter().map(|&i| coerce_f64(&row[i])));

        for offense in &self.offenses {
            let actual = coerce_f64(&row[offense.actual]);
            let mut record = Vec::with_capacity(self.output_schema.fields.len());
            record.extend(base.iter().cloned());
            record.push(Value::from_f64(population));
            record.push(Value::Utf8(offense.suffix.to_string()));
            record.push(Value::from_f64(actual));
            if self.with_clearance {
                let cleared = offense.cleared.and_then(|i| coerce_f64(&row[i]));
                record.push(Value::from_f64(clearance_ratio(cleared, actual)));
            }
            record.push(Value::from_f64(crime_rate(actual, population)));
            out.push(record);
        }
    }
}
