//! Schema resolution: turns one file's header into a [`ResolvedSchema`].
//!
//! Input files drift across releases (population columns are renamed, offense families gain and
//! lose members), so nothing about a file's layout is assumed up front. Resolution looks at the
//! header only and fails if the file carries no usable offense columns.

use thiserror::Error;

use crate::config::{NormalizeOptions, INDEX_TOTAL};

/// Population column preferred when present.
pub const CURRENT_POPULATION: &str = "current_population";
/// Population column used when the preferred one is absent, or to fill its nulls.
pub const FALLBACK_POPULATION: &str = "population";

/// Territory code column compared against [`NormalizeOptions::territories`].
pub const TERRITORY_COLUMN: &str = "state_abb";
/// Primary entity-name column; rows with a null value are never emitted.
pub const ENTITY_NAME_COLUMN: &str = "agency_name";

/// Identifier and auxiliary columns carried into the long format when a file has them.
pub const OPTIONAL_COLUMNS: [&str; 16] = [
    "ori",
    "agency_name",
    "state",
    "state_abb",
    "fips_state_code",
    "fips_place_code",
    "fips_county_code",
    "geoid",
    "year",
    "month",
    "date",
    "number_of_months_missing",
    "last_month_reported",
    "officers_killed_by_felony",
    "officers_killed_by_accident",
    "officers_assaulted",
];

/// Reasons a header cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No column carries the actual-count prefix (after optional `index_total` exclusion).
    #[error("no usable offense columns with prefix '{prefix}' (columns={columns:?})")]
    NoOffenseColumns { prefix: String, columns: Vec<String> },
    /// A column-name prefix option is empty, which would match every column.
    #[error("{option} must not be empty")]
    EmptyPrefix { option: &'static str },
}

/// Columns backing one offense type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffenseColumns {
    /// Offense type key: the column name with the actual-count prefix stripped.
    pub suffix: String,
    /// Actual-count column name.
    pub actual: String,
    /// Matching cleared-count column, when the file has one and clearance is enabled.
    pub cleared: Option<String>,
}

/// Population denominator candidates present in a file, most preferred first.
///
/// Values are coalesced per row: the first non-null candidate wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationColumns(pub Vec<String>);

impl PopulationColumns {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Per-file resolved schema. Never persisted; recomputed for every input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub population: PopulationColumns,
    /// Offense types in header order. Never empty.
    pub offenses: Vec<OffenseColumns>,
    /// Present members of [`OPTIONAL_COLUMNS`], in that list's order.
    pub optional_columns: Vec<String>,
}

impl ResolvedSchema {
    /// Offense type suffixes in header order.
    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.offenses.iter().map(|o| o.suffix.as_str())
    }

    /// Whether any offense type has a paired cleared-count column.
    pub fn has_clearance(&self) -> bool {
        self.offenses.iter().any(|o| o.cleared.is_some())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.optional_columns.iter().any(|c| c == name)
    }
}

/// Resolve a header into a [`ResolvedSchema`].
///
/// - Population: [`CURRENT_POPULATION`] before [`FALLBACK_POPULATION`], whichever are present.
/// - Offenses: every column starting with `options.actual_prefix` with a non-empty remainder,
///   first occurrence wins; `index_total` is skipped when `options.exclude_index_total` is set.
/// - Optional columns: the present subset of [`OPTIONAL_COLUMNS`].
///
/// Empty `actual_prefix` (or `cleared_prefix` with clearance enabled) is rejected.
pub fn resolve_schema<S: AsRef<str>>(
    columns: &[S],
    options: &NormalizeOptions,
) -> Result<ResolvedSchema, SchemaError> {
    if options.actual_prefix.is_empty() {
        return Err(SchemaError::EmptyPrefix { option: "actual_prefix" });
    }
    if options.with_clearance && options.cleared_prefix.is_empty() {
        return Err(SchemaError::EmptyPrefix { option: "cleared_prefix" });
    }

    let columns: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let has = |name: &str| columns.contains(&name);

    let population = PopulationColumns(
        [CURRENT_POPULATION, FALLBACK_POPULATION]
            .into_iter()
            .filter(|name| has(name))
            .map(str::to_string)
            .collect(),
    );

    let mut offenses: Vec<OffenseColumns> = Vec::new();
    for &column in &columns {
        let Some(suffix) = column.strip_prefix(options.actual_prefix.as_str()) else {
            continue;
        };
        if suffix.is_empty() || offenses.iter().any(|o| o.suffix == suffix) {
            continue;
        }
        if options.exclude_index_total && suffix == INDEX_TOTAL {
            continue;
        }
        let cleared = if options.with_clearance {
            let name = format!("{}{suffix}", options.cleared_prefix);
            has(&name).then_some(name)
        } else {
            None
        };
        offenses.push(OffenseColumns {
            suffix: suffix.to_string(),
            actual: column.to_string(),
            cleared,
        });
    }

    if offenses.is_empty() {
        return Err(SchemaError::NoOffenseColumns {
            prefix: options.actual_prefix.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
    }

    let optional_columns = OPTIONAL_COLUMNS
        .iter()
        .filter(|name| has(name))
        .map(|name| name.to_string())
        .collect();

    Ok(ResolvedSchema {
        population,
        offenses,
        optional_columns,
    })
}
