//! Batch aggregation: normalizes many files and concatenates them with provenance.
//!
//! Files are processed one at a time, in a deterministic order: the order given, or the
//! lexicographic file-name order of a directory scan. Every output row is tagged with a 1-based
//! `file_id` and the `source_file` path string. The first failing file aborts the batch and no
//! partial result is returned.
//!
//! ```no_run
//! use crime_normalize::batch::aggregate_directory;
//! use crime_normalize::config::BatchOptions;
//! use crime_normalize::output::write_parquet;
//!
//! # fn main() -> Result<(), crime_normalize::EngineError> {
//! let combined = aggregate_directory("data/offenses_known", &BatchOptions::default())?;
//! let written = write_parquet(&combined, "crime_long")?;
//! println!("rows={} -> {}", combined.row_count(), written.display());
//! # Ok(())
//! # }
//! ```

pub mod discover;
pub mod observer;

use std::path::{Path, PathBuf};

use log::{debug, info};

pub use discover::{discover_files, filter_by_year, report_year};
pub use observer::{BatchObserver, CompositeObserver, FileContext, FileStats, LogObserver, Severity};

use crate::config::{BatchOptions, NormalizeOptions};
use crate::error::{EngineError, EngineResult};
use crate::ingestion::csv::load_table;
use crate::processing::{resolve_schema, transform_with_stats, TransformStats};
use crate::types::{DataSet, DataType, Field, Value};

/// 1-based position of the originating file within the batch.
pub const FILE_ID: &str = "file_id";
/// Originating file path, as given or discovered.
pub const SOURCE_FILE: &str = "source_file";

/// Load, resolve and transform a single file.
pub fn normalize_file(
    path: impl AsRef<Path>,
    options: &NormalizeOptions,
) -> EngineResult<(DataSet, TransformStats)> {
    let path = path.as_ref();
    options.validate()?;

    let table = load_table(path, options)?;
    let names: Vec<&str> = table.schema.field_names().collect();
    let schema = resolve_schema(&names, options).map_err(|source| EngineError::Schema {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "{}: offenses={:?} population={:?} optional={:?}",
        path.display(),
        schema.suffixes().collect::<Vec<_>>(),
        schema.population,
        schema.optional_columns
    );

    Ok(transform_with_stats(&table, &schema, options))
}

/// Normalize `paths` in order and concatenate the results.
///
/// The combined schema is the union of the per-file schemas in order of first appearance,
/// followed by `file_id` and `source_file`. Cells of columns a file does not have are null.
pub fn aggregate_files<P: AsRef<Path>>(paths: &[P], options: &BatchOptions) -> EngineResult<DataSet> {
    if let Some(window) = &options.years {
        let kept = filter_by_year(paths.iter().map(|p| p.as_ref().to_path_buf()).collect(), window);
        return aggregate_ordered(&kept, options);
    }
    aggregate_ordered(paths, options)
}

/// Normalize every file in `dir` matching `options.pattern` (non-recursive) and concatenate.
///
/// Fails with [`EngineError::NoInputFiles`] when no file matches, including when the year window
/// filters out every match.
pub fn aggregate_directory(dir: impl AsRef<Path>, options: &BatchOptions) -> EngineResult<DataSet> {
    let dir = dir.as_ref();
    let mut files = discover_files(dir, &options.pattern)?;
    if let Some(window) = &options.years {
        files = filter_by_year(files, window);
        if files.is_empty() {
            return Err(EngineError::NoInputFiles {
                dir: dir.to_path_buf(),
                pattern: format!("{} within {}..={}", options.pattern, window.from, window.to),
            });
        }
    }
    aggregate_ordered(&files, options)
}

fn aggregate_ordered<P: AsRef<Path>>(paths: &[P], options: &BatchOptions) -> EngineResult<DataSet> {
    let mut parts: Vec<DataSet> = Vec::with_capacity(paths.len());
    for (idx, path) in paths.iter().enumerate() {
        let ctx = FileContext {
            path: path.as_ref().to_path_buf(),
            file_id: i64::try_from(idx + 1).unwrap_or(i64::MAX),
        };

        match normalize_file(&ctx.path, &options.normalize) {
            Ok((long, stats)) => {
                if let Some(obs) = options.observer.as_ref() {
                    obs.on_success(
                        &ctx,
                        FileStats {
                            input_rows: stats.input_rows,
                            output_rows: stats.output_rows,
                        },
                    );
                }
                parts.push(tag_provenance(long, &ctx));
            }
            Err(e) => {
                report_failure(options, &ctx, &e);
                return Err(e);
            }
        }
    }

    let combined = provenance_last(DataSet::concat(parts));
    info!(
        "aggregated {} files into {} rows",
        paths.len(),
        combined.row_count()
    );
    Ok(combined)
}

fn report_failure(options: &BatchOptions, ctx: &FileContext, e: &EngineError) {
    if let Some(obs) = options.observer.as_ref() {
        let sev = Severity::of(e);
        obs.on_failure(ctx, sev, e);
        if sev >= options.alert_at_or_above {
            obs.on_alert(ctx, sev, e);
        }
    }
}

fn tag_provenance(mut long: DataSet, ctx: &FileContext) -> DataSet {
    long.schema.fields.push(Field::new(FILE_ID, DataType::Int64));
    long.schema.fields.push(Field::new(SOURCE_FILE, DataType::Utf8));
    let source = ctx.path.to_string_lossy().into_owned();
    for row in &mut long.rows {
        row.push(Value::Int64(ctx.file_id));
        row.push(Value::Utf8(source.clone()));
    }
    long
}

/// Moves the provenance columns behind any column that only later files introduced.
fn provenance_last(combined: DataSet) -> DataSet {
    let names: Vec<&str> = combined
        .schema
        .field_names()
        .filter(|n| *n != FILE_ID && *n != SOURCE_FILE)
        .chain([FILE_ID, SOURCE_FILE])
        .collect();
    combined.select_columns(&names)
}

/// Source paths of a combined dataset, in `file_id` order, for reporting.
pub fn source_files(combined: &DataSet) -> Vec<(i64, PathBuf)> {
    let (Some(id_idx), Some(src_idx)) = (
        combined.schema.index_of(FILE_ID),
        combined.schema.index_of(SOURCE_FILE),
    ) else {
        return Vec::new();
    };
    let mut out: Vec<(i64, PathBuf)> = Vec::new();
    for row in &combined.rows {
        if let (Value::Int64(id), Some(src)) = (&row[id_idx], row[src_idx].as_str()) {
            if out.last().is_none_or(|(last, _)| last != id) {
                out.push((*id, PathBuf::from(src)));
            }
        }
    }
    out
}
