//! `crime-normalize` turns wide-format crime-report files (one row per agency and period, one
//! column per offense) into a single long-format [`types::DataSet`] (one row per agency, period
//! and offense) with per-capita and clearance rates, and persists it as Parquet.
//!
//! Processing runs in three stages:
//!
//! 1. **Schema resolution** ([`processing::resolve`]): each file's header is inspected to find the
//!    population denominator, the `actual_*` offense columns (and paired `cleared_*` columns), and
//!    which identifier columns are present. A file without offense columns is rejected.
//! 2. **Record transformation** ([`processing::transform`]): excluded territories and rows without
//!    an agency name are dropped, offense columns are reshaped into `offense_type` /
//!    `actual_count` rows, and `crime_rate` / `clearance_ratio` are derived. Zero or missing
//!    denominators yield nulls, never errors.
//! 3. **Batch aggregation** ([`batch`]): files are processed in a deterministic order, tagged with
//!    `file_id` and `source_file`, and concatenated. One failing file fails the batch.
//!
//! ## Quick example
//!
//! ```no_run
//! use crime_normalize::batch::aggregate_files;
//! use crime_normalize::config::BatchOptions;
//! use crime_normalize::output::write_parquet;
//!
//! # fn main() -> Result<(), crime_normalize::EngineError> {
//! let files = ["offenses_known_monthly_2019.csv", "offenses_known_monthly_2020.csv"];
//! let combined = aggregate_files(&files, &BatchOptions::default())?;
//! write_parquet(&combined, "offenses_long.parquet")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: options and their defaults
//! - [`ingestion`]: CSV loading and Parquet reading
//! - [`processing`]: per-file schema resolution and transformation
//! - [`batch`]: multi-file aggregation, discovery and observers
//! - [`output`]: all-or-nothing Parquet writing
//! - [`types`]: in-memory table types
//! - [`error`]: the crate error type

pub mod batch;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod output;
pub mod processing;
pub mod types;

pub use error::{EngineError, EngineResult};
