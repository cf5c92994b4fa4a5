//! Loading tables from disk.
//!
//! - [`csv`]: raw wide-format report files, loaded as all-text tables
//! - [`parquet`]: persisted long-format output, read back with its stored types

pub mod csv;
pub mod parquet;

pub use self::csv::{load_table, load_table_from_reader};
pub use self::parquet::read_parquet;
