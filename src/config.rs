//! Options recognized by the transformer and the batch aggregator.
//!
//! Both option structs implement [`Default`] and [`serde::Deserialize`] (missing fields fall back
//! to their defaults), so a batch can be configured from a small JSON file:
//!
//! ```json
//! { "normalize": { "exclude_index_total": false }, "pattern": "offenses_*.csv" }
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::batch::observer::{BatchObserver, Severity};
use crate::error::{EngineError, EngineResult};

/// Territory and outlying-area codes excluded by default.
pub const DEFAULT_TERRITORIES: [&str; 5] = ["PR", "GU", "VI", "AS", "MP"];

/// Suffix of the aggregate offense type that is excluded by default.
pub const INDEX_TOTAL: &str = "index_total";

pub const DEFAULT_ACTUAL_PREFIX: &str = "actual_";
pub const DEFAULT_CLEARED_PREFIX: &str = "cleared_";

/// Default filename pattern for directory scans.
pub const DEFAULT_PATTERN: &str = "*.csv";

/// Options controlling schema resolution and record transformation for one file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeOptions {
    /// Territory codes (matched against `state_abb`) whose rows are dropped.
    pub territories: BTreeSet<String>,
    /// Drop the aggregate `index_total` offense type.
    pub exclude_index_total: bool,
    /// Compute `clearance_ratio` from paired cleared-count columns when a file has them.
    pub with_clearance: bool,
    /// Column prefix of the actual-count offense family.
    pub actual_prefix: String,
    /// Column prefix of the cleared-count offense family.
    pub cleared_prefix: String,
    /// Field delimiter. If `None`, tab for `.tsv` inputs and comma otherwise.
    pub delimiter: Option<char>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            territories: DEFAULT_TERRITORIES.iter().map(|t| t.to_string()).collect(),
            exclude_index_total: true,
            with_clearance: true,
            actual_prefix: DEFAULT_ACTUAL_PREFIX.to_string(),
            cleared_prefix: DEFAULT_CLEARED_PREFIX.to_string(),
            delimiter: None,
        }
    }
}

impl NormalizeOptions {
    /// Delimiter to use for `path`, honoring an explicit override.
    pub fn delimiter_for(&self, path: &Path) -> EngineResult<u8> {
        if let Some(c) = self.delimiter {
            if !c.is_ascii() {
                return Err(EngineError::Config {
                    message: format!("delimiter '{c}' is not an ASCII character"),
                });
            }
            return Ok(c as u8);
        }
        Ok(match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        })
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        if self.actual_prefix.is_empty() {
            return Err(EngineError::Config {
                message: "actual_prefix must not be empty".to_string(),
            });
        }
        if self.with_clearance && self.cleared_prefix.is_empty() {
            return Err(EngineError::Config {
                message: "cleared_prefix must not be empty when with_clearance is set".to_string(),
            });
        }
        Ok(())
    }
}

/// Inclusive window of report years, matched against a `_YYYY` filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct YearWindow {
    pub from: i32,
    pub to: i32,
}

impl YearWindow {
    pub fn contains(&self, year: i32) -> bool {
        (self.from..=self.to).contains(&year)
    }
}

/// Options controlling a batch run.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchOptions {
    /// Per-file normalization options.
    pub normalize: NormalizeOptions,
    /// Filename glob used in directory mode.
    pub pattern: String,
    /// If set, only files whose stem ends in `_YYYY` within this window are processed.
    pub years: Option<YearWindow>,
    /// Optional observer for per-file outcomes.
    #[serde(skip)]
    pub observer: Option<Arc<dyn BatchObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    #[serde(skip)]
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("normalize", &self.normalize)
            .field("pattern", &self.pattern)
            .field("years", &self.years)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            pattern: DEFAULT_PATTERN.to_string(),
            years: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl BatchOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| EngineError::Config {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Parse options from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{BatchOptions, NormalizeOptions, YearWindow, DEFAULT_PATTERN};

    #[test]
    fn defaults_exclude_five_territories_and_index_total() {
        let opts = NormalizeOptions::default();
        assert_eq!(opts.territories.len(), 5);
        for code in ["PR", "GU", "VI", "AS", "MP"] {
            assert!(opts.territories.contains(code), "missing {code}");
        }
        assert!(opts.exclude_index_total);
        assert!(opts.with_clearance);
    }

    #[test]
    fn json_config_falls_back_to_defaults() {
        let opts = BatchOptions::from_json_str(
            r#"{ "normalize": { "exclude_index_total": false, "territories": ["PR"] },
                 "years": { "from": 2012, "to": 2014 } }"#,
        )
        .unwrap();
        assert!(!opts.normalize.exclude_index_total);
        assert_eq!(opts.normalize.territories.len(), 1);
        assert_eq!(opts.normalize.actual_prefix, "actual_");
        assert_eq!(opts.pattern, DEFAULT_PATTERN);
        assert_eq!(opts.years, Some(YearWindow { from: 2012, to: 2014 }));
        assert!(opts.observer.is_none());
    }

    #[test]
    fn json_config_rejects_unknown_fields() {
        assert!(BatchOptions::from_json_str(r#"{ "patern": "*.csv" }"#).is_err());
    }

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        let mut opts = NormalizeOptions::default();
        assert_eq!(opts.delimiter_for(Path::new("a.csv")).unwrap(), b',');
        assert_eq!(opts.delimiter_for(Path::new("a.TSV")).unwrap(), b'\t');
        opts.delimiter = Some(';');
        assert_eq!(opts.delimiter_for(Path::new("a.tsv")).unwrap(), b';');
        opts.delimiter = Some('é');
        assert!(opts.delimiter_for(Path::new("a.csv")).is_err());
        opts.delimiter = Some('€');
        assert!(opts.delimiter_for(Path::new("a.csv")).is_err());
        opts.delimiter = Some('|');
        assert_eq!(opts.delimiter_for(Path::new("a.csv")).unwrap(), b'|');
    }

    #[test]
    fn year_window_is_inclusive() {
        let w = YearWindow { from: 2012, to: 2014 };
        assert!(w.contains(2012));
        assert!(w.contains(2014));
        assert!(!w.contains(2011));
        assert!(!w.contains(2015));
    }
}
