//! Per-file outcome reporting for batch runs.
//!
//! [`BatchObserver`] receives a success or failure callback for every file, plus an alert when a
//! failure's [`Severity`] reaches the configured threshold. [`LogObserver`] forwards to `log`;
//! [`CompositeObserver`] fans out to several observers.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};

use crate::error::EngineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (nothing to process, run still well-formed).
    Warning,
    /// Error-level event (a file could not be normalized).
    Error,
    /// Critical error (I/O or other infrastructure failures). Default alert threshold.
    #[default]
    Critical,
}

impl Severity {
    /// Classify an engine error.
    pub fn of(e: &EngineError) -> Self {
        match e {
            EngineError::Io(_) => Self::Critical,
            EngineError::InputFormat { source, .. } => match source.kind() {
                csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            EngineError::Parquet(_) => Self::Critical,
            EngineError::Schema { .. } => Self::Error,
            EngineError::NoInputFiles { .. } => Self::Warning,
            EngineError::InvalidPattern(_) | EngineError::Config { .. } => Self::Error,
        }
    }
}

/// Context about one file of a batch.
#[derive(Debug, Clone)]
pub struct FileContext {
    /// Input path as given or discovered.
    pub path: PathBuf,
    /// 1-based position of the file in the batch.
    pub file_id: i64,
}

/// Row counts reported for a successfully normalized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    /// Rows in the wide input.
    pub input_rows: usize,
    /// Long-format rows emitted.
    pub output_rows: usize,
}

/// Observer interface for per-file batch outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait BatchObserver: Send + Sync {
    /// Called when a file is normalized.
    fn on_success(&self, _ctx: &FileContext, _stats: FileStats) {}

    /// Called when a file fails; the batch aborts afterwards.
    fn on_failure(&self, _ctx: &FileContext, _severity: Severity, _error: &EngineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &EngineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn BatchObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn BatchObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl BatchObserver for CompositeObserver {
    fn on_success(&self, ctx: &FileContext, stats: FileStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &FileContext, severity: Severity, error: &EngineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &EngineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Reports batch events through the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn on_success(&self, ctx: &FileContext, stats: FileStats) {
        info!(
            "[normalize][ok] file_id={} path={} input_rows={} output_rows={}",
            ctx.file_id,
            ctx.path.display(),
            stats.input_rows,
            stats.output_rows
        );
    }

    fn on_failure(&self, ctx: &FileContext, severity: Severity, error: &EngineError) {
        warn!(
            "[normalize][{severity:?}] file_id={} path={} err={error}",
            ctx.file_id,
            ctx.path.display()
        );
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &EngineError) {
        error!(
            "[ALERT][normalize][{severity:?}] file_id={} path={} err={error}",
            ctx.file_id,
            ctx.path.display()
        );
    }
}
