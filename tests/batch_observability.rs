use std::sync::{Arc, Mutex};

use crime_normalize::batch::{
    aggregate_files, BatchObserver, CompositeObserver, FileContext, FileStats, Severity,
};
use crime_normalize::config::BatchOptions;
use crime_normalize::EngineError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(i64, FileStats)>>,
    failures: Mutex<Vec<(i64, Severity)>>,
    alerts: Mutex<Vec<Severity>>,
}

impl BatchObserver for RecordingObserver {
    fn on_success(&self, ctx: &FileContext, stats: FileStats) {
        self.successes.lock().unwrap().push((ctx.file_id, stats));
    }

    fn on_failure(&self, ctx: &FileContext, severity: Severity, _error: &EngineError) {
        self.failures.lock().unwrap().push((ctx.file_id, severity));
    }

    fn on_alert(&self, _ctx: &FileContext, severity: Severity, _error: &EngineError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options_with(obs: Arc<RecordingObserver>, threshold: Severity) -> BatchOptions {
    BatchOptions {
        observer: Some(obs),
        alert_at_or_above: threshold,
        ..Default::default()
    }
}

#[test]
fn observer_sees_each_successful_file() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(obs.clone(), Severity::Critical);

    aggregate_files(
        &[
            "tests/fixtures/offenses_known_monthly_2019.csv",
            "tests/fixtures/offenses_known_monthly_2020.csv",
        ],
        &opts,
    )
    .unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![
            (1, FileStats { input_rows: 5, output_rows: 6 }),
            (2, FileStats { input_rows: 3, output_rows: 4 }),
        ]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn missing_file_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(obs.clone(), Severity::Critical);

    let _ = aggregate_files(
        &[
            "tests/fixtures/offenses_known_monthly_2019.csv",
            "tests/fixtures/does_not_exist.csv",
        ],
        &opts,
    )
    .unwrap_err();

    assert_eq!(obs.successes.lock().unwrap().len(), 1);
    assert_eq!(obs.failures.lock().unwrap().clone(), vec![(2, Severity::Critical)]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![Severity::Critical]);
}

#[test]
fn schema_failure_is_not_alerted_at_critical_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(obs.clone(), Severity::Critical);

    let _ = aggregate_files(&["tests/fixtures/no_offenses.csv"], &opts).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![(1, Severity::Error)]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn composite_fans_out_to_every_observer() {
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![a.clone() as Arc<dyn BatchObserver>, b.clone()]);
    let opts = BatchOptions {
        observer: Some(Arc::new(composite)),
        alert_at_or_above: Severity::Error,
        ..Default::default()
    };

    let _ = aggregate_files(&["tests/fixtures/ragged.csv"], &opts).unwrap_err();

    for obs in [&a, &b] {
        assert_eq!(obs.failures.lock().unwrap().clone(), vec![(1, Severity::Error)]);
        assert_eq!(obs.alerts.lock().unwrap().clone(), vec![Severity::Error]);
    }
}
