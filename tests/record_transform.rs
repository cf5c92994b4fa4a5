use crime_normalize::batch::normalize_file;
use crime_normalize::config::NormalizeOptions;
use crime_normalize::types::{DataSet, DataType, Value};
use crime_normalize::EngineError;

const FILE_2019: &str = "tests/fixtures/offenses_known_monthly_2019.csv";
const FILE_2020: &str = "tests/fixtures/offenses_known_monthly_2020.csv";

fn normalize(path: &str, options: &NormalizeOptions) -> DataSet {
    normalize_file(path, options).unwrap().0
}

fn text(s: &str) -> Value {
    Value::Utf8(s.to_string())
}

fn f(ds: &DataSet, row: usize, column: &str) -> Option<f64> {
    match ds.value(row, column) {
        Some(Value::Float64(v)) => Some(*v),
        Some(Value::Null) => None,
        other => panic!("unexpected {column} cell: {other:?}"),
    }
}

#[test]
fn wide_rows_become_one_row_per_offense() {
    let (ds, stats) = normalize_file(FILE_2019, &NormalizeOptions::default()).unwrap();

    assert_eq!(stats.input_rows, 5);
    assert_eq!(stats.territory_dropped, 1);
    assert_eq!(stats.missing_name_dropped, 1);
    // 3 retained rows x (murder, robbery_total)
    assert_eq!(ds.row_count(), 6);
    assert_eq!(stats.output_rows, 6);

    let types: Vec<&Value> = ds.column_values("offense_type").collect();
    assert_eq!(
        types,
        vec![
            &text("murder"),
            &text("robbery_total"),
            &text("murder"),
            &text("robbery_total"),
            &text("murder"),
            &text("robbery_total"),
        ]
    );
}

#[test]
fn output_schema_is_typed_and_drops_raw_offense_columns() {
    let ds = normalize(FILE_2019, &NormalizeOptions::default());

    for name in ["population", "actual_count", "clearance_ratio", "crime_rate"] {
        assert_eq!(ds.schema.field(name).map(|f| f.data_type), Some(DataType::Float64), "{name}");
    }
    assert_eq!(ds.schema.field("offense_type").map(|f| f.data_type), Some(DataType::Utf8));
    for raw in [
        "actual_murder",
        "cleared_murder",
        "current_population",
        "unfound_murder",
    ] {
        assert!(ds.schema.index_of(raw).is_none(), "{raw} should not be carried");
    }
    assert!(ds.schema.index_of("number_of_months_missing").is_some());
}

#[test]
fn excluded_territory_rows_never_appear() {
    let ds = normalize(FILE_2019, &NormalizeOptions::default());
    assert!(ds.column_values("state_abb").all(|v| v != &text("PR")));
    assert!(ds.column_values("agency_name").all(|v| v != &text("San Juan PD")));

    let ds = normalize(FILE_2020, &NormalizeOptions::default());
    assert!(ds.column_values("state_abb").all(|v| v != &text("GU")));
    assert_eq!(ds.row_count(), 4);
}

#[test]
fn custom_territory_list_replaces_defaults() {
    let options = NormalizeOptions {
        territories: ["NY".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let ds = normalize(FILE_2020, &options);
    assert!(ds.column_values("state_abb").any(|v| v == &text("GU")));
    assert!(ds.column_values("state_abb").all(|v| v != &text("NY")));
}

#[test]
fn crime_rate_is_null_exactly_when_population_is_not_positive() {
    let ds = normalize(FILE_2019, &NormalizeOptions::default());

    for row in 0..ds.row_count() {
        let population = f(&ds, row, "population");
        let actual = f(&ds, row, "actual_count");
        let rate = f(&ds, row, "crime_rate");
        match (actual, population) {
            (Some(a), Some(p)) if p > 0.0 => assert_eq!(rate, Some(a / p * 100_000.0)),
            _ => assert_eq!(rate, None, "row {row}"),
        }
    }

    // current_population wins, then falls back to population when blank
    assert_eq!(f(&ds, 0, "population"), Some(75_000.0));
    assert_eq!(f(&ds, 2, "population"), Some(74_000.0));
    assert_eq!(f(&ds, 0, "crime_rate"), Some(2.0 / 75_000.0 * 100_000.0));
    // zero actual with positive population is a real zero rate
    assert_eq!(f(&ds, 2, "crime_rate"), Some(0.0));
    // zero population
    assert_eq!(f(&ds, 5, "crime_rate"), None);
}

#[test]
fn clearance_ratio_is_null_for_zero_or_missing_actual() {
    let ds = normalize(FILE_2019, &NormalizeOptions::default());

    assert_eq!(f(&ds, 0, "clearance_ratio"), Some(0.5));
    assert_eq!(f(&ds, 1, "clearance_ratio"), Some(0.5));
    // actual_murder = 0, cleared_murder = 0
    assert_eq!(f(&ds, 2, "actual_count"), Some(0.0));
    assert_eq!(f(&ds, 2, "clearance_ratio"), None);
    assert_eq!(f(&ds, 3, "clearance_ratio"), Some(0.25));
    // actual_murder = "NA"
    assert_eq!(f(&ds, 4, "actual_count"), None);
    assert_eq!(f(&ds, 4, "clearance_ratio"), None);
    assert_eq!(f(&ds, 5, "clearance_ratio"), Some(1.0 / 3.0));
}

#[test]
fn clearance_can_be_disabled() {
    let options = NormalizeOptions {
        with_clearance: false,
        ..Default::default()
    };
    let ds = normalize(FILE_2019, &options);
    assert!(ds.schema.index_of("clearance_ratio").is_none());
}

#[test]
fn file_without_population_columns_has_null_rates() {
    let ds = normalize("tests/fixtures/offenses_tab.tsv", &NormalizeOptions::default());
    assert_eq!(ds.row_count(), 1);
    assert_eq!(f(&ds, 0, "crime_rate"), Some(7.0 / 100_000.0 * 100_000.0));

    let no_pop = "agency_name,actual_murder,actual_arson\nAlbany PD,3,1\nTroy PD,,2\n";
    let dir = std::env::temp_dir().join(format!(
        "crime-normalize-nopop-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("no_population.csv");
    std::fs::write(&path, no_pop).unwrap();

    let (ds, _) = normalize_file(&path, &NormalizeOptions::default()).unwrap();
    assert_eq!(ds.row_count(), 4);
    assert!(ds.column_values("crime_rate").all(Value::is_null));
    assert!(ds.column_values("population").all(Value::is_null));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn index_total_is_excluded_by_default_and_kept_on_request() {
    let ds = normalize(FILE_2020, &NormalizeOptions::default());
    assert!(ds.column_values("offense_type").all(|v| v != &text("index_total")));

    let options = NormalizeOptions {
        exclude_index_total: false,
        ..Default::default()
    };
    let ds = normalize(FILE_2020, &options);
    assert_eq!(
        ds.column_values("offense_type")
            .filter(|v| *v == &text("index_total"))
            .count(),
        2
    );
    assert_eq!(ds.row_count(), 6);
}

#[test]
fn identifiers_are_synthesized_from_sub_codes() {
    let ds = normalize(FILE_2019, &NormalizeOptions::default());
    assert_eq!(ds.value(0, "date"), Some(&text("2019-01-01")));
    assert_eq!(ds.value(2, "date"), Some(&text("2019-02-01")));
    assert_eq!(ds.value(0, "geoid"), Some(&text("0600562")));

    let ds = normalize(FILE_2020, &NormalizeOptions::default());
    assert_eq!(ds.value(0, "date"), Some(&text("2020-01-01")));
    assert!(ds.schema.index_of("geoid").is_none());
}

#[test]
fn normalizing_twice_is_identical() {
    let a = normalize(FILE_2019, &NormalizeOptions::default());
    let b = normalize(FILE_2019, &NormalizeOptions::default());
    assert_eq!(a, b);
}

#[test]
fn file_without_offense_columns_is_a_schema_error() {
    let err = normalize_file("tests/fixtures/no_offenses.csv", &NormalizeOptions::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Schema { .. }));
    assert!(err.to_string().contains("no_offenses.csv"));
}

#[test]
fn malformed_and_missing_files_are_input_format_errors() {
    let err = normalize_file("tests/fixtures/ragged.csv", &NormalizeOptions::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::InputFormat { .. }));

    let err = normalize_file("tests/fixtures/does_not_exist.csv", &NormalizeOptions::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::InputFormat { .. }));
    assert_eq!(
        err.path().map(|p| p.to_string_lossy().into_owned()),
        Some("tests/fixtures/does_not_exist.csv".to_string())
    );
}
