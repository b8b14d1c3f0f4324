use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Date32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use shootings_explorer::{
    BoroughSelection, CellValue, ColumnMap, DataSource, DatasetError, DateParsing, FilterSelection,
    LoadError, LoadOptions, borough_options, date_bounds, load_normalized, summarize,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A file under the system temp dir, unique to this process and test.
fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("shootings-explorer-{}-{name}", std::process::id()))
}

const EXPORT: &str = "\
INCIDENT_KEY,OCCUR_DATE,OCCUR_TIME,BORO,PERP_RACE,VIC_RACE
238490580,01/15/2020,04:31:00,BRONX,BLACK,BLACK
238490581,01/20/2020,22:05:00,BRONX,,WHITE HISPANIC
238490582,02/01/2020,13:45:00,QUEENS,BLACK,BLACK
";

#[test]
fn csv_export_loads_and_summarizes() {
    let path = scratch("export.csv");
    std::fs::write(&path, EXPORT).unwrap();

    let options = LoadOptions::default();
    let ds = load_normalized(&DataSource::Path(path.clone()), &options).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(ds.len(), 3);
    assert_eq!(ds.rows[0][1], CellValue::Date(ymd(2020, 1, 15)));
    assert_eq!(date_bounds(&ds, &options.columns), Some((ymd(2020, 1, 15), ymd(2020, 2, 1))));
    assert_eq!(
        borough_options(&ds, &options.columns).unwrap(),
        vec!["All", "BRONX", "QUEENS"]
    );

    let sel = FilterSelection::new(ymd(2020, 1, 1), ymd(2020, 1, 31), BoroughSelection::All);
    let summary = summarize(&ds, &options.columns, &sel);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.pivot.column_labels, vec!["<null>", "BLACK"]);
}

#[test]
fn strict_loading_rejects_bad_dates() {
    let path = scratch("bad-date.csv");
    std::fs::write(&path, "OCCUR_DATE,BORO,PERP_RACE\n2020-01-01,BRONX,BLACK\n2020-02-30,BRONX,BLACK\n")
        .unwrap();

    let source = DataSource::Path(path.clone());
    let strict = load_normalized(&source, &LoadOptions::default());
    let lenient = load_normalized(
        &source,
        &LoadOptions {
            date_parsing: DateParsing::Lenient,
            ..LoadOptions::default()
        },
    );
    std::fs::remove_file(&path).ok();

    match strict {
        Err(DatasetError::DateParse(e)) => {
            assert_eq!(e.row, 1);
            assert_eq!(e.value, "2020-02-30");
        }
        other => panic!("expected a date parse error, got {other:?}"),
    }
    assert_eq!(lenient.unwrap().len(), 1);
}

#[test]
fn unreadable_source_is_a_load_error() {
    let source = DataSource::parse("/nonexistent/dir/shootings.csv");
    let err = load_normalized(&source, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, DatasetError::Load(LoadError::Io { .. })));
}

#[test]
fn custom_headers_and_delimiter() {
    let path = scratch("custom.txt");
    std::fs::write(&path, "date;area;race\n03/04/2021;BROOKLYN;WHITE\n").unwrap();

    let options = LoadOptions {
        delimiter: Some(b';'),
        date_parsing: DateParsing::Strict,
        columns: ColumnMap {
            occur_date: "date".into(),
            borough: "area".into(),
            perp_race: "race".into(),
        },
    };
    let ds = load_normalized(&DataSource::Path(path.clone()), &options).unwrap();
    std::fs::remove_file(&path).ok();

    let summary = summarize(&ds, &options.columns, &FilterSelection::initial(&ds, &options.columns));
    assert_eq!(summary.total, 1);
    assert_eq!(summary.pivot.get("BROOKLYN", "WHITE"), 1);
}

#[test]
fn parquet_dates_arrive_typed() {
    let path = scratch("typed.parquet");
    let schema = Arc::new(Schema::new(vec![
        Field::new("OCCUR_DATE", DataType::Date32, false),
        Field::new("BORO", DataType::Utf8, false),
        Field::new("PERP_RACE", DataType::Utf8, true),
    ]));
    let epoch = ymd(1970, 1, 1);
    let days = |d: NaiveDate| (d - epoch).num_days() as i32;
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Date32Array::from(vec![days(ymd(2022, 7, 4)), days(ymd(2022, 8, 1))])),
            Arc::new(StringArray::from(vec!["BROOKLYN", "BRONX"])),
            Arc::new(StringArray::from(vec![Some("BLACK"), None])),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_normalized(&DataSource::Path(path.clone()), &LoadOptions::default()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(ds.column_names, vec!["OCCUR_DATE", "BORO", "PERP_RACE"]);
    assert_eq!(ds.rows[0][0], CellValue::Date(ymd(2022, 7, 4)));
    assert_eq!(ds.rows[1][2], CellValue::Null);
}
