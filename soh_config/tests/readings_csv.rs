use std::fs::File;
use std::io::Write;

use rstest::rstest;
use soh_config::{ReadingRow, load_readings_csv};
use tempfile::tempdir;

#[rstest]
fn loads_rows_in_file_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("readings.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "voltage,current,temperature").unwrap();
    writeln!(f, "3.70,-1.2,25.0").unwrap();
    writeln!(f, " 3.65 , -1.1 , 25.5 ").unwrap();
    drop(f);

    let rows = load_readings_csv(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            ReadingRow {
                voltage: 3.70,
                current: -1.2,
                temperature: 25.0
            },
            ReadingRow {
                voltage: 3.65,
                current: -1.1,
                temperature: 25.5
            },
        ]
    );
}

#[rstest]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "v,i,t").unwrap();
    writeln!(f, "3.7,-1.0,25.0").unwrap();
    drop(f);

    let err = load_readings_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("must have headers 'voltage,current,temperature'"));
}

#[rstest]
fn reports_line_number_of_bad_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_row.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "voltage,current,temperature").unwrap();
    writeln!(f, "3.7,-1.0,25.0").unwrap();
    writeln!(f, "3.7,abc,25.0").unwrap();
    drop(f);

    let err = load_readings_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("invalid CSV row 3"), "{err}");
}

#[rstest]
fn missing_file_mentions_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    let err = load_readings_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("nope.csv"));
}
