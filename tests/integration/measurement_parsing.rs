//! Instrument files parsed from disk and normalized through the upload

use crate::integration::test_utils::TestUpload;
use labplan::error::ParseError;
use labplan::measurement::{normalize_potentiostat, parse_file, InstrumentFormat};
use labplan::section::{Section, Series, Value};
use labplan::store::{create_archive, load_section, ArchiveContext};
use std::fs;
use tempfile::TempDir;

const CV_DTA: &str = "EXPLAIN\n\
TAG\tCV\n\
TITLE\tLABEL\tCyclic Voltammetry\tTest &Identifier\n\
OCVCURVE\tTABLE\t2\n\
\tPt\tT\tVf\tVm\tIm\tOver\n\
\t#\ts\tV vs. Ref.\tV\tA\tbits\n\
\t0\t0,5\t0,10\t0,10\t0,0005\t0\n\
\t1\t1,0\t0,12\t0,12\t0,0010\t0\n\
EOC\tQUANT\t0,12\tOpen Circuit (V)\n";

fn iris_export() -> String {
    let mut lines = vec![
        "Labels,Film 3".to_string(),
        "Operator,AB".to_string(),
        "Date,2024-05-02".to_string(),
        "Start Wavelength,600".to_string(),
        "Stop Wavelength,850".to_string(),
        "Step Size,0.5".to_string(),
    ];
    for row in 6..12 {
        lines.push(format!("Row{},x", row));
    }
    lines.push("Averages,5".to_string());
    lines.push("Integration Time,100".to_string());
    lines.push("Lamp,LED".to_string());
    lines.push("Temperature,21".to_string());
    for row in 16..21 {
        lines.push(format!("Row{},x", row));
    }
    lines.push("Wavelength,Intensity".to_string());
    lines.push("600,1.5".to_string());
    lines.push("600.5,2.5".to_string());
    lines.join("\n")
}

#[test]
fn pl_file_becomes_measurement_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("film3.csv");
    fs::write(&path, iris_export()).unwrap();

    let section = parse_file(InstrumentFormat::Pl, &path).unwrap();
    assert_eq!(section.m_def, "PLMeasurement");
    assert_eq!(section.name(), Some("Film 3"));
    assert_eq!(section.get_str("data_file"), Some("film3.csv"));

    let properties = section.get("properties").and_then(Value::as_section).unwrap();
    assert_eq!(properties.get_str("lamp"), Some("LED"));
    let data = section.get("data").and_then(Value::as_section).unwrap();
    assert_eq!(
        data.get("wavelength"),
        Some(&Value::Series(Series::new(vec![600.0, 600.5], Some("nm"))))
    );
}

#[test]
fn dta_file_with_comma_decimals() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cv.DTA");
    fs::write(&path, CV_DTA).unwrap();

    let section = parse_file(InstrumentFormat::Dta, &path).unwrap();
    assert_eq!(section.m_def, "PotentiostatMeasurement");
    assert_eq!(section.name(), Some("Cyclic Voltammetry"));
    let cycle = section.get("pretreatment").and_then(Value::as_section).unwrap();
    assert_eq!(
        cycle.get("voltage"),
        Some(&Value::Series(Series::new(vec![0.10, 0.12], Some("V"))))
    );
    assert_eq!(
        cycle.get("current"),
        Some(&Value::Series(Series::new(vec![0.5, 1.0], Some("mA"))))
    );
}

#[test]
fn missing_files_are_storage_errors() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        parse_file(InstrumentFormat::Labview, &dir.path().join("absent.csv")),
        Err(ParseError::StorageError(_))
    ));
}

#[test]
fn stored_potentiostat_measurement_is_normalized() {
    let upload = TestUpload::new();
    upload.archive.write_raw("cv.DTA", CV_DTA.as_bytes()).unwrap();
    let measurement = Section::new("PotentiostatMeasurement")
        .with("name", Value::string("CV 1"))
        .with("data_file", Value::string("cv.DTA"));
    create_archive(&upload.archive, &measurement, "cv.archive.json").unwrap();

    let mut stored = load_section(&upload.archive, "cv.archive.json").unwrap();
    assert!(normalize_potentiostat(&upload.archive, &mut stored));
    let cycle = stored.get("pretreatment").and_then(Value::as_section).unwrap();
    assert_eq!(cycle.m_def, "VoltammetryCycle");
    assert_eq!(stored.name(), Some("CV 1"));
}
