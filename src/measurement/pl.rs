//! Photoluminescence spectrometer exports (IRIS glovebox setup)
//!
//! The file starts with a `Labels` row, followed by 21 `label,value` header rows
//! and the spectrum as `wavelength,intensity` rows from line 23 on.

use crate::error::ParseError;
use crate::section::{Quantity, Section, Series, Value};
use tracing::debug;

pub const IRIS_INSTRUMENT: &str = "IRIS HZBGloveBoxes";

const HEADER_ROWS: usize = 21;
const DATA_START: usize = 22;

#[derive(Debug, Clone, PartialEq)]
pub struct PlSpectrum {
    pub name: String,
    pub wavelength_start: f64,
    pub wavelength_stop: f64,
    pub wavelength_step_size: f64,
    pub integration_time: f64,
    pub temperature: f64,
    pub number_of_averages: f64,
    pub lamp: String,
    pub wavelength: Vec<f64>,
    pub intensity: Vec<f64>,
}

fn csv_rows(text: &str) -> Result<Vec<csv::StringRecord>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }
    Ok(rows)
}

fn number(context: &str, value: &str) -> Result<f64, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        context: context.to_string(),
        value: value.to_string(),
    })
}

/// Whether `text` looks like an IRIS export.
pub fn is_iris(text: &str) -> bool {
    text.starts_with("Labels")
}

/// Parse an IRIS photoluminescence export.
pub fn parse_pl(text: &str) -> Result<PlSpectrum, ParseError> {
    if !is_iris(text) {
        return Err(ParseError::UnknownFormat(
            "photoluminescence file does not start with Labels".to_string(),
        ));
    }
    let text = text.replace('²', "^2");
    let lines: Vec<&str> = text.lines().collect();

    let header = csv_rows(&lines[..HEADER_ROWS.min(lines.len())].join("\n"))?;
    let field = |row: usize, label: &'static str| -> Result<String, ParseError> {
        header
            .get(row)
            .and_then(|record| record.get(1))
            .map(str::to_string)
            .ok_or(ParseError::MissingHeader { row, label })
    };
    let numeric = |row: usize, label: &'static str| -> Result<f64, ParseError> {
        number(label, &field(row, label)?)
    };

    let mut wavelength = Vec::new();
    let mut intensity = Vec::new();
    if lines.len() > DATA_START {
        for (i, record) in csv_rows(&lines[DATA_START..].join("\n"))?.iter().enumerate() {
            let (Some(w), Some(v)) = (record.get(0), record.get(1)) else {
                continue;
            };
            if w.is_empty() {
                continue;
            }
            let context = format!("data row {}", DATA_START + i + 1);
            wavelength.push(number(&context, w)?);
            intensity.push(number(&context, v)?);
        }
    }

    let spectrum = PlSpectrum {
        name: field(0, "name")?,
        wavelength_start: numeric(3, "wavelength_start")?,
        wavelength_stop: numeric(4, "wavelength_stop")?,
        wavelength_step_size: numeric(5, "wavelength_step_size")?,
        number_of_averages: numeric(12, "number_of_averages")?,
        integration_time: numeric(13, "integration_time")?,
        lamp: field(14, "lamp")?,
        temperature: numeric(15, "temperature")?,
        wavelength,
        intensity,
    };
    debug!(name = %spectrum.name, points = spectrum.wavelength.len(), "PL spectrum parsed");
    Ok(spectrum)
}

impl PlSpectrum {
    /// `PLMeasurement` record with properties and data.
    pub fn to_section(&self) -> Section {
        let quantity = |value: f64, unit: &str| {
            Value::Quantity(Quantity {
                value,
                unit: unit.to_string(),
            })
        };
        let properties = Section::new("PLProperties")
            .with("wavelength_start", quantity(self.wavelength_start, "nm"))
            .with("wavelength_stop", quantity(self.wavelength_stop, "nm"))
            .with("wavelength_step_size", quantity(self.wavelength_step_size, "nm"))
            .with("integration_time", quantity(self.integration_time, "ms"))
            .with("temperature", quantity(self.temperature, "°C"))
            .with(
                "number_of_averages",
                Value::Scalar(
                    serde_json::Number::from_f64(self.number_of_averages)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null),
                ),
            )
            .with("lamp", Value::string(self.lamp.clone()));
        let data = Section::new("PLData")
            .with(
                "wavelength",
                Value::Series(Series::new(self.wavelength.clone(), Some("nm"))),
            )
            .with(
                "intensity",
                Value::Series(Series::new(self.intensity.clone(), None)),
            );
        Section::new("PLMeasurement")
            .with("name", Value::string(self.name.clone()))
            .with("instrument", Value::string(IRIS_INSTRUMENT))
            .with("properties", Value::Section(properties))
            .with("data", Value::Section(data))
    }
}
