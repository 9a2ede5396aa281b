//! LabVIEW electrolyser logs exported as CSV
//!
//! Only the known `READ_*` channels are kept. Missing channels stay unset.

use crate::error::ParseError;
use crate::section::{Section, Series, Value};
use chrono::{DateTime, SecondsFormat};
use std::collections::BTreeMap;
use tracing::debug;

/// Channel name, target field, unit
const CHANNELS: &[(&str, &str, &str)] = &[
    ("READ_0_Time", "time", "s"),
    ("READ_H2_Flow", "h2_flow", "ml/minute"),
    ("READ_O2_Flow", "o2_flow", "ml/minute"),
    ("READ_RTD0_A-in", "anode_in", "°C"),
    ("READ_RTD1_C-in", "cathode_in", "°C"),
    ("READ_RTD2_A-out", "anode_out", "°C"),
    ("READ_RTD3_C-out", "cathode_out", "°C"),
    ("READ_RTD4_amb", "ambient", "°C"),
    ("READ_RTD5_EC-A", "electrolyser_cell_anode", "°C"),
    ("READ_RTD6_EC-C", "electrolyser_cell_cathode", "°C"),
];

const TIMESTAMP_CHANNEL: &str = "READ_Timestamp";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectrolyserLog {
    /// Field name to values, in the channel's unit
    pub channels: BTreeMap<&'static str, Vec<f64>>,
    /// RFC 3339, UTC
    pub timestamps: Vec<String>,
}

fn parse_value(channel: &str, row: usize, value: &str) -> Result<f64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        context: format!("{} row {}", channel, row + 2),
        value: value.to_string(),
    })
}

fn timestamp(row: usize, value: &str) -> Result<String, ParseError> {
    let seconds = parse_value(TIMESTAMP_CHANNEL, row, value)?;
    let nanos = (seconds.fract() * 1e9).round() as u32;
    DateTime::from_timestamp(seconds.trunc() as i64, nanos.min(999_999_999))
        .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .ok_or_else(|| ParseError::InvalidNumber {
            context: format!("{} row {}", TIMESTAMP_CHANNEL, row + 2),
            value: value.to_string(),
        })
}

pub fn parse_labview(text: &str) -> Result<ElectrolyserLog, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let index = |name: &str| headers.iter().position(|h| h == name);

    let columns: Vec<(&'static str, &'static str, usize)> = CHANNELS
        .iter()
        .filter_map(|&(channel, field, _)| index(channel).map(|i| (channel, field, i)))
        .collect();
    let timestamp_column = index(TIMESTAMP_CHANNEL);

    let mut log = ElectrolyserLog::default();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for &(channel, field, i) in &columns {
            let value = parse_value(channel, row, record.get(i).unwrap_or_default())?;
            log.channels.entry(field).or_default().push(value);
        }
        if let Some(i) = timestamp_column {
            log.timestamps
                .push(timestamp(row, record.get(i).unwrap_or_default())?);
        }
    }
    debug!(channels = log.channels.len(), "LabVIEW log parsed");
    Ok(log)
}

impl ElectrolyserLog {
    pub fn to_section(&self) -> Section {
        let mut section = Section::new("ElectrolyserLog");
        for (_, field, unit) in CHANNELS {
            if let Some(values) = self.channels.get(field) {
                section.set(field, Value::Series(Series::new(values.clone(), Some(*unit))));
            }
        }
        if !self.timestamps.is_empty() {
            section.set(
                "timestamp",
                Value::List(self.timestamps.iter().map(Value::string).collect()),
            );
        }
        section
    }
}
