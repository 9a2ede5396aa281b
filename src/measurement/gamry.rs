//! Gamry potentiostat `.DTA` files
//!
//! Header lines are `KEY<TAB>TYPE<TAB>VALUE[<TAB>description]`. Curves are
//! `NAME<TAB>TABLE<TAB>rows` blocks followed by a column row, a unit row and the
//! data rows, each indented by one tab.

use crate::error::ParseError;
use crate::section::{Section, Series, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the open circuit pretreatment curve
pub const OCV_CURVE: &str = "OCVCURVE";

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Number(f64),
    Toggle(bool),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamryTable {
    pub columns: Vec<String>,
    pub units: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl GamryTable {
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).copied().unwrap_or(f64::NAN))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamryFile {
    pub header: BTreeMap<String, HeaderValue>,
    pub tables: BTreeMap<String, GamryTable>,
}

/// Gamry writes locale decimals; accept both separators.
fn gamry_number(value: &str) -> Option<f64> {
    let value = value.trim();
    value
        .parse()
        .ok()
        .or_else(|| value.replace(',', ".").parse().ok())
}

fn header_value(kind: &str, fields: &[&str]) -> HeaderValue {
    let first = fields.first().map(|v| v.trim()).unwrap_or_default();
    match kind {
        "QUANT" | "IQUANT" | "POTEN" => gamry_number(first)
            .map(HeaderValue::Number)
            .unwrap_or_else(|| HeaderValue::Text(first.to_string())),
        "TOGGLE" => HeaderValue::Toggle(first == "T"),
        _ => HeaderValue::Text(first.to_string()),
    }
}

fn table_row(line: &str) -> Vec<&str> {
    line.strip_prefix('\t')
        .unwrap_or(line)
        .split('\t')
        .map(str::trim)
        .collect()
}

pub fn parse_dta(text: &str) -> Result<GamryFile, ParseError> {
    let mut file = GamryFile::default();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        if line.trim().is_empty() || line.starts_with('\t') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let key = fields[0].trim();
        let kind = fields.get(1).map(|k| k.trim()).unwrap_or_default();

        if kind != "TABLE" {
            let value = match fields.get(2..) {
                Some(rest) if !rest.is_empty() => header_value(kind, rest),
                _ => HeaderValue::Text(kind.to_string()),
            };
            file.header.insert(key.to_string(), value);
            continue;
        }

        let malformed = |message: &str| ParseError::MalformedTable {
            table: key.to_string(),
            message: message.to_string(),
        };
        let expected: Option<usize> = fields.get(2).and_then(|n| n.trim().parse().ok());
        let columns = lines
            .next()
            .map(table_row)
            .ok_or_else(|| malformed("missing column row"))?;
        let units = lines
            .next()
            .map(table_row)
            .ok_or_else(|| malformed("missing unit row"))?;

        let mut table = GamryTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            units: units.iter().map(|u| u.to_string()).collect(),
            rows: Vec::new(),
        };
        while expected.map_or(true, |n| table.rows.len() < n) {
            let Some(row) = lines.next_if(|l| l.starts_with('\t')) else {
                break;
            };
            let values = table_row(row)
                .into_iter()
                .map(|v| {
                    gamry_number(v).ok_or_else(|| ParseError::InvalidNumber {
                        context: format!("table {}", key),
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, ParseError>>()?;
            table.rows.push(values);
        }
        debug!(table = key, rows = table.rows.len(), "Gamry table parsed");
        file.tables.insert(key.to_string(), table);
    }
    Ok(file)
}

/// `VoltammetryCycle` from a curve with `T`, `Vf` and `Im` columns; current in mA.
pub fn voltammetry_cycle(table: &GamryTable) -> Section {
    let mut cycle = Section::new("VoltammetryCycle");
    if let Some(time) = table.column("T") {
        cycle.set("time", Value::Series(Series::new(time, Some("s"))));
    }
    if let Some(voltage) = table.column("Vf") {
        cycle.set("voltage", Value::Series(Series::new(voltage, Some("V"))));
    }
    if let Some(current) = table.column("Im") {
        let milliamps = current.into_iter().map(|a| a * 1000.0).collect();
        cycle.set("current", Value::Series(Series::new(milliamps, Some("mA"))));
    }
    cycle
}
