//! Instrument file parsers and measurement normalization.

pub mod gamry;
pub mod labview;
pub mod pl;
pub mod potentiostat;

pub use gamry::{parse_dta, voltammetry_cycle, GamryFile, GamryTable, HeaderValue, OCV_CURVE};
pub use labview::{parse_labview, ElectrolyserLog};
pub use pl::{parse_pl, PlSpectrum};
pub use potentiostat::normalize_potentiostat;

use crate::error::{ParseError, StorageError};
use crate::section::{Section, Value};
use std::path::Path;
use std::str::FromStr;

/// Supported instrument export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentFormat {
    /// Photoluminescence spectrum (IRIS export)
    Pl,
    /// Gamry potentiostat `.DTA`
    Dta,
    /// LabVIEW electrolyser log as CSV
    Labview,
}

impl FromStr for InstrumentFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pl" => Ok(Self::Pl),
            "dta" | "gamry" => Ok(Self::Dta),
            "labview" => Ok(Self::Labview),
            other => Err(ParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Parse instrument file content into a measurement record.
pub fn parse_text(format: InstrumentFormat, text: &str) -> Result<Section, ParseError> {
    match format {
        InstrumentFormat::Pl => Ok(parse_pl(text)?.to_section()),
        InstrumentFormat::Labview => Ok(parse_labview(text)?.to_section()),
        InstrumentFormat::Dta => {
            let file = parse_dta(text)?;
            let mut measurement = Section::new("PotentiostatMeasurement");
            if let Some(HeaderValue::Text(title)) = file.header.get("TITLE") {
                measurement.set("name", Value::string(title.clone()));
            }
            if let Some(curve) = file.tables.get(OCV_CURVE) {
                measurement.set("pretreatment", Value::Section(voltammetry_cycle(curve)));
            }
            Ok(measurement)
        }
    }
}

/// Read a local file (lossy UTF-8) and parse it.
pub fn parse_file(format: InstrumentFormat, path: &Path) -> Result<Section, ParseError> {
    let bytes = std::fs::read(path).map_err(StorageError::from)?;
    let mut section = parse_text(format, &String::from_utf8_lossy(&bytes))?;
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        section.set("data_file", Value::string(name));
    }
    Ok(section)
}
