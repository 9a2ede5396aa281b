//! Potentiostat measurement normalization

use crate::error::ParseError;
use crate::measurement::gamry::{parse_dta, voltammetry_cycle, OCV_CURVE};
use crate::section::{Section, Value};
use crate::store::ArchiveContext;
use std::path::Path;
use tracing::{debug, error};

fn is_dta(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("dta"))
}

fn pretreatment<C: ArchiveContext + ?Sized>(
    ctx: &C,
    data_file: &str,
) -> Result<Option<Section>, ParseError> {
    let bytes = ctx.read_raw(data_file)?;
    let file = parse_dta(&String::from_utf8_lossy(&bytes))?;
    Ok(file.tables.get(OCV_CURVE).map(voltammetry_cycle))
}

/// Fill `pretreatment` from the open circuit curve of the measurement's `.DTA`
/// data file. Returns whether the measurement changed.
///
/// Read and parse failures are logged; the measurement is left as it was.
pub fn normalize_potentiostat<C: ArchiveContext + ?Sized>(ctx: &C, measurement: &mut Section) -> bool {
    let Some(data_file) = measurement.get_str("data_file").map(str::to_string) else {
        return false;
    };
    if !is_dta(&data_file) {
        debug!(file = %data_file, "Not a Gamry file, skipping");
        return false;
    }
    match pretreatment(ctx, &data_file) {
        Ok(Some(cycle)) => {
            measurement.set("pretreatment", Value::Section(cycle));
            true
        }
        Ok(None) => false,
        Err(err) => {
            error!(
                normalizer = "PotentiostatMeasurement",
                file = %data_file,
                "{}",
                err
            );
            false
        }
    }
}
