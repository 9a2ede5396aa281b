//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, PlanError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::PlanError(PlanError::AlreadyCreated) => format!(
            "{}\nThe plan file was left unchanged; reset plan_is_created to run it again.",
            e
        ),
        _ => e.to_string(),
    }
}
