//! Integration tests for labplan

mod archive_store;
mod cli_routes;
mod config_integration;
mod measurement_parsing;
mod plan_execution;
pub mod test_utils;
