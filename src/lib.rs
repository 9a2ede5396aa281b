//! Labplan: experiment batch plans for materials-science ELN uploads
//!
//! Expands a templated process plan into per-subbatch processes, creates the
//! sample, batch and process records in an upload, and renders a batch summary.
//! Also parses the instrument exports the measurement records point at.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod plan;
pub mod schema;
pub mod section;
pub mod store;
