//! CLI presentation: text and json formatters per command family.

mod measurement;
mod plan;
mod schema;

pub use measurement::{format_section_json, format_section_text};
pub use plan::{
    format_execution_report_json, format_execution_report_text, format_expansion_json,
    format_expansion_text,
};
pub use schema::{
    format_schema_list_json, format_schema_list_text, format_section_def_json,
    format_section_def_text,
};
