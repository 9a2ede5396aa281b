//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_execution_report_json, format_execution_report_text, format_expansion_json,
    format_expansion_text, format_schema_list_json, format_schema_list_text,
    format_section_def_json, format_section_def_text, format_section_json, format_section_text,
};
pub use route::RunContext;
