//! Parse command presentation: measurement records.

use crate::error::{ApiError, StorageError};
use crate::section::{Section, Value};

pub fn format_section_json(section: &Section) -> Result<String, ApiError> {
    serde_json::to_string_pretty(section)
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e)))
}

fn push_fields(output: &mut String, section: &Section, indent: usize) {
    for (field, value) in &section.fields {
        match value {
            Value::Section(sub) => {
                output.push_str(&format!("{:indent$}{}:\n", "", field, indent = indent));
                push_fields(output, sub, indent + 2);
            }
            other => output.push_str(&format!(
                "{:indent$}{}: {}\n",
                "",
                field,
                other,
                indent = indent
            )),
        }
    }
}

pub fn format_section_text(section: &Section) -> String {
    let mut output = format!("{}\n", section.m_def);
    push_fields(&mut output, section, 2);
    output
}
