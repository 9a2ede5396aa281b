//! Schema command presentation.

use crate::error::{ApiError, StorageError};
use crate::schema::{FieldDef, FieldKind, SchemaRegistry, SectionDef, SectionRole};
use comfy_table::Table;
use serde_json::json;

fn role(role: SectionRole) -> &'static str {
    match role {
        SectionRole::Plain => "",
        SectionRole::SolutionHolder => "solution holder",
        SectionRole::PureSubstance => "pure substance",
    }
}

fn kind(field: &FieldDef) -> String {
    match &field.kind {
        FieldKind::Quantity { dtype, unit, array } => {
            let mut kind = format!("{:?}", dtype).to_lowercase();
            if *array {
                kind.push_str("[]");
            }
            match unit {
                Some(unit) => format!("{} ({})", kind, unit),
                None => kind,
            }
        }
        FieldKind::SubSection {
            section, repeats, ..
        } => {
            if *repeats {
                format!("[{}]", section)
            } else {
                section.clone()
            }
        }
        FieldKind::Reference { section } => format!("-> {}", section),
    }
}

pub fn format_schema_list_text(registry: &SchemaRegistry) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Section", "Extends", "Role", "Fields"]);
    let mut total = 0;
    for name in registry.names() {
        if let Some(def) = registry.get(name) {
            table.add_row(vec![
                def.name.clone(),
                def.extends.clone().unwrap_or_default(),
                role(def.role).to_string(),
                registry.fields(name).len().to_string(),
            ]);
            total += 1;
        }
    }
    format!("{}\nTotal: {} section(s)\n", table, total)
}

pub fn format_schema_list_json(registry: &SchemaRegistry) -> Result<String, ApiError> {
    let names: Vec<&str> = registry.names().collect();
    serde_json::to_string_pretty(&json!({ "sections": names, "total": names.len() }))
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e)))
}

pub fn format_section_def_text(def: &SectionDef, fields: &[&FieldDef]) -> String {
    let mut output = format!("Section: {}\n", def.name);
    if let Some(base) = &def.extends {
        output.push_str(&format!("Extends: {}\n", base));
    }
    if def.role != SectionRole::Plain {
        output.push_str(&format!("Role: {}\n", role(def.role)));
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Field", "Kind"]);
    for field in fields {
        table.add_row(vec![field.name.clone(), kind(field)]);
    }
    output.push_str(&table.to_string());
    output.push('\n');
    output
}

pub fn format_section_def_json(def: &SectionDef, fields: &[&FieldDef]) -> Result<String, ApiError> {
    serde_json::to_string_pretty(&json!({
        "name": def.name,
        "extends": def.extends,
        "role": def.role,
        "fields": fields,
    }))
    .map_err(|e| ApiError::StorageError(StorageError::Serialization(e)))
}
