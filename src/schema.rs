//! Section definitions
//!
//! The schema registry answers "is this field declared on this section type, and
//! what kind of field is it" without reflection. Definitions form single-inheritance
//! chains through `extends`; lookups walk the chain base-first.

mod builtin;
pub mod units;

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Element type of a quantity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Str,
    Float,
    Int,
    Bool,
    Datetime,
}

/// What a field holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Quantity {
        dtype: DType,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        array: bool,
    },
    SubSection {
        section: String,
        #[serde(default)]
        repeats: bool,
        /// Unset placeholders are instantiated empty when a path descends through them.
        #[serde(default)]
        placeholder: bool,
    },
    Reference {
        section: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Behaviour a section type has during path descent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionRole {
    #[default]
    Plain,
    /// Holds a `solution` reference that is snapshotted into `solution_details`
    /// before any edit below it.
    SolutionHolder,
    PureSubstance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDef {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub role: SectionRole,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Extra definitions file layout (`[[sections]]` tables)
#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    sections: Vec<SectionDef>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    defs: BTreeMap<String, SectionDef>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the materials-science ELN definitions.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for def in builtin::definitions() {
            registry.register(def);
        }
        registry
    }

    pub fn register(&mut self, def: SectionDef) {
        self.defs.insert(def.name.clone(), def);
    }

    /// Merge definitions from a TOML file; later definitions replace earlier ones.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ApiError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to read schema file {:?}: {}", path, e))
        })?;
        let file: DefinitionFile = toml::from_str(&raw).map_err(|e| {
            ApiError::ConfigError(format!("Invalid schema file {:?}: {}", path, e))
        })?;
        let count = file.sections.len();
        for def in file.sections {
            self.register(def);
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&SectionDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    /// Role of a section type, inherited through `extends` when not set locally.
    pub fn role(&self, name: &str) -> SectionRole {
        self.chain(name)
            .into_iter()
            .rev()
            .map(|def| def.role)
            .find(|role| *role != SectionRole::Plain)
            .unwrap_or_default()
    }

    /// Whether `name` is `ancestor` or inherits from it.
    pub fn is_a(&self, name: &str, ancestor: &str) -> bool {
        self.chain(name).iter().any(|def| def.name == ancestor)
    }

    /// Declared field, searching the inheritance chain (most derived wins).
    pub fn field(&self, section: &str, field: &str) -> Option<&FieldDef> {
        self.chain(section)
            .into_iter()
            .rev()
            .find_map(|def| def.fields.iter().find(|f| f.name == field))
    }

    /// All declared fields in declaration order, base definitions first.
    pub fn fields(&self, section: &str) -> Vec<&FieldDef> {
        let mut out: Vec<&FieldDef> = Vec::new();
        for def in self.chain(section) {
            for field in &def.fields {
                if let Some(pos) = out.iter().position(|f| f.name == field.name) {
                    out[pos] = field;
                } else {
                    out.push(field);
                }
            }
        }
        out
    }

    /// Definitions from the root base down to `name`. Empty when unknown.
    fn chain(&self, name: &str) -> Vec<&SectionDef> {
        let mut chain = Vec::new();
        let mut current = self.defs.get(name);
        while let Some(def) = current {
            if chain.iter().any(|d: &&SectionDef| d.name == def.name) {
                break;
            }
            chain.push(def);
            current = def.extends.as_deref().and_then(|base| self.defs.get(base));
        }
        chain.reverse();
        chain
    }
}
