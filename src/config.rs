//! Configuration System
//!
//! Layered configuration: built-in defaults, a global file, workspace files and
//! `LABPLAN__SECTION__KEY` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::plan::RecordSections;
use crate::schema::SchemaRegistry;
use crate::store::DirectoryArchive;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabplanConfig {
    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub records: RecordsConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The upload the plan engine works in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding the upload's raw files
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,

    /// Upload id used for entry ids and references
    #[serde(default = "default_upload_id")]
    pub upload_id: String,
}

fn default_upload_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_upload_id() -> String {
    "local-upload".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            upload_id: default_upload_id(),
        }
    }
}

/// Section definitions used for created samples and batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsConfig {
    #[serde(default = "default_sample_section")]
    pub sample_section: String,

    #[serde(default = "default_batch_section")]
    pub batch_section: String,
}

fn default_sample_section() -> String {
    "SolarCellSample".to_string()
}

fn default_batch_section() -> String {
    "SolarCellBatch".to_string()
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            sample_section: default_sample_section(),
            batch_section: default_batch_section(),
        }
    }
}

impl From<&RecordsConfig> for RecordSections {
    fn from(records: &RecordsConfig) -> Self {
        Self {
            sample: records.sample_section.clone(),
            batch: records.batch_section.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Extra TOML definition files merged over the built-in registry
    #[serde(default)]
    pub definitions: Vec<PathBuf>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Archive(String),
    Records(String),
    Schema(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Archive(msg) => write!(f, "Archive: {}", msg),
            ValidationError::Records(msg) => write!(f, "Records: {}", msg),
            ValidationError::Schema(msg) => write!(f, "Schema: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl LabplanConfig {
    /// Make relative paths relative to `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.archive.upload_root = resolve(base, &self.archive.upload_root);
        self.schema.definitions = self
            .schema
            .definitions
            .iter()
            .map(|p| resolve(base, p))
            .collect();
        if self.logging.file.is_relative() {
            self.logging.file = base.join(&self.logging.file);
        }
        self
    }

    /// Validate the entire configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.archive.upload_id.trim().is_empty() {
            errors.push(ValidationError::Archive("Upload id cannot be empty".to_string()));
        }
        if self.archive.upload_root.as_os_str().is_empty() {
            errors.push(ValidationError::Archive("Upload root cannot be empty".to_string()));
        }
        if self.records.sample_section.trim().is_empty() {
            errors.push(ValidationError::Records(
                "Sample section cannot be empty".to_string(),
            ));
        }
        if self.records.batch_section.trim().is_empty() {
            errors.push(ValidationError::Records(
                "Batch section cannot be empty".to_string(),
            ));
        }
        for path in &self.schema.definitions {
            if !path.is_file() {
                errors.push(ValidationError::Schema(format!(
                    "Definition file not found: {}",
                    path.display()
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Built-in registry plus the configured definition files.
    pub fn schema_registry(&self) -> Result<SchemaRegistry, ApiError> {
        let mut registry = SchemaRegistry::builtin();
        for path in &self.schema.definitions {
            registry.load_file(path)?;
        }
        Ok(registry)
    }

    pub fn open_archive(&self) -> Result<DirectoryArchive, ApiError> {
        Ok(DirectoryArchive::new(
            &self.archive.upload_root,
            &self.archive.upload_id,
        )?)
    }

    pub fn record_sections(&self) -> RecordSections {
        RecordSections::from(&self.records)
    }
}

/// Join validation errors into one `ApiError`.
pub fn validation_failure(errors: &[ValidationError]) -> ApiError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ApiError::ConfigError(format!(
        "Configuration validation failed:\n{}",
        messages.join("\n")
    ))
}
