//! Config loader: builds the layered configuration.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::LabplanConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Loads `LabplanConfig` from defaults, files and the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{LABPLAN_ENV}.toml`, `LABPLAN__*`
    /// environment variables. Relative paths resolve against `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<LabplanConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: LabplanConfig = builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(config.resolve_paths(workspace_root))
    }

    /// Load configuration from one file on top of the defaults.
    ///
    /// Relative paths resolve against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<LabplanConfig, ConfigError> {
        let config: LabplanConfig = builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_paths(base))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix("LABPLAN")
            .prefix_separator("__")
            .separator("__")
    }
}
