//! Workspace config files: `config/config.toml`, then `config/{LABPLAN_ENV}.toml`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

const ENV_VAR: &str = "LABPLAN_ENV";
const DEFAULT_ENV: &str = "development";

/// Candidate files in increasing precedence; missing ones are skipped.
pub fn workspace_config_paths(workspace_root: &Path) -> [PathBuf; 2] {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string());
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(workspace_config_paths(workspace_root)
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
