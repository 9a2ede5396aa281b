//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("archive.upload_root", ".")?
        .set_default("archive.upload_id", "local-upload")?
        .set_default("records.sample_section", "SolarCellSample")?
        .set_default("records.batch_section", "SolarCellBatch")
}
