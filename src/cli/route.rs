//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::config::{validation_failure, ConfigLoader, LabplanConfig};
use crate::error::ApiError;
use crate::measurement::{normalize_potentiostat, parse_file, InstrumentFormat};
use crate::plan::{ExperimentalPlan, PlanExecutor};
use crate::schema::SchemaRegistry;
use crate::store::{load_archive, load_section, save_archive, DirectoryArchive};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_execution_report_json, format_execution_report_text, format_expansion_json,
    format_expansion_text, format_schema_list_json, format_schema_list_text,
    format_section_def_json, format_section_def_text, format_section_json, format_section_text,
};

/// Runtime context for CLI execution: configuration, schema and the upload.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: LabplanConfig,
    schema: SchemaRegistry,
    archive: DirectoryArchive,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: LabplanConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| validation_failure(&errors))?;
        let schema = config.schema_registry()?;
        let archive = config.open_archive()?;
        debug!(
            upload_root = %archive.root().display(),
            upload_id = %config.archive.upload_id,
            "Run context ready"
        );
        Ok(Self {
            workspace_root,
            config,
            schema,
            archive,
        })
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    pub fn config(&self) -> &LabplanConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Execute { plan, format } => self.handle_execute(plan, format),
            Commands::Expand { plan, format } => self.handle_expand(plan, format),
            Commands::Summary { plan } => self.handle_summary(plan),
            Commands::Parse { kind, file, format } => self.handle_parse(kind, file, format),
            Commands::Normalize { measurement } => self.handle_normalize(measurement),
            Commands::Schema { section, format } => self.handle_schema(section.as_deref(), format),
        }
    }

    fn executor(&self) -> PlanExecutor<'_, DirectoryArchive> {
        PlanExecutor::new(&self.archive, &self.schema).with_sections(self.config.record_sections())
    }

    fn load_plan(&self, plan_file: &str) -> Result<ExperimentalPlan, ApiError> {
        Ok(load_archive(&self.archive, plan_file)?)
    }

    /// Persist the plan when the run changed it.
    fn save_if_changed(
        &self,
        plan_file: &str,
        before: &ExperimentalPlan,
        after: &ExperimentalPlan,
    ) -> Result<(), ApiError> {
        if before != after {
            save_archive(&self.archive, after, plan_file)?;
            info!(file = plan_file, "Plan saved");
        }
        Ok(())
    }

    fn handle_execute(&self, plan_file: &str, format: &str) -> Result<String, ApiError> {
        let original = self.load_plan(plan_file)?;
        let mut plan = original.clone();
        let result = self.executor().execute(&mut plan);
        self.save_if_changed(plan_file, &original, &plan)?;
        let report = result?;
        if format == "json" {
            format_execution_report_json(&report)
        } else {
            Ok(format_execution_report_text(&report))
        }
    }

    fn handle_expand(&self, plan_file: &str, format: &str) -> Result<String, ApiError> {
        let plan = self.load_plan(plan_file)?;
        let expansion = self.executor().expand(&plan)?;
        if format == "json" {
            format_expansion_json(&plan.plan, &expansion)
        } else {
            Ok(format_expansion_text(&plan.plan, &expansion))
        }
    }

    fn handle_summary(&self, plan_file: &str) -> Result<String, ApiError> {
        let original = self.load_plan(plan_file)?;
        let mut plan = original.clone();
        let result = self.executor().rebuild_summary(&mut plan);
        self.save_if_changed(plan_file, &original, &plan)?;
        Ok(format_execution_report_text(&result?))
    }

    fn handle_parse(&self, kind: &str, file: &PathBuf, format: &str) -> Result<String, ApiError> {
        let instrument: InstrumentFormat = kind.parse()?;
        let section = parse_file(instrument, file)?;
        if format == "json" {
            format_section_json(&section)
        } else {
            Ok(format_section_text(&section))
        }
    }

    fn handle_normalize(&self, measurement_file: &str) -> Result<String, ApiError> {
        let mut measurement = load_section(&self.archive, measurement_file)?;
        if !normalize_potentiostat(&self.archive, &mut measurement) {
            return Ok(format!("{}: nothing to normalize\n", measurement_file));
        }
        save_archive(&self.archive, &measurement, measurement_file)?;
        info!(file = measurement_file, "Measurement normalized");
        Ok(format_section_text(&measurement))
    }

    fn handle_schema(&self, section: Option<&str>, format: &str) -> Result<String, ApiError> {
        let Some(name) = section else {
            return if format == "json" {
                format_schema_list_json(&self.schema)
            } else {
                Ok(format_schema_list_text(&self.schema))
            };
        };
        let def = self
            .schema
            .get(name)
            .ok_or_else(|| ApiError::UnknownSection(name.to_string()))?;
        let fields = self.schema.fields(name);
        if format == "json" {
            format_section_def_json(def, &fields)
        } else {
            Ok(format_section_def_text(def, &fields))
        }
    }
}
