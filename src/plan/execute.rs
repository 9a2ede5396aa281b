//! Plan executor: runs the two gated phases of a batch plan against an upload.

use crate::error::{PlanError, StorageError};
use crate::plan::instantiate::{
    check_preconditions, collect_solutions, create_processes, create_samples_and_batches,
    wire_processes, RecordSections, WiredProcess, WriteLog,
};
use crate::plan::materialize::{materialize, Materialization, ParameterFailure};
use crate::plan::setter::ValueSetter;
use crate::plan::summary::{splice_description, Summary, SummaryBuilder};
use crate::plan::types::{ExperimentalPlan, SolarCellProperties};
use crate::plan::variation::resolve_variations;
use crate::schema::SchemaRegistry;
use crate::section::Section;
use crate::store::{ArchiveContext, ReferenceResolver};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// What one execution did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub materialized: bool,
    pub records_created: bool,
    pub files_written: Vec<String>,
    /// Target files that already existed and were left untouched.
    pub files_skipped: Vec<String>,
    pub parameter_failures: Vec<ParameterFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_file: Option<String>,
}

fn report_error(err: PlanError) -> PlanError {
    error!(normalizer = "ExperimentalPlan", section = "system", "{}", err);
    err
}

/// Executes batch plans against one upload.
pub struct PlanExecutor<'a, C: ArchiveContext> {
    ctx: &'a C,
    schema: &'a SchemaRegistry,
    sections: RecordSections,
}

impl<'a, C: ArchiveContext> PlanExecutor<'a, C> {
    pub fn new(ctx: &'a C, schema: &'a SchemaRegistry) -> Self {
        Self {
            ctx,
            schema,
            sections: RecordSections::default(),
        }
    }

    pub fn with_sections(mut self, sections: RecordSections) -> Self {
        self.sections = sections;
        self
    }

    fn resolver(&self) -> &'a dyn ReferenceResolver {
        self.ctx
    }

    /// Run every phase whose flag is set.
    ///
    /// Precondition and parameter-shape errors leave the plan untouched. Flags
    /// are cleared only when their phase completes.
    pub fn execute(&self, plan: &mut ExperimentalPlan) -> Result<ExecutionReport, PlanError> {
        if plan.plan_is_created {
            return Err(report_error(PlanError::AlreadyCreated));
        }
        plan.number_of_subbatches().map_err(report_error)?;
        if let Some(properties) = plan.standard_plan.as_ref().map(SolarCellProperties::from) {
            plan.solar_cell_properties = Some(properties);
        }

        let mut report = ExecutionReport::default();

        if plan.load_standard_processes {
            info!(steps = plan.plan.len(), "Materializing standard processes");
            let materialization = self.expand(plan).map_err(report_error)?;
            report.parameter_failures = materialization.failures.clone();
            materialization.commit(&mut plan.plan);
            plan.load_standard_processes = false;
            report.materialized = true;
        }

        if plan.create_samples_and_processes {
            self.create_records(plan, &mut report).map_err(report_error)?;
        }

        Ok(report)
    }

    /// Resolve variations and materialize every step without touching the plan.
    pub fn expand(&self, plan: &ExperimentalPlan) -> Result<Materialization, PlanError> {
        let subbatches = plan.number_of_subbatches()?;
        let variations = resolve_variations(&plan.plan, subbatches)?;
        let templates = self.templates(plan)?;
        let setter = ValueSetter::new(self.schema, self.resolver());
        let materialization = materialize(&plan.plan, &templates, &variations, &setter);
        info!(
            subbatches,
            failures = materialization.failures.len(),
            "Plan materialized"
        );
        Ok(materialization)
    }

    fn templates(&self, plan: &ExperimentalPlan) -> Result<Vec<Section>, PlanError> {
        plan.plan
            .iter()
            .enumerate()
            .map(|(index, step)| -> Result<Section, PlanError> {
                let reference = step
                    .process_reference
                    .as_deref()
                    .filter(|r| !r.is_empty())
                    .ok_or(PlanError::MissingTemplate(index))?;
                Ok(self.resolver().resolve(reference)?)
            })
            .collect()
    }

    fn create_records(
        &self,
        plan: &mut ExperimentalPlan,
        report: &mut ExecutionReport,
    ) -> Result<(), PlanError> {
        let (batch_id, lab_id, properties) = check_preconditions(plan)?;
        let mut log = WriteLog::default();

        create_samples_and_batches(
            self.ctx,
            plan,
            &batch_id,
            &lab_id,
            &properties,
            &self.sections,
            &mut log,
        )?;
        let wired = wire_processes(self.ctx.upload_id(), plan, &lab_id);
        create_processes(self.ctx, &wired, &mut log)?;
        info!(
            written = log.written.len(),
            skipped = log.skipped.len(),
            "Samples, batches and processes created"
        );

        let summary_file = self.write_summary(plan, &lab_id, &wired)?;

        plan.create_samples_and_processes = false;
        plan.plan_is_created = true;
        report.records_created = true;
        report.files_written = log.written;
        report.files_skipped = log.skipped;
        report.summary_file = Some(summary_file);
        Ok(())
    }

    /// Rebuild the summary from the plan's materialized processes; no records are written.
    pub fn rebuild_summary(&self, plan: &mut ExperimentalPlan) -> Result<ExecutionReport, PlanError> {
        let lab_id = plan
            .batch_lab_id()
            .ok_or_else(|| report_error(PlanError::MissingBatchId))?;
        let wired = wire_processes(self.ctx.upload_id(), plan, &lab_id);
        let summary_file = self.write_summary(plan, &lab_id, &wired)?;
        Ok(ExecutionReport {
            summary_file: Some(summary_file),
            ..Default::default()
        })
    }

    fn write_summary(
        &self,
        plan: &mut ExperimentalPlan,
        lab_id: &str,
        wired: &[WiredProcess],
    ) -> Result<String, StorageError> {
        let mut builder = SummaryBuilder::new(self.schema, self.resolver(), lab_id);
        for process in wired {
            builder.add_process(process);
        }
        let solutions = collect_solutions(wired, self.resolver());
        let summary = builder.finish(&solutions);

        let file_name = Summary::file_name(lab_id);
        self.ctx.write_raw(&file_name, summary.document.as_bytes())?;
        plan.description = Some(splice_description(plan.description.as_deref(), &summary.block));
        plan.batch_plan_pdf = Some(file_name.clone());
        info!(file = %file_name, "Summary written");
        Ok(file_name)
    }
}
