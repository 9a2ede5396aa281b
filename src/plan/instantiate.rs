//! Sample, batch and process record creation

use crate::error::{PlanError, StorageError};
use crate::plan::types::{ExperimentalPlan, ReadableIdentifiers, SolarCellProperties};
use crate::section::{Section, Value};
use crate::store::{create_archive, entry_id, reference, ArchiveContext, ReferenceResolver};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Section definitions used for created samples and batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSections {
    pub sample: String,
    pub batch: String,
}

impl Default for RecordSections {
    fn default() -> Self {
        Self {
            sample: "SolarCellSample".to_string(),
            batch: "SolarCellBatch".to_string(),
        }
    }
}

/// Files touched while creating records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteLog {
    pub written: Vec<String>,
    /// Already present; left untouched.
    pub skipped: Vec<String>,
}

impl WriteLog {
    fn create<C: ArchiveContext + ?Sized>(
        &mut self,
        ctx: &C,
        section: &Section,
        file_name: &str,
    ) -> Result<(), StorageError> {
        if create_archive(ctx, section, file_name)? {
            self.written.push(file_name.to_string());
        } else {
            self.skipped.push(file_name.to_string());
        }
        Ok(())
    }
}

/// A materialized process wired to its samples or batch, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct WiredProcess {
    pub step: usize,
    pub subbatch: usize,
    /// Batch id the process belongs to (`{lab_id}` or `{lab_id}_{subbatch}`).
    pub scope: String,
    pub file_name: String,
    pub process: Section,
}

fn composite_reference(reference: String) -> Value {
    Value::Section(Section::new("CompositeSystemReference").with("reference", Value::string(reference)))
}

/// Create one sample per substrate plus subbatch and batch records.
///
/// Returns the sample references grouped by subbatch.
pub fn create_samples_and_batches<C: ArchiveContext + ?Sized>(
    ctx: &C,
    plan: &ExperimentalPlan,
    batch_id: &ReadableIdentifiers,
    lab_id: &str,
    properties: &SolarCellProperties,
    sections: &RecordSections,
    log: &mut WriteLog,
) -> Result<Vec<Vec<String>>, StorageError> {
    let subbatches = plan.number_of_substrates / plan.substrates_per_subbatch.max(1);
    let short_name = batch_id.short_name.clone().unwrap_or_default();
    let description = plan.description.as_deref().filter(|d| !d.is_empty());
    let upload_id = ctx.upload_id().to_string();

    let base = |m_def: &str, name: String, lab: String| {
        let mut section = Section::new(m_def)
            .with("name", Value::string(name))
            .with("lab_id", Value::string(lab));
        if let Some(datetime) = plan.datetime_value() {
            section.set("datetime", datetime);
        }
        if let Some(description) = description {
            section.set_str("description", description);
        }
        section
    };

    let mut sample_refs = Vec::new();
    for i in 0..subbatches {
        let mut subbatch_refs = Vec::new();
        for j in 0..plan.substrates_per_subbatch {
            let sample_lab = format!("{}_{}_{}", lab_id, i, j);
            let file_name = format!("{}.archive.json", sample_lab);
            let identifiers = batch_id.derive(format!("{}_{}_{}", short_name, i, j), sample_lab.clone());

            let mut sample = base(
                &sections.sample,
                format!("{} {}", plan.name, sample_lab),
                sample_lab,
            )
            .with("sample_id", Value::Section(identifiers.to_section()));
            if let Some(substrate) = &properties.substrate {
                sample.set_str("substrate", substrate.clone());
            }
            if let Some(architecture) = &properties.architecture {
                sample.set_str("architecture", architecture.clone());
            }

            log.create(ctx, &sample, &file_name)?;
            subbatch_refs.push(reference(&upload_id, &entry_id(&upload_id, &file_name)));
        }

        if plan.substrates_per_subbatch > 1 {
            let subbatch_lab = format!("{}_{}", lab_id, i);
            let file_name = format!("{}.archive.json", subbatch_lab);
            let identifiers = batch_id.derive(format!("{}_{}", short_name, i), subbatch_lab.clone());
            let subbatch = base(
                &sections.batch,
                format!("{} {}", plan.name, subbatch_lab),
                subbatch_lab,
            )
            .with("batch_id", Value::Section(identifiers.to_section()))
            .with(
                "entities",
                Value::List(subbatch_refs.iter().cloned().map(composite_reference).collect()),
            );
            log.create(ctx, &subbatch, &file_name)?;
        }
        sample_refs.push(subbatch_refs);
    }

    let identifiers = batch_id.derive(short_name, lab_id.to_string());
    let batch = base(
        &sections.batch,
        format!("{} {}", plan.name, lab_id),
        lab_id.to_string(),
    )
    .with("batch_id", Value::Section(identifiers.to_section()))
    .with(
        "entities",
        Value::List(sample_refs.iter().flatten().cloned().map(composite_reference).collect()),
    );
    log.create(ctx, &batch, &format!("{}.archive.json", lab_id))?;

    debug!(
        samples = sample_refs.iter().map(Vec::len).sum::<usize>(),
        subbatches, "Samples and batches created"
    );
    Ok(sample_refs)
}

/// Name a process after its function, name or method, in that order.
fn display_name(process: &Section, scope: &str) -> String {
    let name = ["function", "name", "method"]
        .iter()
        .find(|field| process.is_set(field))
        .and_then(|field| process.get(field))
        .map(|value| value.to_string())
        .unwrap_or_else(|| process.m_def.clone());
    if name.contains(scope) {
        name
    } else {
        format!("{} {}", name, scope)
    }
}

/// Wire one materialized process to its batch or sample and name its file.
///
/// Pure: nothing is written.
pub fn wire_process(
    upload_id: &str,
    plan: &ExperimentalPlan,
    lab_id: &str,
    step: usize,
    vary: bool,
    subbatch: usize,
    template: &Section,
) -> WiredProcess {
    let single_sample = plan.substrates_per_subbatch == 1 && vary;
    let mut scope = if vary {
        format!("{}_{}", lab_id, subbatch)
    } else {
        lab_id.to_string()
    };
    if single_sample {
        scope.push_str("_0");
    }
    let target = reference(upload_id, &entry_id(upload_id, &format!("{}.archive.json", scope)));

    let mut process = template.clone();
    if let Some(name) = process.name() {
        let cleaned = name.replace("Standard", "").replace('-', "").trim().to_string();
        process.set_str("name", cleaned);
    }
    if single_sample {
        process.set("samples", Value::List(vec![composite_reference(target)]));
    } else {
        process.set_str("batch", target);
    }

    let display = display_name(&process, &scope);
    let file_name = format!(
        "{}_{}.archive.json",
        step + 1,
        display.replace("  ", "_").replace([' ', '/', '\\'], "_")
    );
    process.set("position_in_experimental_plan", Value::Scalar((step as u64 + 1).into()));
    if let Some(datetime) = plan.datetime_value() {
        process.set("datetime", datetime);
    }

    WiredProcess {
        step,
        subbatch,
        scope,
        file_name,
        process,
    }
}

/// Wire every present process of the plan, in step then subbatch order.
pub fn wire_processes(upload_id: &str, plan: &ExperimentalPlan, lab_id: &str) -> Vec<WiredProcess> {
    let mut wired = Vec::new();
    for (step_index, step) in plan.plan.iter().enumerate() {
        for (subbatch, process) in step.batch_processes.iter().enumerate() {
            if process.get("present").and_then(Value::as_bool) == Some(false) {
                debug!(step = step_index, subbatch, "Process not present, skipping");
                continue;
            }
            wired.push(wire_process(
                upload_id,
                plan,
                lab_id,
                step_index,
                step.vary_parameters,
                subbatch,
                process,
            ));
        }
    }
    wired
}

/// Persist wired processes; existing files are kept.
pub fn create_processes<C: ArchiveContext + ?Sized>(
    ctx: &C,
    processes: &[WiredProcess],
    log: &mut WriteLog,
) -> Result<(), StorageError> {
    for wired in processes {
        log.create(ctx, &wired.process, &wired.file_name)?;
    }
    Ok(())
}

/// Solutions used by the processes, preferring snapshotted details.
pub fn collect_solutions(processes: &[WiredProcess], resolver: &dyn ReferenceResolver) -> Vec<Section> {
    let mut solutions = Vec::new();
    for wired in processes {
        let holders = wired.process.get("solution").and_then(Value::as_list).unwrap_or_default();
        for holder in holders.iter().filter_map(Value::as_section) {
            if let Some(details) = holder.get("solution_details").and_then(Value::as_section) {
                solutions.push(details.clone());
            } else if let Some(reference) = holder.get_str("solution").filter(|r| !r.is_empty()) {
                match resolver.resolve(reference) {
                    Ok(solution) => solutions.push(solution),
                    Err(e) => warn!(reference, error = %e, "Could not resolve solution"),
                }
            }
        }
    }
    solutions
}

/// Fail unless the plan can create records.
pub fn check_preconditions(
    plan: &ExperimentalPlan,
) -> Result<(ReadableIdentifiers, String, SolarCellProperties), PlanError> {
    let batch_id = plan.batch_id.clone().ok_or(PlanError::MissingBatchId)?;
    let lab_id = batch_id.resolved_lab_id().ok_or(PlanError::MissingBatchId)?;
    let properties = plan
        .effective_solar_cell_properties()
        .ok_or(PlanError::MissingSolarCellProperties)?;
    Ok((batch_id, lab_id, properties))
}
