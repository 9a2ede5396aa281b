//! Materialization of per-subbatch processes from step templates

use crate::plan::setter::ValueSetter;
use crate::plan::types::{BatchProcesses, PlanStep};
use crate::plan::variation::{ParameterAssignment, VariationSet};
use crate::section::{Section, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// A parameter that could not be applied; the run continues without it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFailure {
    pub step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subbatch: Option<usize>,
    pub path: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub message: String,
}

/// Result of expanding every step of a plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Materialization {
    /// `(vary_parameters, batch_processes)` per step, in step order.
    pub steps: Vec<(bool, BatchProcesses)>,
    pub failures: Vec<ParameterFailure>,
}

impl Materialization {
    /// Write the expansion onto the plan steps.
    pub fn commit(self, steps: &mut [PlanStep]) {
        for (step, (vary, processes)) in steps.iter_mut().zip(self.steps) {
            step.vary_parameters = vary;
            step.batch_processes = processes;
        }
    }
}

/// Expand every step against its resolved template.
///
/// `templates[i]` is the template process of `steps[i]`.
pub fn materialize(
    steps: &[PlanStep],
    templates: &[Section],
    variations: &VariationSet,
    setter: &ValueSetter<'_>,
) -> Materialization {
    let mut result = Materialization::default();
    for (index, (step, template)) in steps.iter().zip(templates).enumerate() {
        let vary = step.vary_parameters || variations.varies(index);
        let processes = if !vary {
            let mut process = template.clone();
            apply(
                &mut process,
                variations.singular_for(index),
                setter,
                None,
                &mut result.failures,
            );
            BatchProcesses::Single(process)
        } else if step.parameters.is_empty() {
            BatchProcesses::Shared {
                process: template.clone(),
                subbatches: variations.subbatches,
            }
        } else {
            let processes = (0..variations.subbatches)
                .map(|subbatch| {
                    let mut process = template.clone();
                    apply(
                        &mut process,
                        variations.subbatch_for(subbatch, index),
                        setter,
                        Some(subbatch),
                        &mut result.failures,
                    );
                    apply(
                        &mut process,
                        variations.singular_for(index),
                        setter,
                        Some(subbatch),
                        &mut result.failures,
                    );
                    process
                })
                .collect();
            BatchProcesses::PerSubbatch(processes)
        };
        debug!(step = index, vary, processes = processes.len(), "Step materialized");
        result.steps.push((vary, processes));
    }
    result
}

/// Apply assignments and append their values to the process name.
fn apply<'p>(
    process: &mut Section,
    assignments: impl Iterator<Item = &'p ParameterAssignment>,
    setter: &ValueSetter<'_>,
    subbatch: Option<usize>,
    failures: &mut Vec<ParameterFailure>,
) {
    let mut applied = Vec::new();
    for assignment in assignments {
        applied.push(assignment.value.as_str());
        if let Err(e) = setter.set_value(
            process,
            &assignment.path,
            &assignment.value,
            assignment.unit.as_deref(),
        ) {
            error!(
                normalizer = "ExperimentalPlan",
                section = "system",
                step = assignment.step,
                path = %assignment.path,
                "Could not set {} to {} {}, likely due to a faulty path or unit: {}",
                assignment.path,
                assignment.value,
                assignment.unit.as_deref().unwrap_or("None"),
                e
            );
            failures.push(ParameterFailure {
                step: assignment.step,
                subbatch,
                path: assignment.path.clone(),
                value: assignment.value.clone(),
                unit: assignment.unit.clone(),
                message: e.to_string(),
            });
        }
    }
    if applied.is_empty() {
        return;
    }
    let suffix = applied.join(",");
    let name = match process.name() {
        Some(name) => format!("{} {}", name, suffix),
        None => suffix,
    };
    process.set("name", Value::string(name));
}
