//! Plan command presentation: execution reports and dry-run expansions.

use crate::error::{ApiError, StorageError};
use crate::plan::{BatchProcesses, ExecutionReport, Materialization, PlanStep};
use comfy_table::Table;
use serde_json::json;

fn to_json(value: &serde_json::Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e)))
}

pub fn format_execution_report_text(report: &ExecutionReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Standard processes loaded: {}\n",
        if report.materialized { "yes" } else { "no" }
    ));
    output.push_str(&format!(
        "Samples and processes created: {}\n",
        if report.records_created { "yes" } else { "no" }
    ));
    if !report.files_written.is_empty() || !report.files_skipped.is_empty() {
        output.push_str(&format!(
            "Files: {} written, {} already present\n",
            report.files_written.len(),
            report.files_skipped.len()
        ));
    }
    if let Some(summary) = &report.summary_file {
        output.push_str(&format!("Summary: {}\n", summary));
    }
    if !report.parameter_failures.is_empty() {
        output.push_str("\nParameters not applied:\n");
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Step", "Subbatch", "Path", "Value", "Error"]);
        for failure in &report.parameter_failures {
            let subbatch = failure
                .subbatch
                .map(|s| (s + 1).to_string())
                .unwrap_or_else(|| "all".to_string());
            let value = match &failure.unit {
                Some(unit) => format!("{} {}", failure.value, unit),
                None => failure.value.clone(),
            };
            table.add_row(vec![
                (failure.step + 1).to_string(),
                subbatch,
                failure.path.clone(),
                value,
                failure.message.clone(),
            ]);
        }
        output.push_str(&table.to_string());
        output.push('\n');
    }
    output
}

pub fn format_execution_report_json(report: &ExecutionReport) -> Result<String, ApiError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e)))
}

fn mode(processes: &BatchProcesses) -> &'static str {
    match processes {
        BatchProcesses::Empty => "none",
        BatchProcesses::Single(_) => "single",
        BatchProcesses::PerSubbatch(_) => "per subbatch",
        BatchProcesses::Shared { .. } => "shared",
    }
}

fn step_label(step: &PlanStep, index: usize) -> String {
    step.name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Step {}", index + 1))
}

pub fn format_expansion_text(steps: &[PlanStep], expansion: &Materialization) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Step", "Mode", "Subbatch", "Process"]);
    for (index, (step, (_, processes))) in steps.iter().zip(&expansion.steps).enumerate() {
        let label = format!("{}. {}", index + 1, step_label(step, index));
        for (subbatch, process) in processes.iter().enumerate() {
            let subbatch = match processes {
                BatchProcesses::Single(_) => "all".to_string(),
                _ => (subbatch + 1).to_string(),
            };
            table.add_row(vec![
                label.clone(),
                mode(processes).to_string(),
                subbatch,
                process.name().unwrap_or(&process.m_def).to_string(),
            ]);
        }
    }
    let mut output = table.to_string();
    output.push('\n');
    if !expansion.failures.is_empty() {
        output.push_str(&format!(
            "\n{} parameter(s) could not be applied\n",
            expansion.failures.len()
        ));
    }
    output
}

pub fn format_expansion_json(
    steps: &[PlanStep],
    expansion: &Materialization,
) -> Result<String, ApiError> {
    let rendered: Vec<_> = steps
        .iter()
        .zip(&expansion.steps)
        .enumerate()
        .map(|(index, (step, (vary, processes)))| {
            json!({
                "step": index + 1,
                "name": step_label(step, index),
                "vary_parameters": vary,
                "mode": mode(processes),
                "processes": processes.iter().collect::<Vec<_>>(),
            })
        })
        .collect();
    to_json(&json!({ "steps": rendered, "failures": expansion.failures }))
}
