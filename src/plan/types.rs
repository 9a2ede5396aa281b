//! Plan record types

use crate::error::PlanError;
use crate::section::{Section, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_plan_m_def() -> String {
    "ExperimentalPlan".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Human readable identifier of a batch or sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadableIdentifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_id: Option<String>,
}

impl ReadableIdentifiers {
    /// Explicit lab id, or `{institute}_{owner}_{YYYYMMDD}_{short_name}` with
    /// empty parts skipped.
    pub fn resolved_lab_id(&self) -> Option<String> {
        if let Some(lab_id) = self.lab_id.as_deref().filter(|id| !id.trim().is_empty()) {
            return Some(lab_id.to_string());
        }
        let date = self.datetime.map(|dt| dt.format("%Y%m%d").to_string());
        let parts: Vec<&str> = [
            self.institute.as_deref(),
            self.owner.as_deref(),
            date.as_deref(),
            self.short_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("_"))
        }
    }

    /// Copy with a different short name and an explicit lab id.
    pub fn derive(&self, short_name: String, lab_id: String) -> Self {
        Self {
            short_name: Some(short_name),
            lab_id: Some(lab_id),
            ..self.clone()
        }
    }

    pub fn to_section(&self) -> Section {
        let mut section = Section::new("ReadableIdentifiers");
        if let Some(institute) = &self.institute {
            section.set_str("institute", institute.clone());
        }
        if let Some(owner) = &self.owner {
            section.set_str("owner", owner.clone());
        }
        if let Some(datetime) = &self.datetime {
            section.set_str("datetime", datetime.to_rfc3339());
        }
        if let Some(short_name) = &self.short_name {
            section.set_str("short_name", short_name.clone());
        }
        if let Some(lab_id) = self.resolved_lab_id() {
            section.set_str("lab_id", lab_id);
        }
        section
    }
}

/// Template for the solar cell properties of every sample in the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarCellProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
}

impl From<&StandardPlan> for SolarCellProperties {
    fn from(standard: &StandardPlan) -> Self {
        Self {
            substrate: standard.substrate.clone(),
            architecture: standard.architecture.clone(),
        }
    }
}

/// One varied (or fixed) value path on a step's template process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanParameter {
    pub parameter_path: String,
    /// Unit of the values; absent or the literal `None` assigns raw values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_unit: Option<String>,
    #[serde(default)]
    pub parameter_values: Vec<String>,
}

impl PlanParameter {
    pub fn unit(&self) -> Option<&str> {
        self.parameter_unit
            .as_deref()
            .map(str::trim)
            .filter(|unit| !unit.is_empty() && *unit != "None")
    }
}

/// Materialized processes of one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum BatchProcesses {
    #[default]
    Empty,
    /// One process shared by every subbatch.
    Single(Section),
    /// One process per subbatch, in subbatch order.
    PerSubbatch(Vec<Section>),
    /// A varying step without parameters: the same read-only process for each of
    /// `subbatches` subbatches.
    Shared { process: Section, subbatches: usize },
}

impl BatchProcesses {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            BatchProcesses::Empty => 0,
            BatchProcesses::Single(_) => 1,
            BatchProcesses::PerSubbatch(processes) => processes.len(),
            BatchProcesses::Shared { subbatches, .. } => *subbatches,
        }
    }

    /// Processes in subbatch order. Shared processes repeat.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Section> + '_> {
        match self {
            BatchProcesses::Empty => Box::new(std::iter::empty()),
            BatchProcesses::Single(process) => Box::new(std::iter::once(process)),
            BatchProcesses::PerSubbatch(processes) => Box::new(processes.iter()),
            BatchProcesses::Shared {
                process,
                subbatches,
            } => Box::new(std::iter::repeat(process).take(*subbatches)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reference to the template process record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_reference: Option<String>,
    #[serde(default)]
    pub parameters: Vec<PlanParameter>,
    #[serde(default)]
    pub vary_parameters: bool,
    #[serde(default, skip_serializing_if = "BatchProcesses::is_empty")]
    pub batch_processes: BatchProcesses,
}

/// Batch plan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalPlan {
    #[serde(default = "default_plan_m_def")]
    pub m_def: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<ReadableIdentifiers>,
    #[serde(default)]
    pub number_of_substrates: u32,
    #[serde(default)]
    pub substrates_per_subbatch: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_plan: Option<StandardPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_cell_properties: Option<SolarCellProperties>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub load_standard_processes: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub create_samples_and_processes: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub plan_is_created: bool,
    #[serde(default)]
    pub plan: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_plan_pdf: Option<String>,
}

impl Default for ExperimentalPlan {
    fn default() -> Self {
        Self {
            m_def: default_plan_m_def(),
            name: String::new(),
            datetime: None,
            description: None,
            batch_id: None,
            number_of_substrates: 0,
            substrates_per_subbatch: 0,
            standard_plan: None,
            solar_cell_properties: None,
            load_standard_processes: false,
            create_samples_and_processes: false,
            plan_is_created: false,
            plan: Vec::new(),
            batch_plan_pdf: None,
        }
    }
}

impl ExperimentalPlan {
    /// Number of subbatches; the substrate count must divide evenly.
    pub fn number_of_subbatches(&self) -> Result<usize, PlanError> {
        if self.substrates_per_subbatch == 0 {
            return Err(PlanError::ZeroSubbatchSize);
        }
        if self.number_of_substrates % self.substrates_per_subbatch != 0 {
            return Err(PlanError::IndivisibleSubstrates {
                substrates: self.number_of_substrates,
                per_subbatch: self.substrates_per_subbatch,
            });
        }
        Ok((self.number_of_substrates / self.substrates_per_subbatch) as usize)
    }

    pub fn batch_lab_id(&self) -> Option<String> {
        self.batch_id
            .as_ref()
            .and_then(ReadableIdentifiers::resolved_lab_id)
    }

    /// Solar cell properties, preferring the standard plan when one is set.
    pub fn effective_solar_cell_properties(&self) -> Option<SolarCellProperties> {
        self.standard_plan
            .as_ref()
            .map(SolarCellProperties::from)
            .or_else(|| self.solar_cell_properties.clone())
    }

    pub fn datetime_value(&self) -> Option<Value> {
        self.datetime.map(|dt| Value::string(dt.to_rfc3339()))
    }
}
