//! Experimental batch plans
//!
//! A plan expands a list of template process steps into concrete sample, batch and
//! process records. Execution runs in two gated phases: materialization of the
//! per-subbatch processes, then record creation plus the HTML summary.

pub mod execute;
pub mod instantiate;
pub mod materialize;
pub mod setter;
pub mod summary;
pub mod types;
pub mod variation;

pub use execute::{ExecutionReport, PlanExecutor};
pub use instantiate::{RecordSections, WiredProcess};
pub use materialize::{Materialization, ParameterFailure};
pub use setter::{NodeKind, ValueSetter};
pub use summary::{splice_description, Summary, SummaryBuilder, END_MARKER, START_MARKER};
pub use types::{
    BatchProcesses, ExperimentalPlan, PlanParameter, PlanStep, ReadableIdentifiers,
    SolarCellProperties, StandardPlan,
};
pub use variation::{resolve_variations, ParameterAssignment, ParameterShape, VariationSet};
