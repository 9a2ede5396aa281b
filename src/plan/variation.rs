//! Parameter variation resolution
//!
//! Classifies every step parameter by the length of its value list and combines
//! the varied ones into exactly one assignment set per subbatch.

use crate::error::PlanError;
use crate::plan::types::PlanStep;
use itertools::Itertools;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterShape {
    /// One value, applied to every subbatch.
    Singular,
    /// One value per subbatch, assigned positionally.
    Linear,
    /// Fewer values than subbatches; one axis of the Cartesian product.
    Combinatorial,
}

impl ParameterShape {
    pub fn classify(path: &str, values: usize, subbatches: usize) -> Result<Self, PlanError> {
        if values == 0 {
            return Err(PlanError::ParameterWithoutValues(path.to_string()));
        }
        if values > subbatches {
            return Err(PlanError::TooManyValues {
                path: path.to_string(),
                values,
                subbatches,
            });
        }
        Ok(if values == 1 {
            ParameterShape::Singular
        } else if values == subbatches {
            ParameterShape::Linear
        } else {
            ParameterShape::Combinatorial
        })
    }
}

/// One value bound to one path of one step's process.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAssignment {
    pub step: usize,
    pub path: String,
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariationSet {
    pub subbatches: usize,
    /// Applied to every materialized process of their step, after per-subbatch values.
    pub singular: Vec<ParameterAssignment>,
    /// Combinatorial assignments first, then linear ones; one entry per subbatch.
    pub per_subbatch: Vec<Vec<ParameterAssignment>>,
    varying_steps: BTreeSet<usize>,
}

impl VariationSet {
    pub fn varies(&self, step: usize) -> bool {
        self.varying_steps.contains(&step)
    }

    pub fn singular_for(&self, step: usize) -> impl Iterator<Item = &ParameterAssignment> {
        self.singular.iter().filter(move |a| a.step == step)
    }

    pub fn subbatch_for(
        &self,
        subbatch: usize,
        step: usize,
    ) -> impl Iterator<Item = &ParameterAssignment> {
        self.per_subbatch
            .get(subbatch)
            .into_iter()
            .flatten()
            .filter(move |a| a.step == step)
    }
}

/// Resolve the parameters of all steps against `subbatches` subbatches.
///
/// Fails without side effects on the first shape violation, or when the
/// combinatorial parameters do not multiply out to exactly `subbatches`.
pub fn resolve_variations(steps: &[PlanStep], subbatches: usize) -> Result<VariationSet, PlanError> {
    let mut singular = Vec::new();
    let mut linear: Vec<Vec<ParameterAssignment>> = Vec::new();
    let mut combinatorial: Vec<Vec<ParameterAssignment>> = Vec::new();
    let mut varying_steps = BTreeSet::new();

    for (index, step) in steps.iter().enumerate() {
        for parameter in &step.parameters {
            let shape = ParameterShape::classify(
                &parameter.parameter_path,
                parameter.parameter_values.len(),
                subbatches,
            )?;
            let unit = parameter.unit().map(str::to_string);
            let assignments: Vec<ParameterAssignment> = parameter
                .parameter_values
                .iter()
                .map(|value| ParameterAssignment {
                    step: index,
                    path: parameter.parameter_path.clone(),
                    value: value.clone(),
                    unit: unit.clone(),
                })
                .collect();
            match shape {
                ParameterShape::Singular => singular.extend(assignments),
                ParameterShape::Linear => {
                    varying_steps.insert(index);
                    linear.push(assignments);
                }
                ParameterShape::Combinatorial => {
                    varying_steps.insert(index);
                    combinatorial.push(assignments);
                }
            }
        }
    }

    let mut per_subbatch: Vec<Vec<ParameterAssignment>> = if combinatorial.is_empty() {
        vec![Vec::new(); subbatches]
    } else {
        // Checked before expanding; a mismatching set may be far larger than N.
        let combinations = combinatorial
            .iter()
            .try_fold(1usize, |acc, values| acc.checked_mul(values.len()));
        if combinations != Some(subbatches) {
            return Err(PlanError::ProductMismatch {
                expected: subbatches,
                actual: combinations.unwrap_or(usize::MAX),
            });
        }
        combinatorial.into_iter().multi_cartesian_product().collect()
    };

    for values in linear {
        for (slot, assignment) in per_subbatch.iter_mut().zip(values) {
            slot.push(assignment);
        }
    }

    Ok(VariationSet {
        subbatches,
        singular,
        per_subbatch,
        varying_steps,
    })
}
