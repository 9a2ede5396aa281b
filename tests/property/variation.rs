//! Property-based tests for parameter variation resolution

use labplan::error::PlanError;
use labplan::plan::{resolve_variations, PlanParameter, PlanStep};
use proptest::prelude::*;

fn parameter(path: String, count: usize) -> PlanParameter {
    PlanParameter {
        parameter_path: path,
        parameter_unit: None,
        parameter_values: (0..count).map(|v| v.to_string()).collect(),
    }
}

fn step_with_counts(counts: &[usize]) -> PlanStep {
    PlanStep {
        parameters: counts
            .iter()
            .enumerate()
            .map(|(i, count)| parameter(format!("p{}", i), *count))
            .collect(),
        ..Default::default()
    }
}

/// Combinatorial parameters resolve exactly when their product fills every subbatch
#[test]
fn test_combinatorial_product_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(3usize..=24).prop_flat_map(|subbatches| {
                (
                    Just(subbatches),
                    prop::collection::vec(2usize..subbatches, 1..=3),
                )
            }),
            |(subbatches, counts)| {
                let steps = vec![step_with_counts(&counts)];
                let product: usize = counts.iter().product();

                match resolve_variations(&steps, subbatches) {
                    Ok(set) => {
                        prop_assert_eq!(product, subbatches);
                        prop_assert_eq!(set.per_subbatch.len(), subbatches);
                        for slot in &set.per_subbatch {
                            prop_assert_eq!(slot.len(), counts.len());
                        }
                        // Every combination appears exactly once
                        let mut combos: Vec<Vec<&str>> = set
                            .per_subbatch
                            .iter()
                            .map(|slot| slot.iter().map(|a| a.value.as_str()).collect())
                            .collect();
                        combos.sort();
                        combos.dedup();
                        prop_assert_eq!(combos.len(), subbatches);
                    }
                    Err(PlanError::ProductMismatch { expected, actual }) => {
                        prop_assert_ne!(product, subbatches);
                        prop_assert_eq!(expected, subbatches);
                        prop_assert_eq!(actual, product);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Linear parameters land in their subbatch by position
#[test]
fn test_linear_assignment_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec("[a-z0-9]{1,6}", 2..16),
            |values| {
                let subbatches = values.len();
                let steps = vec![PlanStep {
                    parameters: vec![PlanParameter {
                        parameter_path: "annealing/temperature".to_string(),
                        parameter_unit: None,
                        parameter_values: values.clone(),
                    }],
                    ..Default::default()
                }];

                let set = resolve_variations(&steps, subbatches).unwrap();
                prop_assert!(set.varies(0));
                prop_assert!(set.singular.is_empty());
                for (slot, value) in set.per_subbatch.iter().zip(&values) {
                    prop_assert_eq!(slot.len(), 1);
                    prop_assert_eq!(&slot[0].value, value);
                }
                Ok(())
            },
        )
        .unwrap();
}

/// More values than subbatches is always rejected
#[test]
fn test_too_many_values_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..10, 1usize..5), |(subbatches, extra)| {
            let steps = vec![step_with_counts(&[subbatches + extra])];
            let rejected = matches!(
                resolve_variations(&steps, subbatches),
                Err(PlanError::TooManyValues { .. })
            );
            prop_assert!(rejected);
            Ok(())
        })
        .unwrap();
}
