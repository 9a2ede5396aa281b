//! End-to-end plan execution against a directory upload

use crate::integration::test_utils::{
    evaporation_template, parameter, plan, spin_coating_template, step, TestUpload, LAB_ID,
};
use labplan::error::PlanError;
use labplan::plan::{BatchProcesses, PlanExecutor};
use labplan::schema::SchemaRegistry;
use labplan::section::{Quantity, Section, Value};
use labplan::store::{load_section, ArchiveContext};

fn processes(batch: &BatchProcesses) -> Vec<&Section> {
    batch.iter().collect()
}

fn annealing(process: &Section) -> &Section {
    process.get("annealing").and_then(Value::as_section).unwrap()
}

#[test]
fn combinatorial_parameters_cover_every_subbatch_once() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(6, 1);
    plan.plan = vec![step(
        &spin,
        vec![
            parameter("annealing/temperature", Some("°C"), &["100", "120"]),
            parameter("annealing/time", Some("s"), &["600", "900", "1200"]),
        ],
    )];

    let registry = SchemaRegistry::builtin();
    let report = PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();
    assert!(report.parameter_failures.is_empty());

    let materialized = processes(&plan.plan[0].batch_processes);
    assert_eq!(materialized.len(), 6);
    let combos: Vec<(f64, f64)> = materialized
        .iter()
        .map(|p| {
            let annealing = annealing(p);
            let value = |field: &str| match annealing.get(field) {
                Some(Value::Quantity(q)) => q.value,
                other => panic!("Expected quantity for {}, got {:?}", field, other),
            };
            (value("temperature"), value("time"))
        })
        .collect();
    assert_eq!(
        combos,
        vec![
            (100.0, 600.0),
            (100.0, 900.0),
            (100.0, 1200.0),
            (120.0, 600.0),
            (120.0, 900.0),
            (120.0, 1200.0),
        ]
    );

    // One sample per subbatch: the process points at the sample, not a batch.
    let stored = load_section(
        &upload.archive,
        &format!("1_Spin_Coating_120,900_{}_4_0.archive.json", LAB_ID),
    )
    .unwrap();
    assert!(stored.is_set("samples"));
    assert!(!stored.is_set("batch"));
}

#[test]
fn combinatorial_product_must_match_subbatch_count() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(8, 1);
    plan.plan = vec![step(
        &spin,
        vec![
            parameter("annealing/temperature", Some("°C"), &["100", "120"]),
            parameter("annealing/time", Some("s"), &["600", "900", "1200"]),
        ],
    )];
    let before = plan.clone();

    let registry = SchemaRegistry::builtin();
    let result = PlanExecutor::new(&upload.archive, &registry).execute(&mut plan);
    assert!(matches!(
        result,
        Err(PlanError::ProductMismatch {
            expected: 8,
            actual: 6
        })
    ));
    assert_eq!(plan.plan, before.plan);
    assert_eq!(upload.files(), vec!["spin.archive.json"]);
}

#[test]
fn singular_parameter_reaches_every_subbatch() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(6, 2);
    plan.plan = vec![step(
        &spin,
        vec![
            parameter("annealing/temperature", Some("°C"), &["100", "110", "120"]),
            parameter("annealing/atmosphere", None, &["N2"]),
        ],
    )];

    let registry = SchemaRegistry::builtin();
    PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    let materialized = processes(&plan.plan[0].batch_processes);
    assert_eq!(materialized.len(), 3);
    for process in materialized {
        assert!(process.name().unwrap().ends_with(" N2"));
        assert_eq!(annealing(process).get_str("atmosphere"), Some("N2"));
    }
}

#[test]
fn linear_parameter_is_assigned_positionally() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(4, 1);
    plan.plan = vec![step(
        &spin,
        vec![parameter(
            "annealing/temperature",
            Some("°C"),
            &["130", "100", "120", "110"],
        )],
    )];

    let registry = SchemaRegistry::builtin();
    PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    let temperatures: Vec<Option<Value>> = processes(&plan.plan[0].batch_processes)
        .iter()
        .map(|p| annealing(p).get("temperature").cloned())
        .collect();
    let expected: Vec<Option<Value>> = [130.0, 100.0, 120.0, 110.0]
        .iter()
        .map(|v| {
            Some(Value::Quantity(Quantity {
                value: *v,
                unit: "°C".to_string(),
            }))
        })
        .collect();
    assert_eq!(temperatures, expected);
}

#[test]
fn non_varying_steps_share_one_process_and_varying_steps_without_parameters_alias() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let evaporation = upload.template("evap.archive.json", &evaporation_template());
    let mut plan = plan(4, 2);
    let mut shared = step(&evaporation, Vec::new());
    shared.vary_parameters = true;
    plan.plan = vec![
        step(&spin, vec![parameter("annealing/temperature", Some("°C"), &["100", "120"])]),
        step(&evaporation, Vec::new()),
        shared,
    ];

    let registry = SchemaRegistry::builtin();
    let report = PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    assert!(matches!(plan.plan[1].batch_processes, BatchProcesses::Single(_)));
    assert!(!plan.plan[1].vary_parameters);
    assert!(matches!(
        plan.plan[2].batch_processes,
        BatchProcesses::Shared { subbatches: 2, .. }
    ));

    let files = upload.files();
    assert!(files.contains(&format!("2_Evaporation_{}.archive.json", LAB_ID)));
    assert!(files.contains(&format!("3_Evaporation_{}_0.archive.json", LAB_ID)));
    assert!(files.contains(&format!("3_Evaporation_{}_1.archive.json", LAB_ID)));

    // The batch-level process points at the whole batch.
    let batch_process =
        load_section(&upload.archive, &format!("2_Evaporation_{}.archive.json", LAB_ID)).unwrap();
    assert!(batch_process.get_str("batch").unwrap().starts_with("../uploads/test-upload/archive/"));
    assert_eq!(
        batch_process.get("position_in_experimental_plan"),
        Some(&Value::Scalar(2.into()))
    );
    assert!(report.files_skipped.is_empty());
}

#[test]
fn samples_subbatches_and_batch_are_created() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(4, 2);
    plan.plan = vec![step(&spin, Vec::new())];

    let registry = SchemaRegistry::builtin();
    PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    let files = upload.files();
    for name in ["_0_0", "_0_1", "_1_0", "_1_1", "_0", "_1", ""] {
        let file = format!("{}{}.archive.json", LAB_ID, name);
        assert!(files.contains(&file), "missing {}", file);
    }
    let sample = load_section(&upload.archive, &format!("{}_1_0.archive.json", LAB_ID)).unwrap();
    assert_eq!(sample.m_def, "SolarCellSample");
    assert_eq!(sample.name(), Some(format!("Perovskite batch {}_1_0", LAB_ID).as_str()));
    assert_eq!(sample.get_str("architecture"), Some("nip"));

    let batch = load_section(&upload.archive, &format!("{}.archive.json", LAB_ID)).unwrap();
    assert_eq!(batch.get("entities").and_then(Value::as_list).map(<[Value]>::len), Some(4));
    assert!(plan.solar_cell_properties.is_some());
}

#[test]
fn existing_records_are_never_overwritten() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let sample_file = format!("{}_0_0.archive.json", LAB_ID);
    upload
        .archive
        .write_raw(&sample_file, br#"{"data": {"m_def": "SolarCellSample", "name": "hand made"}}"#)
        .unwrap();
    let first_write = upload.read(&sample_file);

    let mut plan = plan(2, 1);
    plan.plan = vec![step(&spin, Vec::new())];
    let registry = SchemaRegistry::builtin();
    let report = PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    assert_eq!(upload.read(&sample_file), first_write);
    assert!(report.files_skipped.contains(&sample_file));
    assert!(report
        .files_written
        .contains(&format!("{}_1_0.archive.json", LAB_ID)));
}

#[test]
fn created_plans_refuse_to_run_again() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(2, 1);
    plan.plan = vec![step(&spin, vec![parameter("annealing/temperature", Some("°C"), &["90", "95"])])];

    let registry = SchemaRegistry::builtin();
    let executor = PlanExecutor::new(&upload.archive, &registry);
    executor.execute(&mut plan).unwrap();
    assert!(plan.plan_is_created);

    plan.load_standard_processes = true;
    plan.create_samples_and_processes = true;
    let files = upload.files();
    let summary = upload.read(&format!("batch_plan_{}.html", LAB_ID));
    let before = plan.clone();

    for _ in 0..2 {
        assert!(matches!(
            executor.execute(&mut plan),
            Err(PlanError::AlreadyCreated)
        ));
    }
    assert_eq!(plan, before);
    assert_eq!(upload.files(), files);
    assert_eq!(upload.read(&format!("batch_plan_{}.html", LAB_ID)), summary);
}

#[test]
fn faulty_parameters_are_reported_and_skipped() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(2, 1);
    plan.plan = vec![step(
        &spin,
        vec![
            parameter("annealing/pressure", Some("bar"), &["1", "2"]),
            parameter("annealing/temperature", Some("V"), &["100"]),
            parameter("annealing/time", Some("s"), &["60"]),
        ],
    )];

    let registry = SchemaRegistry::builtin();
    let report = PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    // Two subbatches, each failing the unknown field and the wrong unit.
    assert_eq!(report.parameter_failures.len(), 4);
    assert!(report
        .parameter_failures
        .iter()
        .any(|f| f.path == "annealing/pressure" && f.subbatch == Some(1)));
    assert!(plan.plan_is_created);

    for process in processes(&plan.plan[0].batch_processes) {
        let annealing = annealing(process);
        assert!(!annealing.is_set("temperature"));
        assert!(annealing.is_set("time"));
    }
}

#[test]
fn missing_batch_id_stops_record_creation_but_keeps_materialization() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(2, 1);
    plan.batch_id = None;
    plan.plan = vec![step(&spin, Vec::new())];

    let registry = SchemaRegistry::builtin();
    let result = PlanExecutor::new(&upload.archive, &registry).execute(&mut plan);
    assert!(matches!(result, Err(PlanError::MissingBatchId)));
    assert!(!plan.load_standard_processes);
    assert!(plan.create_samples_and_processes);
    assert!(!plan.plan_is_created);
    assert!(!plan.plan[0].batch_processes.is_empty());
    assert_eq!(upload.files(), vec!["spin.archive.json"]);
}
