//! Upload storage: persistence of plans and links between created records

use crate::integration::test_utils::{parameter, plan, spin_coating_template, step, TestUpload, LAB_ID};
use labplan::error::StorageError;
use labplan::plan::PlanExecutor;
use labplan::schema::SchemaRegistry;
use labplan::section::Value;
use labplan::store::{entry_id, load_section, reference, ArchiveContext, ReferenceResolver};

#[test]
fn executed_plan_survives_save_and_load() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(4, 2);
    plan.plan = vec![step(&spin, vec![parameter("annealing/temperature", Some("°C"), &["100", "120"])])];

    let registry = SchemaRegistry::builtin();
    PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();
    upload.save_plan(&plan);

    let loaded = upload.load_plan();
    assert_eq!(loaded, plan);
    assert!(loaded.plan_is_created);
    assert_eq!(loaded.plan[0].batch_processes.len(), 2);
}

#[test]
fn created_records_reference_each_other_by_entry_id() {
    let upload = TestUpload::new();
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(2, 2);
    plan.plan = vec![step(&spin, Vec::new())];

    let registry = SchemaRegistry::builtin();
    PlanExecutor::new(&upload.archive, &registry)
        .execute(&mut plan)
        .unwrap();

    let batch_file = format!("{}.archive.json", LAB_ID);
    let expected = reference("test-upload", &entry_id("test-upload", &batch_file));
    let process = load_section(&upload.archive, &format!("1_Spin_Coating_{}.archive.json", LAB_ID)).unwrap();
    assert_eq!(process.get_str("batch"), Some(expected.as_str()));

    let batch = upload.archive.resolve(&expected).unwrap();
    assert_eq!(batch.m_def, "SolarCellBatch");
    let entities = batch.get("entities").and_then(Value::as_list).unwrap();
    assert_eq!(entities.len(), 2);
}

#[test]
fn references_to_other_uploads_are_not_resolved() {
    let upload = TestUpload::new();
    upload.template("spin.archive.json", &spin_coating_template());
    let id = entry_id("elsewhere", "spin.archive.json");

    assert!(matches!(
        upload.archive.resolve(&reference("elsewhere", &id)),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        upload.archive.resolve("https://example.org/entry#data"),
        Err(StorageError::InvalidReference(_))
    ));
}

#[test]
fn listing_skips_temporary_files() {
    let upload = TestUpload::new();
    upload
        .archive
        .write_raw("left_over.archive.json.tmp", b"{}")
        .unwrap();
    upload.template("spin.archive.json", &spin_coating_template());

    assert_eq!(upload.files(), vec!["spin.archive.json"]);
}
