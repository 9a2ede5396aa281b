//! CLI route table against a temporary upload

use crate::integration::test_utils::{
    parameter, plan, spin_coating_template, step, TestUpload, LAB_ID, PLAN_FILE,
};
use labplan::cli::{Commands, RunContext};
use labplan::config::LabplanConfig;
use labplan::error::{ApiError, PlanError};
use labplan::section::{Section, Value};
use labplan::store::{create_archive, load_section, ArchiveContext};

fn context(upload: &TestUpload) -> RunContext {
    let mut config = LabplanConfig::default();
    config.archive.upload_root = upload.dir.path().to_path_buf();
    config.archive.upload_id = "test-upload".to_string();
    RunContext::from_config(upload.dir.path().to_path_buf(), config).unwrap()
}

fn execute(plan: &str) -> Commands {
    Commands::Execute {
        plan: plan.to_string(),
        format: "text".to_string(),
    }
}

fn stage_plan(upload: &TestUpload) {
    let spin = upload.template("spin.archive.json", &spin_coating_template());
    let mut plan = plan(4, 2);
    plan.plan = vec![step(&spin, vec![parameter("annealing/temperature", Some("°C"), &["100", "120"])])];
    upload.save_plan(&plan);
}

#[test]
fn execute_saves_the_created_plan() {
    let upload = TestUpload::new();
    stage_plan(&upload);
    let ctx = context(&upload);

    let output = ctx.execute(&execute(PLAN_FILE)).unwrap();
    assert!(output.contains("Standard processes loaded: yes"));
    assert!(output.contains("Samples and processes created: yes"));

    let saved = upload.load_plan();
    assert!(saved.plan_is_created);
    assert!(!saved.load_standard_processes);
    assert!(!saved.create_samples_and_processes);
    assert_eq!(saved.plan[0].batch_processes.len(), 2);
}

#[test]
fn second_execute_is_refused_and_leaves_the_plan_alone() {
    let upload = TestUpload::new();
    stage_plan(&upload);
    let ctx = context(&upload);
    ctx.execute(&execute(PLAN_FILE)).unwrap();

    let mut plan = upload.load_plan();
    plan.load_standard_processes = true;
    upload.save_plan(&plan);
    let stored = upload.read(PLAN_FILE);

    assert!(matches!(
        ctx.execute(&execute(PLAN_FILE)),
        Err(ApiError::PlanError(PlanError::AlreadyCreated))
    ));
    assert_eq!(upload.read(PLAN_FILE), stored);
}

#[test]
fn expand_writes_nothing() {
    let upload = TestUpload::new();
    stage_plan(&upload);
    let ctx = context(&upload);
    let files = upload.files();
    let stored = upload.read(PLAN_FILE);

    let output = ctx
        .execute(&Commands::Expand {
            plan: PLAN_FILE.to_string(),
            format: "json".to_string(),
        })
        .unwrap();
    let rendered: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(rendered["steps"][0]["mode"], "per subbatch");
    assert_eq!(rendered["steps"][0]["processes"].as_array().unwrap().len(), 2);

    assert_eq!(upload.files(), files);
    assert_eq!(upload.read(PLAN_FILE), stored);
}

#[test]
fn summary_rebuild_writes_the_html_document() {
    let upload = TestUpload::new();
    stage_plan(&upload);
    let ctx = context(&upload);
    ctx.execute(&execute(PLAN_FILE)).unwrap();

    let output = ctx
        .execute(&Commands::Summary {
            plan: PLAN_FILE.to_string(),
        })
        .unwrap();
    let summary = format!("batch_plan_{}.html", LAB_ID);
    assert!(output.contains(&summary));
    assert!(upload.files().contains(&summary));
}

#[test]
fn missing_plan_file_is_a_storage_error() {
    let upload = TestUpload::new();
    let ctx = context(&upload);
    assert!(matches!(
        ctx.execute(&execute("absent.archive.json")),
        Err(ApiError::StorageError(_))
    ));
}

#[test]
fn schema_lists_and_describes_sections() {
    let upload = TestUpload::new();
    let ctx = context(&upload);

    let list = ctx
        .execute(&Commands::Schema {
            section: None,
            format: "json".to_string(),
        })
        .unwrap();
    let rendered: serde_json::Value = serde_json::from_str(&list).unwrap();
    let names = rendered["sections"].as_array().unwrap();
    assert!(names.iter().any(|n| n == "SpinCoating"));

    let annealing = ctx
        .execute(&Commands::Schema {
            section: Some("Annealing".to_string()),
            format: "text".to_string(),
        })
        .unwrap();
    assert!(annealing.contains("Section: Annealing"));
    assert!(annealing.contains("temperature"));

    assert!(matches!(
        ctx.execute(&Commands::Schema {
            section: Some("Teleporter".to_string()),
            format: "text".to_string(),
        }),
        Err(ApiError::UnknownSection(name)) if name == "Teleporter"
    ));
}

#[test]
fn parse_reads_instrument_files() {
    let upload = TestUpload::new();
    let ctx = context(&upload);
    upload
        .archive
        .write_raw(
            "log.csv",
            b"READ_0_Time,READ_O2_Flow\n0,2.5\n1,2.75\n",
        )
        .unwrap();

    let output = ctx
        .execute(&Commands::Parse {
            kind: "labview".to_string(),
            file: upload.dir.path().join("log.csv"),
            format: "json".to_string(),
        })
        .unwrap();
    let rendered: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(rendered["m_def"], "ElectrolyserLog");
    assert_eq!(rendered["data_file"], "log.csv");
    assert_eq!(rendered["o2_flow"]["values"][1], 2.75);
    assert_eq!(rendered["o2_flow"]["unit"], "ml/minute");

    assert!(matches!(
        ctx.execute(&Commands::Parse {
            kind: "tdms".to_string(),
            file: upload.dir.path().join("log.csv"),
            format: "json".to_string(),
        }),
        Err(ApiError::ParseError(_))
    ));
}

#[test]
fn normalize_fills_the_stored_measurement() {
    let upload = TestUpload::new();
    let ctx = context(&upload);
    upload
        .archive
        .write_raw(
            "ocv.DTA",
            b"OCVCURVE\tTABLE\t2\n\tPt\tT\tVf\tIm\n\t#\ts\tV\tA\n\t0\t0.5\t0.1\t0.002\n\t1\t1.0\t0.2\t0.004\n",
        )
        .unwrap();
    let measurement = Section::new("PotentiostatMeasurement").with("data_file", Value::string("ocv.DTA"));
    create_archive(&upload.archive, &measurement, "ocv.archive.json").unwrap();

    let command = Commands::Normalize {
        measurement: "ocv.archive.json".to_string(),
    };
    let output = ctx.execute(&command).unwrap();
    assert!(output.contains("pretreatment"));

    let stored = load_section(&upload.archive, "ocv.archive.json").unwrap();
    let cycle = stored.get("pretreatment").and_then(Value::as_section).unwrap();
    assert_eq!(cycle.m_def, "VoltammetryCycle");

    let other = Section::new("PotentiostatMeasurement").with("data_file", Value::string("cv.csv"));
    create_archive(&upload.archive, &other, "csv.archive.json").unwrap();
    let before = upload.read("csv.archive.json");
    let output = ctx
        .execute(&Commands::Normalize {
            measurement: "csv.archive.json".to_string(),
        })
        .unwrap();
    assert!(output.contains("nothing to normalize"));
    assert_eq!(upload.read("csv.archive.json"), before);
}
