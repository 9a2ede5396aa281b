//! Shared test utilities for integration tests
//!
//! Upload directories, plan and template builders, and XDG isolation.

use labplan::plan::{ExperimentalPlan, PlanParameter, PlanStep, ReadableIdentifiers, StandardPlan};
use labplan::section::{Section, Value};
use labplan::store::{create_archive, load_archive, save_archive, ArchiveContext, DirectoryArchive};
use std::sync::Mutex;
use tempfile::TempDir;

pub const LAB_ID: &str = "HZB_TEST";
pub const PLAN_FILE: &str = "plan.archive.json";

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// A temporary upload with its archive context
pub struct TestUpload {
    pub dir: TempDir,
    pub archive: DirectoryArchive,
}

impl TestUpload {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let archive = DirectoryArchive::new(dir.path(), "test-upload").unwrap();
        Self { dir, archive }
    }

    /// Store a template and return its upload-relative reference.
    pub fn template(&self, file_name: &str, section: &Section) -> String {
        create_archive(&self.archive, section, file_name).unwrap();
        format!("../upload/raw/{}#data", file_name)
    }

    pub fn save_plan(&self, plan: &ExperimentalPlan) {
        save_archive(&self.archive, plan, PLAN_FILE).unwrap();
    }

    pub fn load_plan(&self) -> ExperimentalPlan {
        load_archive(&self.archive, PLAN_FILE).unwrap()
    }

    pub fn files(&self) -> Vec<String> {
        self.archive.list_raw().unwrap()
    }

    pub fn read(&self, file_name: &str) -> String {
        String::from_utf8(self.archive.read_raw(file_name).unwrap()).unwrap()
    }
}

pub fn spin_coating_template() -> Section {
    Section::new("SpinCoating")
        .with("name", Value::string("Standard - Spin Coating"))
        .with("method", Value::string("Spin Coating"))
        .with(
            "annealing",
            Value::Section(Section::new("Annealing").with("atmosphere", Value::string("Air"))),
        )
}

pub fn evaporation_template() -> Section {
    Section::new("Evaporation")
        .with("name", Value::string("Standard - Evaporation"))
        .with("method", Value::string("Evaporation"))
}

pub fn parameter(path: &str, unit: Option<&str>, values: &[&str]) -> PlanParameter {
    PlanParameter {
        parameter_path: path.to_string(),
        parameter_unit: unit.map(str::to_string),
        parameter_values: values.iter().map(|v| v.to_string()).collect(),
    }
}

pub fn step(reference: &str, parameters: Vec<PlanParameter>) -> PlanStep {
    PlanStep {
        process_reference: Some(reference.to_string()),
        parameters,
        ..Default::default()
    }
}

/// Plan with both phases requested and no steps yet.
pub fn plan(substrates: u32, per_subbatch: u32) -> ExperimentalPlan {
    ExperimentalPlan {
        name: "Perovskite batch".to_string(),
        number_of_substrates: substrates,
        substrates_per_subbatch: per_subbatch,
        batch_id: Some(ReadableIdentifiers {
            short_name: Some("TEST".to_string()),
            lab_id: Some(LAB_ID.to_string()),
            ..Default::default()
        }),
        standard_plan: Some(StandardPlan {
            substrate: Some("../upload/raw/substrate.archive.json#data".to_string()),
            architecture: Some("nip".to_string()),
            ..Default::default()
        }),
        load_standard_processes: true,
        create_samples_and_processes: true,
        ..Default::default()
    }
}

/// Run `f` with XDG_CONFIG_HOME and HOME pointed into `test_dir`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ["HOME", "XDG_CONFIG_HOME", "LABPLAN_ENV"]
        .into_iter()
        .map(|name| (name, std::env::var(name).ok()))
        .collect();

    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().join("xdg"));
    std::env::remove_var("LABPLAN_ENV");

    let result = f();

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }
    result
}
