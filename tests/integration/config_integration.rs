//! Layered configuration feeding the run context

use crate::integration::test_utils::with_xdg_env;
use labplan::cli::{Commands, RunContext};
use labplan::config::ConfigLoader;
use labplan::error::ApiError;
use std::fs;
use tempfile::TempDir;

fn write(path: &std::path::Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn workspace_file_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write(
        &test_dir.path().join("xdg").join("labplan").join("config.toml"),
        "[archive]\nupload_id = \"global\"\nupload_root = \"upload\"\n[logging]\nlevel = \"warn\"\n",
    );
    write(
        &workspace.join("config").join("config.toml"),
        "[archive]\nupload_id = \"workspace\"\n",
    );

    let ctx = with_xdg_env(&test_dir, || RunContext::new(workspace.clone(), None)).unwrap();
    assert_eq!(ctx.workspace_root(), &workspace);
    assert_eq!(ctx.config().archive.upload_id, "workspace");
    assert_eq!(ctx.config().archive.upload_root, workspace.join("upload"));
    assert_eq!(ctx.config().logging.level, "warn");
    assert!(workspace.join("upload").is_dir());
}

#[test]
fn explicit_config_file_skips_the_layers() {
    let test_dir = TempDir::new().unwrap();
    write(
        &test_dir.path().join("xdg").join("labplan").join("config.toml"),
        "[archive]\nupload_id = \"global\"\n",
    );
    let config_file = test_dir.path().join("lab").join("labplan.toml");
    write(
        &config_file,
        "[archive]\nupload_id = \"explicit\"\nupload_root = \"data\"\n",
    );

    let config = with_xdg_env(&test_dir, || ConfigLoader::load_from_file(&config_file)).unwrap();
    assert_eq!(config.archive.upload_id, "explicit");
    assert_eq!(
        config.archive.upload_root,
        test_dir.path().join("lab").join("data")
    );
}

#[test]
fn definition_files_extend_the_schema() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write(
        &workspace.join("config").join("config.toml"),
        "[schema]\ndefinitions = [\"defs/drop_casting.toml\"]\n",
    );
    write(
        &workspace.join("defs").join("drop_casting.toml"),
        "[[sections]]\nname = \"DropCasting\"\nextends = \"Process\"\nfields = []\n",
    );

    let ctx = with_xdg_env(&test_dir, || RunContext::new(workspace.clone(), None)).unwrap();
    let output = ctx
        .execute(&Commands::Schema {
            section: Some("DropCasting".to_string()),
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("Extends: Process"));
}

#[test]
fn invalid_configuration_is_rejected_with_every_problem() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write(
        &workspace.join("config").join("config.toml"),
        "[archive]\nupload_id = \"\"\n[schema]\ndefinitions = [\"missing.toml\"]\n",
    );

    let result = with_xdg_env(&test_dir, || RunContext::new(workspace.clone(), None));
    match result {
        Err(ApiError::ConfigError(message)) => {
            assert!(message.contains("Upload id cannot be empty"));
            assert!(message.contains("Definition file not found"));
        }
        Err(other) => panic!("Expected ConfigError, got {:?}", other),
        Ok(_) => panic!("Expected ConfigError"),
    }
}
