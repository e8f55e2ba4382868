//! Integration tests for dxtrack CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use dxtrack::cli::{
    CliError, cmd_dashboard, cmd_export, cmd_import, cmd_init, cmd_stats, open_engine,
};
use dxtrack_core::engine::{NewDepartment, NewProject};
use dxtrack_core::formats::Snapshot;
use dxtrack_core::{Assessment, Config, StageId};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Initialise a database with one department and one scored project.
fn create_populated_db(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("dxtrack.redb");
    cmd_init(&db_path, false).unwrap();
    populate(&db_path);
    db_path
}

fn populate(db_path: &Path) {
    let engine = open_engine(db_path).unwrap();
    engine
        .create_department(NewDepartment {
            id: Some("dept_1".into()),
            name: "التخطيط".into(),
            name_en: "Planning".into(),
        })
        .unwrap();
    let project = engine
        .create_project(NewProject {
            name: "Citizen Portal".into(),
            department_id: "dept_1".into(),
            program_manager: Some("Sara".into()),
            city: None,
        })
        .unwrap();
    let evaluation = engine.evaluation_for_project(&project.id).unwrap();
    engine
        .set_final_assessment(
            &evaluation.id,
            Some(Assessment::from_levels([2, 3, 4, 3, 3]).unwrap().into()),
        )
        .unwrap();
    engine
        .set_stage(&evaluation.id, StageId::CommitteeEvaluated)
        .unwrap();
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database_with_default_rubric() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let result = cmd_init(&db_path, false);
    assert!(result.is_ok());
    assert!(db_path.exists());

    let engine = open_engine(&db_path).unwrap();
    assert_eq!(engine.store().get_config().unwrap(), Some(Config::default()));
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();

    let result = cmd_init(&db_path, false);
    assert!(matches!(result, Err(CliError::AlreadyExists(_))));
}

#[test]
fn test_init_with_force_starts_empty() {
    let temp = create_temp_dir();
    let db_path = create_populated_db(&temp);

    cmd_init(&db_path, true).unwrap();
    let engine = open_engine(&db_path).unwrap();
    assert!(engine.list_projects().unwrap().is_empty());
}

#[test]
fn test_open_missing_database_fails() {
    let temp = create_temp_dir();
    let result = open_engine(&temp.path().join("missing.redb"));
    assert!(matches!(result, Err(CliError::Missing(_))));
}

// =============================================================================
// REPORT COMMAND TESTS
// =============================================================================

#[test]
fn test_stats_and_dashboard_run() {
    let temp = create_temp_dir();
    let db_path = create_populated_db(&temp);

    assert!(cmd_stats(&db_path, false).is_ok());
    assert!(cmd_stats(&db_path, true).is_ok());
    assert!(cmd_dashboard(&db_path, false).is_ok());
    assert!(cmd_dashboard(&db_path, true).is_ok());
}

#[test]
fn test_reports_need_existing_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("nope.redb");
    assert!(cmd_stats(&db_path, false).is_err());
    assert!(cmd_dashboard(&db_path, true).is_err());
}

// =============================================================================
// EXPORT / IMPORT TESTS
// =============================================================================

#[test]
fn test_export_writes_snapshot() {
    let temp = create_temp_dir();
    let db_path = create_populated_db(&temp);
    let out = temp.path().join("snapshot.json");

    cmd_export(&db_path, &out).unwrap();

    let snapshot: Snapshot =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(snapshot.projects.len(), 1);
    assert_eq!(snapshot.evaluations.len(), 1);
    assert_eq!(snapshot.evaluations[0].stage, StageId::CommitteeEvaluated);
}

#[test]
fn test_export_import_roundtrip_preserves_data() {
    let temp = create_temp_dir();
    let source = create_populated_db(&temp);
    let out = temp.path().join("snapshot.json");
    cmd_export(&source, &out).unwrap();

    let target = temp.path().join("copy.redb");
    cmd_import(&target, &out).unwrap();

    let original = open_engine(&source).unwrap().export_snapshot().unwrap();
    let copy = open_engine(&target).unwrap().export_snapshot().unwrap();
    assert_eq!(original, copy);

    let report = open_engine(&target).unwrap().department_report().unwrap();
    assert_eq!(report.departments[0].evaluated_count, 1);
    assert_eq!(report.sector.total_avg.tenths(), 30);
}

#[test]
fn test_import_twice_collides() {
    let temp = create_temp_dir();
    let source = create_populated_db(&temp);
    let out = temp.path().join("snapshot.json");
    cmd_export(&source, &out).unwrap();

    let target = temp.path().join("copy.redb");
    cmd_import(&target, &out).unwrap();
    assert!(matches!(
        cmd_import(&target, &out),
        Err(CliError::Engine(_))
    ));
}

#[test]
fn test_import_invalid_json() {
    let temp = create_temp_dir();
    let input = temp.path().join("broken.json");
    std::fs::write(&input, "{ not json").unwrap();

    let result = cmd_import(&temp.path().join("db.redb"), &input);
    assert!(matches!(result, Err(CliError::Json(_))));
}
