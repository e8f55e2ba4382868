//! # CLI commands
//!
//! Offline operations over a redb database file: init, snapshot import and
//! export, and the two read-only reports.

use dxtrack_core::formats::Snapshot;
use dxtrack_core::storage::RedbStore;
use dxtrack_core::{Config, Engine, EngineError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("database already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error("database not found at {0} (run `dxtrack init` first)")]
    Missing(PathBuf),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

/// Engine over the redb file at `db_path`, which must exist.
pub fn open_engine(db_path: &Path) -> CliResult<Engine> {
    if !db_path.exists() {
        return Err(CliError::Missing(db_path.to_path_buf()));
    }
    Ok(Engine::new(RedbStore::open(db_path)?))
}

pub fn cmd_init(db_path: &Path, force: bool) -> CliResult<()> {
    if db_path.exists() {
        if !force {
            return Err(CliError::AlreadyExists(db_path.to_path_buf()));
        }
        std::fs::remove_file(db_path)?;
    }
    let engine = Engine::new(RedbStore::open(db_path)?);
    engine.replace_config(Config::default())?;
    info!(path = %db_path.display(), "database initialised");
    println!("Initialised {}", db_path.display());
    Ok(())
}

/// Import a snapshot, creating the database when it does not exist yet.
pub fn cmd_import(db_path: &Path, input: &Path) -> CliResult<()> {
    let text = std::fs::read_to_string(input)?;
    let snapshot: Snapshot = serde_json::from_str(&text)?;
    let engine = Engine::new(RedbStore::open(db_path)?);
    let summary = engine.import_snapshot(&snapshot)?;
    info!(
        departments = summary.departments,
        users = summary.users,
        projects = summary.projects,
        evaluations = summary.evaluations,
        "snapshot imported"
    );
    println!(
        "Imported {} departments, {} users, {} projects, {} evaluations",
        summary.departments, summary.users, summary.projects, summary.evaluations
    );
    Ok(())
}

pub fn cmd_export(db_path: &Path, output: &Path) -> CliResult<()> {
    let engine = open_engine(db_path)?;
    let snapshot = engine.export_snapshot()?;
    std::fs::write(output, serde_json::to_string_pretty(&snapshot)?)?;
    println!(
        "Exported {} projects and {} evaluations to {}",
        snapshot.projects.len(),
        snapshot.evaluations.len(),
        output.display()
    );
    Ok(())
}

pub fn cmd_stats(db_path: &Path, json: bool) -> CliResult<()> {
    let engine = open_engine(db_path)?;
    let report = engine.department_report()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:<24} {:>8} {:>9}   {:>4} {:>4} {:>4} {:>4} {:>4}",
        "department", "projects", "evaluated", "str", "ops", "tech", "data", "cx"
    );
    for stat in &report.departments {
        let name = if stat.name_en.is_empty() {
            &stat.name
        } else {
            &stat.name_en
        };
        let columns: Vec<String> = stat
            .avg_scores
            .iter()
            .map(|(_, score)| format!("{:>4}", score.one_decimal()))
            .collect();
        println!(
            "{:<24} {:>8} {:>9}   {}",
            name,
            stat.project_count,
            stat.evaluated_count,
            columns.join(" ")
        );
    }
    println!(
        "Sector average {} over {} departments",
        report.sector.total_avg.one_decimal(),
        report.sector.department_count
    );
    Ok(())
}

pub fn cmd_dashboard(db_path: &Path, json: bool) -> CliResult<()> {
    let engine = open_engine(db_path)?;
    let dashboard = engine.dashboard()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!("Projects:  {}", dashboard.total_projects);
    println!("Evaluated: {}", dashboard.evaluated_projects);
    println!("Pending:   {}", dashboard.pending_projects);
    println!("Overall:   {}", dashboard.overall_score.one_decimal());
    for stage in &dashboard.pipeline_stats {
        println!("  {:<20} {}", stage.id.as_str(), stage.count);
    }
    Ok(())
}
