//! # Formats Module
//!
//! The portable snapshot document used by `dxtrack import` / `dxtrack
//! export`: every record plus the rubric config in one JSON-serialisable
//! value.
//!
//! File I/O stays in the app layer (apps/dxtrack). This module only defines
//! the shape and its consistency checks.

use crate::error::{EngineError, Result};
use crate::model::{Department, Evaluation, Project, User};
use crate::rubric::Config;
use crate::{EvaluationId, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub config: Option<Config>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            config: None,
            departments: Vec::new(),
            users: Vec::new(),
            projects: Vec::new(),
            evaluations: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Reject snapshots that would break store invariants: unknown version,
    /// duplicate evaluation ids, or two evaluations for one project.
    pub fn validate(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(EngineError::validation(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        let mut ids: BTreeSet<&EvaluationId> = BTreeSet::new();
        let mut projects: BTreeSet<&ProjectId> = BTreeSet::new();
        for evaluation in &self.evaluations {
            if !ids.insert(&evaluation.id) {
                return Err(EngineError::validation(format!(
                    "duplicate evaluation id {}",
                    evaluation.id
                )));
            }
            if !projects.insert(&evaluation.project_id) {
                return Err(EngineError::validation(format!(
                    "project {} has more than one evaluation",
                    evaluation.project_id
                )));
            }
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }
}
