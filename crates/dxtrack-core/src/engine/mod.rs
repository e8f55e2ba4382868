//! # Engine
//!
//! [`Engine`] drives every operation over an injected
//! [`Repository`]. It holds no other state than the store, a clock and the
//! survey schema, so the same engine runs over the in-memory store in tests
//! and over redb in production.
//!
//! Operations are grouped by concern:
//! - `evaluations`: assignment, evaluator scoring, committee, calibration,
//!   stage and meeting updates;
//! - `admin`: projects, departments, users, evaluator worklists;
//! - `intake`: survey submissions and roadmap prompts;
//! - this module: config, rollups and snapshots.

mod admin;
mod evaluations;
mod intake;

pub use admin::{
    EvaluatorContext, NewDepartment, NewProject, NewUser, ProjectUpdate, UserUpdate, WorklistItem,
};
pub use evaluations::{CommitteeInput, EvaluatorScoreInput};
pub use intake::{MapOutcome, MapSubmission, MapTarget, NewProjectData};

use crate::error::{EngineError, EntityKind, Result};
use crate::formats::Snapshot;
use crate::model::Evaluation;
use crate::rollup::{
    self, Dashboard, DepartmentStat, PipelineStage, SectorAverage, compute_department_stats,
};
use crate::rubric::Config;
use crate::storage::Repository;
use crate::submission::SubmissionSchema;
use crate::EvaluationId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Department stats together with the sector figure derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentReport {
    pub departments: Vec<DepartmentStat>,
    pub sector: SectorAverage,
}

/// Record counts written by [`Engine::import_snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub departments: usize,
    pub users: usize,
    pub projects: usize,
    pub evaluations: usize,
}

/// The evaluation scoring and stage engine.
pub struct Engine {
    store: Box<dyn Repository>,
    clock: fn() -> DateTime<Utc>,
    schema: SubmissionSchema,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine over `store`, using the wall clock and the default survey schema.
    pub fn new(store: impl Repository + 'static) -> Self {
        Self {
            store: Box::new(store),
            clock: Utc::now,
            schema: SubmissionSchema::default(),
        }
    }

    /// Replace the clock (tests pin timestamps with this).
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: SubmissionSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn store(&self) -> &dyn Repository {
        self.store.as_ref()
    }

    pub fn schema(&self) -> &SubmissionSchema {
        &self.schema
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Mint `<prefix>_<n>`, skipping values already taken (imported records
    /// may use ids the sequence has not reached yet).
    pub(crate) fn mint_id(
        &self,
        kind: EntityKind,
        taken: impl Fn(&str) -> Result<bool>,
    ) -> Result<String> {
        loop {
            let candidate = format!("{}_{}", kind.id_prefix(), self.store.next_sequence(kind)?);
            if !taken(&candidate)? {
                return Ok(candidate);
            }
        }
    }

    /// Run `update` atomically on an evaluation and stamp `updatedAt`.
    pub(crate) fn modify(
        &self,
        id: &EvaluationId,
        mut update: impl FnMut(&mut Evaluation) -> Result<()>,
    ) -> Result<Evaluation> {
        let now = self.now();
        self.store.modify_evaluation(id, &mut |evaluation| {
            update(evaluation)?;
            evaluation.updated_at = Some(now);
            Ok(())
        })
    }

    // =========================================================================
    // CONFIG
    // =========================================================================

    /// The stored rubric, or the built-in default before one is saved.
    pub fn config(&self) -> Result<Config> {
        Ok(self.store.get_config()?.unwrap_or_default())
    }

    pub fn replace_config(&self, config: Config) -> Result<Config> {
        config.validate()?;
        self.store.put_config(&config)?;
        Ok(config)
    }

    // =========================================================================
    // ROLLUPS
    // =========================================================================

    pub fn department_report(&self) -> Result<DepartmentReport> {
        let departments = compute_department_stats(
            &self.store.list_departments()?,
            &self.store.list_projects()?,
            &self.store.list_evaluations()?,
        );
        let sector = rollup::sector_average(&departments);
        Ok(DepartmentReport {
            departments,
            sector,
        })
    }

    pub fn dashboard(&self) -> Result<Dashboard> {
        Ok(rollup::compute_dashboard(
            &self.store.list_projects()?,
            &self.store.list_evaluations()?,
            &self.config()?,
        ))
    }

    pub fn pipeline(&self) -> Result<Vec<PipelineStage>> {
        Ok(rollup::pipeline_stats(
            &self.store.list_projects()?,
            &self.store.list_evaluations()?,
            &self.config()?,
        ))
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    pub fn export_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            config: self.store.get_config()?,
            departments: self.store.list_departments()?,
            users: self.store.list_users()?,
            projects: self.store.list_projects()?,
            evaluations: self.store.list_evaluations()?,
            ..Snapshot::default()
        })
    }

    /// Load every record of `snapshot`. Existing records with the same id
    /// are replaced; evaluations must not collide with stored ones.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportSummary> {
        snapshot.validate()?;
        if let Some(config) = &snapshot.config {
            self.store.put_config(config)?;
        }
        for department in &snapshot.departments {
            self.store.put_department(department)?;
        }
        for user in &snapshot.users {
            self.store.put_user(user)?;
        }
        for project in &snapshot.projects {
            self.store.put_project(project)?;
        }
        for evaluation in &snapshot.evaluations {
            self.store.insert_evaluation(evaluation).map_err(|error| match error {
                EngineError::Validation(message) => {
                    EngineError::validation(format!("cannot import {}: {message}", evaluation.id))
                }
                other => other,
            })?;
        }
        Ok(ImportSummary {
            departments: snapshot.departments.len(),
            users: snapshot.users.len(),
            projects: snapshot.projects.len(),
            evaluations: snapshot.evaluations.len(),
        })
    }
}

// =============================================================================
// TEST FIXTURES
// =============================================================================
