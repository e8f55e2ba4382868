//! # Data Model
//!
//! Records persisted by a [`Repository`](crate::storage::Repository).
//!
//! All records use camelCase field names on the wire. Collections that must
//! iterate deterministically (evaluator comments) use `BTreeMap`.

use crate::score::Assessment;
use crate::{DepartmentId, EvaluationId, ProjectId, SubmissionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// STAGES
// =============================================================================

/// Pipeline stage of an evaluation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    #[default]
    Pending,
    SelfSubmitted,
    UnderReview,
    CommitteeEvaluated,
    SummitReviewed,
    Completed,
}

impl StageId {
    /// Every stage in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::SelfSubmitted,
        Self::UnderReview,
        Self::CommitteeEvaluated,
        Self::SummitReviewed,
        Self::Completed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SelfSubmitted => "self_submitted",
            Self::UnderReview => "under_review",
            Self::CommitteeEvaluated => "committee_evaluated",
            Self::SummitReviewed => "summit_reviewed",
            Self::Completed => "completed",
        }
    }

    /// Stages that sit on an evaluator's open worklist.
    #[must_use]
    pub fn awaits_evaluator(self) -> bool {
        matches!(self, Self::SelfSubmitted | Self::UnderReview)
    }

    /// Stages that count as reviewed on an evaluator's worklist.
    #[must_use]
    pub fn is_reviewed(self) -> bool {
        matches!(self, Self::CommitteeEvaluated | Self::SummitReviewed)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = crate::EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == raw)
            .ok_or_else(|| crate::EngineError::validation(format!("unknown stage `{raw}`")))
    }
}

// =============================================================================
// EVALUATIONS
// =============================================================================

/// One evaluator's scores for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorAssessment {
    pub evaluator_id: UserId,
    /// Name at submission time; later renames do not rewrite it.
    pub evaluator_name: String,
    pub assessment: Assessment,
    /// Free text keyed by pillar id (or any other section key).
    #[serde(default)]
    pub comments: BTreeMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

/// The scoring record of a project. At most one per project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: EvaluationId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub submission_id: Option<SubmissionId>,
    #[serde(default)]
    pub self_assessment: Assessment,
    #[serde(default)]
    pub committee_assessment: Option<Assessment>,
    #[serde(default)]
    pub final_assessment: Option<Assessment>,
    #[serde(default)]
    pub evaluator_scores: Vec<EvaluatorAssessment>,
    /// Ordered, duplicate-free list of evaluator ids.
    #[serde(default)]
    pub assigned_evaluators: Vec<UserId>,
    #[serde(default)]
    pub stage: StageId,
    #[serde(default)]
    pub meeting_date: Option<NaiveDate>,
    #[serde(default)]
    pub meeting_notes: String,
    #[serde(default)]
    pub llm_roadmap: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// A fresh `pending` evaluation with no scores.
    #[must_use]
    pub fn new(id: EvaluationId, project_id: ProjectId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            project_id,
            submission_id: None,
            self_assessment: Assessment::UNSET,
            committee_assessment: None,
            final_assessment: None,
            evaluator_scores: Vec::new(),
            assigned_evaluators: Vec::new(),
            stage: StageId::Pending,
            meeting_date: None,
            meeting_notes: String::new(),
            llm_roadmap: None,
            created_at,
            updated_at: None,
        }
    }

    /// True if `user` is on the assignment list.
    #[must_use]
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.assigned_evaluators.contains(user)
    }

    /// The stored score sheet from `evaluator`, if any.
    #[must_use]
    pub fn evaluator_score(&self, evaluator: &UserId) -> Option<&EvaluatorAssessment> {
        self.evaluator_scores
            .iter()
            .find(|entry| &entry.evaluator_id == evaluator)
    }
}

// =============================================================================
// PROJECTS, DEPARTMENTS, USERS
// =============================================================================

/// City assigned when a project is created without one.
pub const DEFAULT_CITY: &str = "Riyadh";

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub department_id: DepartmentId,
    #[serde(default)]
    pub program_manager: String,
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default)]
    pub submission_id: Option<SubmissionId>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub name_en: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Evaluator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::Evaluator => "evaluator",
        })
    }
}

/// An administrator or evaluator. Credentials live outside this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_evaluator(&self) -> bool {
        self.role == Role::Evaluator
    }
}

// =============================================================================
// TESTS
// =============================================================================
