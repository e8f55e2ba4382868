//! # Rollups
//!
//! Department, sector, dashboard and pipeline aggregates.
//!
//! Two different averages live here on purpose:
//! - [`sector_average`] is a mean of department means (each department
//!   weighs the same regardless of size);
//! - [`compute_dashboard`] pools every counted evaluation.
//!
//! Both only count evaluations passing
//! [`should_include_in_aggregates`]. All figures are one decimal.

use crate::model::{Department, Evaluation, Project, StageId};
use crate::rubric::Config;
use crate::score::{Assessment, Score, mean_assessment};
use crate::scoring::{get_active_score, overall_score, should_include_in_aggregates};
use crate::{DepartmentId, ProjectId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DEPARTMENTS AND SECTOR
// =============================================================================

/// Per-department project count and average active score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub id: DepartmentId,
    pub name: String,
    pub name_en: String,
    pub project_count: usize,
    pub evaluated_count: usize,
    /// All zero when nothing in the department counts.
    pub avg_scores: Assessment,
}

/// Compute one [`DepartmentStat`] per department, in input order.
#[must_use]
pub fn compute_department_stats(
    departments: &[Department],
    projects: &[Project],
    evaluations: &[Evaluation],
) -> Vec<DepartmentStat> {
    let department_of: BTreeMap<&ProjectId, &DepartmentId> = projects
        .iter()
        .map(|project| (&project.id, &project.department_id))
        .collect();

    let mut counted: BTreeMap<&DepartmentId, Vec<&Assessment>> = BTreeMap::new();
    for evaluation in evaluations {
        if !should_include_in_aggregates(evaluation) {
            continue;
        }
        let (Some(department), Some(score)) = (
            department_of.get(&evaluation.project_id),
            get_active_score(evaluation),
        ) else {
            continue;
        };
        counted.entry(*department).or_default().push(score);
    }

    departments
        .iter()
        .map(|department| {
            let scores = counted.get(&department.id);
            DepartmentStat {
                id: department.id.clone(),
                name: department.name.clone(),
                name_en: department.name_en.clone(),
                project_count: projects
                    .iter()
                    .filter(|p| p.department_id == department.id)
                    .count(),
                evaluated_count: scores.map_or(0, Vec::len),
                avg_scores: scores
                    .and_then(|s| mean_assessment(s.iter().copied()))
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Sector-wide mean of department means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorAverage {
    pub pillars: Assessment,
    /// Mean of the five sector pillar averages.
    pub total_avg: Score,
    /// Departments that contributed (those with `evaluatedCount > 0`).
    pub department_count: usize,
}

#[must_use]
pub fn sector_average(stats: &[DepartmentStat]) -> SectorAverage {
    let evaluated: Vec<&Assessment> = stats
        .iter()
        .filter(|stat| stat.evaluated_count > 0)
        .map(|stat| &stat.avg_scores)
        .collect();
    let pillars = mean_assessment(evaluated.iter().copied()).unwrap_or_default();
    SectorAverage {
        total_avg: overall_score(&pillars),
        pillars,
        department_count: evaluated.len(),
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Stage headcount shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCount {
    pub id: StageId,
    pub name: String,
    pub color: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_projects: usize,
    pub evaluated_projects: usize,
    pub pending_projects: usize,
    /// Pooled per-pillar mean over every counted evaluation.
    pub overall_avg: Assessment,
    pub overall_score: Score,
    pub pipeline_stats: Vec<PipelineCount>,
}

#[must_use]
pub fn compute_dashboard(
    projects: &[Project],
    evaluations: &[Evaluation],
    config: &Config,
) -> Dashboard {
    let counted: Vec<&Assessment> = evaluations
        .iter()
        .filter(|e| should_include_in_aggregates(e))
        .filter_map(get_active_score)
        .collect();
    let overall_avg = mean_assessment(counted.iter().copied()).unwrap_or_default();

    let with_evaluation: BTreeSet<&ProjectId> =
        evaluations.iter().map(|e| &e.project_id).collect();
    let unevaluated = projects
        .iter()
        .filter(|p| !with_evaluation.contains(&p.id))
        .count();

    let pipeline_stats = config
        .ordered_stages()
        .into_iter()
        .map(|stage| {
            let in_stage = evaluations.iter().filter(|e| e.stage == stage.id).count();
            let count = if stage.id == StageId::Pending {
                in_stage + unevaluated
            } else {
                in_stage
            };
            PipelineCount {
                id: stage.id,
                name: stage.name.clone(),
                color: stage.color.clone(),
                count,
            }
        })
        .collect();

    Dashboard {
        total_projects: projects.len(),
        evaluated_projects: counted.len(),
        pending_projects: projects.len().saturating_sub(counted.len()),
        overall_score: overall_score(&overall_avg),
        overall_avg,
        pipeline_stats,
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// An evaluation shown on the pipeline board with its project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEntry {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub project: Option<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub id: StageId,
    pub name: String,
    pub order: u8,
    pub color: String,
    pub count: usize,
    pub projects: Vec<PipelineEntry>,
}

/// Evaluations grouped by configured stage, in stage order.
#[must_use]
pub fn pipeline_stats(
    projects: &[Project],
    evaluations: &[Evaluation],
    config: &Config,
) -> Vec<PipelineStage> {
    let by_id: BTreeMap<&ProjectId, &Project> = projects.iter().map(|p| (&p.id, p)).collect();
    config
        .ordered_stages()
        .into_iter()
        .map(|stage| {
            let entries: Vec<PipelineEntry> = evaluations
                .iter()
                .filter(|e| e.stage == stage.id)
                .map(|e| PipelineEntry {
                    evaluation: e.clone(),
                    project: by_id.get(&e.project_id).map(|p| (*p).clone()),
                })
                .collect();
            PipelineStage {
                id: stage.id,
                name: stage.name.clone(),
                order: stage.order,
                color: stage.color.clone(),
                count: entries.len(),
                projects: entries,
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
