//! Survey intake and roadmap bookkeeping.

use super::Engine;
use super::admin::NewProject;
use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Evaluation, Project};
use crate::roadmap::{RoadmapPrompt, RoadmapRequest, build_roadmap_prompt};
use crate::score::AssessmentInput;
use crate::stage::{StageEvent, next_stage};
use crate::submission::{ParsedSubmission, RawSubmission, list_submissions};
use crate::{DepartmentId, ProjectId, SubmissionId};
use serde::{Deserialize, Serialize};

/// Project details for a submission that starts a new project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProjectData {
    pub name: String,
    /// First department when absent.
    pub department_id: Option<DepartmentId>,
    pub program_manager: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    Existing(ProjectId),
    CreateNew(NewProjectData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSubmission {
    pub submission_id: SubmissionId,
    pub target: MapTarget,
    /// Self-assessment levels read from the survey. Missing pillars read as 0.
    pub scores: Option<AssessmentInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOutcome {
    pub project: Project,
    pub evaluation: Evaluation,
}

impl Engine {
    /// Parse the feed and flag submissions already mapped.
    pub fn list_submissions(&self, raw: &[RawSubmission]) -> Result<Vec<ParsedSubmission>> {
        Ok(list_submissions(
            raw,
            &self.schema,
            &self.store.list_projects()?,
            &self.store.list_evaluations()?,
        ))
    }

    pub fn find_submission(
        &self,
        raw: &[RawSubmission],
        id: &SubmissionId,
    ) -> Result<ParsedSubmission> {
        self.list_submissions(raw)?
            .into_iter()
            .find(|submission| &submission.id == id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Submission, id))
    }

    /// Attach a submission to a project, creating the project if asked.
    ///
    /// Scores, when given, become the self-assessment and move the evaluation
    /// to `self_submitted` whatever its current stage.
    pub fn map_submission(&self, request: MapSubmission) -> Result<MapOutcome> {
        if request.submission_id.as_str().trim().is_empty() {
            return Err(EngineError::validation("submissionId is required"));
        }
        let self_assessment = match &request.scores {
            Some(scores) => {
                let assessment = scores.or_unset();
                assessment.ensure_whole_levels(0)?;
                Some(assessment)
            }
            None => None,
        };

        let project = match request.target {
            MapTarget::CreateNew(data) => {
                let department_id = match data.department_id {
                    Some(id) => id,
                    None => self
                        .store
                        .list_departments()?
                        .into_iter()
                        .next()
                        .map(|department| department.id)
                        .ok_or_else(|| {
                            EngineError::validation("no department exists to hold the project")
                        })?,
                };
                self.create_project_with_submission(
                    NewProject {
                        name: data.name,
                        department_id,
                        program_manager: data.program_manager,
                        city: data.city,
                    },
                    Some(request.submission_id.clone()),
                )?
            }
            MapTarget::Existing(id) => {
                let mut project = self.get_project(&id)?;
                project.submission_id = Some(request.submission_id.clone());
                self.store.put_project(&project)?;
                project
            }
        };

        let evaluation = self.ensure_evaluation(&project.id)?;
        let evaluation = self.modify(&evaluation.id, |evaluation| {
            evaluation.submission_id = Some(request.submission_id.clone());
            if let Some(assessment) = self_assessment {
                evaluation.self_assessment = assessment;
                evaluation.stage = next_stage(evaluation.stage, StageEvent::SelfAssessmentMapped);
            }
            Ok(())
        })?;
        Ok(MapOutcome {
            project,
            evaluation,
        })
    }

    /// Collect what the roadmap prompt needs for `project`.
    pub fn roadmap_request(&self, project: &ProjectId) -> Result<RoadmapRequest> {
        let project = self.get_project(project)?;
        let department_name = self
            .store
            .get_department(&project.department_id)?
            .map(|d| if d.name_en.is_empty() { d.name } else { d.name_en })
            .unwrap_or_else(|| project.department_id.to_string());
        let evaluation = self.store.find_evaluation_by_project(&project.id)?;
        Ok(RoadmapRequest {
            project_id: project.id,
            project_name: project.name,
            department_name,
            program_manager: project.program_manager,
            self_assessment: evaluation
                .as_ref()
                .map(|e| e.self_assessment)
                .unwrap_or_default(),
            committee_assessment: evaluation.and_then(|e| e.committee_assessment),
        })
    }

    /// Request plus the prompt built against the current rubric.
    pub fn roadmap_prompt(&self, project: &ProjectId) -> Result<(RoadmapRequest, RoadmapPrompt)> {
        let request = self.roadmap_request(project)?;
        let prompt = build_roadmap_prompt(&request, &self.config()?);
        Ok((request, prompt))
    }

    /// Store generated roadmap text on the project's evaluation.
    pub fn record_roadmap(&self, project: &ProjectId, roadmap: String) -> Result<Evaluation> {
        let evaluation = self.evaluation_for_project(project)?;
        self.modify(&evaluation.id, |evaluation| {
            evaluation.llm_roadmap = Some(roadmap.clone());
            Ok(())
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
