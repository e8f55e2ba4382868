//! Evaluation workflow: assignment, evaluator scoring, committee save,
//! final calibration, stage overwrite and meeting scheduling.
//!
//! Every mutation goes through [`Engine::modify`], so it is applied inside
//! one exclusive store write.

use super::Engine;
use crate::committee::{apply_evaluator_score, committee_average};
use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Evaluation, EvaluatorAssessment, StageId};
use crate::score::{AssessmentInput, MIN_LEVEL};
use crate::stage::{StageEvent, next_stage};
use crate::{EvaluationId, ProjectId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of an evaluator score submission. Presence is checked by the engine
/// so a missing field is a validation error, not a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluatorScoreInput {
    pub evaluator_id: Option<UserId>,
    pub assessment: Option<AssessmentInput>,
    pub comments: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitteeInput {
    /// Used only when no evaluator has scored yet.
    pub assessment: Option<AssessmentInput>,
    pub notes: Option<String>,
}

impl Engine {
    pub fn list_evaluations(&self) -> Result<Vec<Evaluation>> {
        self.store.list_evaluations()
    }

    pub fn get_evaluation(&self, id: &EvaluationId) -> Result<Evaluation> {
        self.store
            .get_evaluation(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Evaluation, id))
    }

    pub fn evaluation_for_project(&self, project: &ProjectId) -> Result<Evaluation> {
        self.store
            .find_evaluation_by_project(project)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Evaluation, format!("project {project}")))
    }

    /// The project's evaluation, created at `pending` if it has none yet.
    pub(crate) fn ensure_evaluation(&self, project: &ProjectId) -> Result<Evaluation> {
        if let Some(existing) = self.store.find_evaluation_by_project(project)? {
            return Ok(existing);
        }
        let mut evaluation = Evaluation::new(self.mint_evaluation_id()?, project.clone(), self.now());
        evaluation.stage = next_stage(evaluation.stage, StageEvent::Created);
        self.store.insert_evaluation(&evaluation)?;
        Ok(evaluation)
    }

    /// Keep ids that resolve to evaluators, in order, without duplicates.
    fn filter_evaluators(&self, ids: &[UserId]) -> Result<Vec<UserId>> {
        let mut kept: Vec<UserId> = Vec::with_capacity(ids.len());
        for id in ids {
            if kept.contains(id) {
                continue;
            }
            if self.store.get_user(id)?.is_some_and(|user| user.is_evaluator()) {
                kept.push(id.clone());
            }
        }
        Ok(kept)
    }

    /// Replace the assignment list. Ids that are not evaluators are dropped
    /// silently; a non-empty result moves the evaluation to `under_review`.
    pub fn assign_evaluators(&self, id: &EvaluationId, evaluators: &[UserId]) -> Result<Evaluation> {
        let assigned = self.filter_evaluators(evaluators)?;
        let count = assigned.len();
        self.modify(id, |evaluation| {
            evaluation.assigned_evaluators.clone_from(&assigned);
            evaluation.stage = next_stage(evaluation.stage, StageEvent::EvaluatorsAssigned(count));
            Ok(())
        })
    }

    /// Assign by project, creating the evaluation if the project has none.
    pub fn assign_project_evaluators(
        &self,
        project: &ProjectId,
        evaluators: &[UserId],
    ) -> Result<Evaluation> {
        self.get_project(project)?;
        let evaluation = self.ensure_evaluation(project)?;
        self.assign_evaluators(&evaluation.id, evaluators)
    }

    /// Record one evaluator's scores and recompute the committee average.
    pub fn submit_evaluator_score(
        &self,
        id: &EvaluationId,
        input: EvaluatorScoreInput,
    ) -> Result<Evaluation> {
        let evaluator_id = input
            .evaluator_id
            .ok_or_else(|| EngineError::validation("evaluatorId is required"))?;
        let assessment = input
            .assessment
            .ok_or_else(|| EngineError::validation("assessment is required"))?;

        self.get_evaluation(id)?;
        let evaluator = self
            .store
            .get_user(&evaluator_id)?
            .filter(|user| user.is_evaluator())
            .ok_or_else(|| EngineError::not_found(EntityKind::Evaluator, &evaluator_id))?;

        let assessment = assessment.require_all()?;
        assessment.ensure_whole_levels(MIN_LEVEL)?;

        let now = self.now();
        let entry = EvaluatorAssessment {
            evaluator_id: evaluator.id,
            evaluator_name: evaluator.name,
            assessment,
            comments: input.comments,
            submitted_at: now,
        };
        self.modify(id, |evaluation| {
            apply_evaluator_score(evaluation, entry.clone(), now)
        })
    }

    /// Save the committee result and move to `committee_evaluated`.
    ///
    /// With evaluator scores on record the committee assessment is their
    /// average and any supplied assessment is ignored. Without them the
    /// supplied assessment (every pillar 1..=5) is stored as is.
    pub fn save_committee(&self, id: &EvaluationId, input: CommitteeInput) -> Result<Evaluation> {
        let supplied = match input.assessment {
            Some(assessment) => {
                let assessment = assessment.require_all()?;
                assessment.ensure_at_least(MIN_LEVEL)?;
                Some(assessment)
            }
            None => None,
        };
        self.modify(id, |evaluation| {
            let committee = committee_average(&evaluation.evaluator_scores)
                .or(supplied)
                .ok_or_else(|| {
                    EngineError::validation(
                        "committee assessment is required when no evaluator has scored",
                    )
                })?;
            evaluation.committee_assessment = Some(committee);
            if let Some(notes) = &input.notes {
                evaluation.meeting_notes.clone_from(notes);
            }
            evaluation.stage = next_stage(evaluation.stage, StageEvent::CommitteeSaved);
            Ok(())
        })
    }

    /// Set or clear the calibrated final assessment. Stage is untouched.
    pub fn set_final_assessment(
        &self,
        id: &EvaluationId,
        assessment: Option<AssessmentInput>,
    ) -> Result<Evaluation> {
        let assessment = match assessment {
            Some(input) => {
                let assessment = input.require_all()?;
                assessment.ensure_at_least(MIN_LEVEL)?;
                Some(assessment)
            }
            None => None,
        };
        self.modify(id, |evaluation| {
            evaluation.final_assessment = assessment;
            evaluation.stage = next_stage(evaluation.stage, StageEvent::FinalCalibrated);
            Ok(())
        })
    }

    /// Administrative stage overwrite.
    pub fn set_stage(&self, id: &EvaluationId, stage: StageId) -> Result<Evaluation> {
        self.modify(id, |evaluation| {
            evaluation.stage = next_stage(evaluation.stage, StageEvent::Overwrite(stage));
            Ok(())
        })
    }

    /// Set (or clear) the meeting date; replace notes when given.
    pub fn schedule_meeting(
        &self,
        id: &EvaluationId,
        date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Result<Evaluation> {
        self.modify(id, |evaluation| {
            evaluation.meeting_date = date;
            if let Some(notes) = &notes {
                evaluation.meeting_notes.clone_from(notes);
            }
            Ok(())
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
