//! Evaluation lifecycle: assignment, scoring, committee, calibration.

use super::projects::AssignBody;
use super::{ApiResult, AppState};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use dxtrack_core::engine::{CommitteeInput, EvaluatorScoreInput};
use dxtrack_core::{AssessmentInput, Evaluation, EvaluationId, StageId};
use serde::Deserialize;
use tracing::info;

pub async fn list_evaluations(State(state): State<AppState>) -> ApiResult<Vec<Evaluation>> {
    Ok(Json(state.engine.list_evaluations()?))
}

pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
) -> ApiResult<Evaluation> {
    Ok(Json(state.engine.get_evaluation(&id)?))
}

pub async fn assign_evaluators(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    payload: Result<Json<AssignBody>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(body) = payload?;
    let ids = body.into_ids()?;
    Ok(Json(state.engine.assign_evaluators(&id, &ids)?))
}

pub async fn submit_score(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    payload: Result<Json<EvaluatorScoreInput>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(input) = payload?;
    let evaluation = state.engine.submit_evaluator_score(&id, input)?;
    info!(
        evaluation = %evaluation.id,
        scores = evaluation.evaluator_scores.len(),
        "evaluator score recorded"
    );
    Ok(Json(evaluation))
}

pub async fn save_committee(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    payload: Result<Json<CommitteeInput>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(input) = payload?;
    Ok(Json(state.engine.save_committee(&id, input)?))
}

#[derive(Debug, Deserialize)]
pub struct FinalBody {
    #[serde(default)]
    assessment: Option<AssessmentInput>,
}

pub async fn set_final(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    payload: Result<Json<FinalBody>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(body) = payload?;
    Ok(Json(state.engine.set_final_assessment(&id, body.assessment)?))
}

#[derive(Debug, Deserialize)]
pub struct StageBody {
    stage: StageId,
}

pub async fn set_stage(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    payload: Result<Json<StageBody>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(body) = payload?;
    let evaluation = state.engine.set_stage(&id, body.stage)?;
    info!(evaluation = %evaluation.id, stage = %evaluation.stage, "stage overwritten");
    Ok(Json(evaluation))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingBody {
    #[serde(default)]
    meeting_date: Option<NaiveDate>,
    #[serde(default)]
    meeting_notes: Option<String>,
}

pub async fn schedule_meeting(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    payload: Result<Json<MeetingBody>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(body) = payload?;
    Ok(Json(state.engine.schedule_meeting(
        &id,
        body.meeting_date,
        body.meeting_notes,
    )?))
}
