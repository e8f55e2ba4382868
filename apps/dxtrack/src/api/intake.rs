//! Survey submissions, submission mapping and roadmap generation.

use super::{ApiError, ApiResult, AppState};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use dxtrack_core::engine::{MapOutcome, MapSubmission, MapTarget, NewProjectData};
use dxtrack_core::submission::{ParsedSubmission, RawSubmission};
use dxtrack_core::{AssessmentInput, Evaluation, ProjectId, SubmissionId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

async fn fetch_feed(state: &AppState) -> Result<Vec<RawSubmission>, ApiError> {
    state.feed.fetch().await.map_err(|error| {
        warn!(%error, "submission feed unavailable");
        ApiError::Upstream(error.to_string())
    })
}

pub async fn list_submissions(State(state): State<AppState>) -> ApiResult<Vec<ParsedSubmission>> {
    let raw = fetch_feed(&state).await?;
    Ok(Json(state.engine.list_submissions(&raw)?))
}

pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<SubmissionId>,
) -> ApiResult<ParsedSubmission> {
    let raw = fetch_feed(&state).await?;
    Ok(Json(state.engine.find_submission(&raw, &id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapBody {
    submission_id: Option<SubmissionId>,
    project_id: Option<ProjectId>,
    create_new: bool,
    new_project_data: Option<NewProjectData>,
    submission_scores: Option<AssessmentInput>,
}

impl MapBody {
    fn into_request(self) -> Result<MapSubmission, ApiError> {
        let submission_id = self
            .submission_id
            .ok_or_else(|| ApiError::BadRequest("submissionId is required".into()))?;
        let target = match (self.create_new, self.new_project_data, self.project_id) {
            (true, Some(data), _) => MapTarget::CreateNew(data),
            (_, _, Some(project)) => MapTarget::Existing(project),
            _ => {
                return Err(ApiError::BadRequest(
                    "either projectId or createNew with newProjectData is required".into(),
                ));
            }
        };
        Ok(MapSubmission {
            submission_id,
            target,
            scores: self.submission_scores,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MapResponse {
    success: bool,
    #[serde(flatten)]
    outcome: MapOutcome,
}

pub async fn map_submission(
    State(state): State<AppState>,
    payload: Result<Json<MapBody>, JsonRejection>,
) -> ApiResult<MapResponse> {
    let Json(body) = payload?;
    let outcome = state.engine.map_submission(body.into_request()?)?;
    info!(
        project = %outcome.project.id,
        evaluation = %outcome.evaluation.id,
        stage = %outcome.evaluation.stage,
        "submission mapped"
    );
    Ok(Json(MapResponse {
        success: true,
        outcome,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoadmapBody {
    project_id: Option<ProjectId>,
}

#[derive(Debug, Serialize)]
pub struct RoadmapResponse {
    roadmap: String,
    evaluation: Evaluation,
}

/// Generate a roadmap for a project and store it on its evaluation. A failed
/// generation leaves the evaluation untouched.
pub async fn generate_roadmap(
    State(state): State<AppState>,
    payload: Result<Json<RoadmapBody>, JsonRejection>,
) -> ApiResult<RoadmapResponse> {
    let Json(body) = payload?;
    let project_id = body
        .project_id
        .ok_or_else(|| ApiError::BadRequest("projectId is required".into()))?;
    let (_, prompt) = state.engine.roadmap_prompt(&project_id)?;
    // the evaluation must exist before a completion is requested
    state.engine.evaluation_for_project(&project_id)?;

    let roadmap = state.narrative.generate(&prompt).await.map_err(|error| {
        warn!(project = %project_id, %error, "roadmap generation failed");
        ApiError::Upstream(error.to_string())
    })?;
    let evaluation = state.engine.record_roadmap(&project_id, roadmap.clone())?;
    info!(project = %project_id, "roadmap recorded");
    Ok(Json(RoadmapResponse {
        roadmap,
        evaluation,
    }))
}
