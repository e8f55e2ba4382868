//! Project CRUD and assignment by project.

use super::{ApiError, ApiResult, AppState};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use dxtrack_core::engine::{NewProject, ProjectUpdate};
use dxtrack_core::{Evaluation, Project, ProjectId, UserId};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Body of both assign routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    pub evaluator_ids: Option<Vec<UserId>>,
}

impl AssignBody {
    pub fn into_ids(self) -> Result<Vec<UserId>, ApiError> {
        self.evaluator_ids
            .ok_or_else(|| ApiError::BadRequest("evaluatorIds array required".into()))
    }
}

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    Ok(Json(state.engine.list_projects()?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Project> {
    Ok(Json(state.engine.get_project(&id)?))
}

pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let Json(input) = payload?;
    let project = state.engine.create_project(input)?;
    info!(project = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    payload: Result<Json<ProjectUpdate>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(update) = payload?;
    Ok(Json(state.engine.update_project(&id, update)?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Value> {
    let project = state.engine.delete_project(&id)?;
    info!(project = %project.id, "project deleted with its evaluation");
    Ok(Json(json!({ "success": true })))
}

pub async fn assign_evaluators(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    payload: Result<Json<AssignBody>, JsonRejection>,
) -> ApiResult<Evaluation> {
    let Json(body) = payload?;
    let ids = body.into_ids()?;
    Ok(Json(state.engine.assign_project_evaluators(&id, &ids)?))
}
