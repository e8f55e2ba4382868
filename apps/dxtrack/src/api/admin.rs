//! Rubric, departments, users and evaluator worklists.

use super::{ApiError, ApiResult, AppState};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use dxtrack_core::engine::{EvaluatorContext, NewDepartment, NewUser, UserUpdate};
use dxtrack_core::{Config, Department, User, UserId};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

pub async fn get_config(State(state): State<AppState>) -> ApiResult<Config> {
    Ok(Json(state.engine.config()?))
}

pub async fn put_config(
    State(state): State<AppState>,
    payload: Result<Json<Config>, JsonRejection>,
) -> ApiResult<Config> {
    let Json(config) = payload?;
    let config = state.engine.replace_config(config)?;
    info!("rubric replaced");
    Ok(Json(config))
}

pub async fn list_departments(State(state): State<AppState>) -> ApiResult<Vec<Department>> {
    Ok(Json(state.engine.list_departments()?))
}

pub async fn create_department(
    State(state): State<AppState>,
    payload: Result<Json<NewDepartment>, JsonRejection>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    let Json(input) = payload?;
    let department = state.engine.create_department(input)?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(Json(state.engine.list_users()?))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>) -> ApiResult<User> {
    Ok(Json(state.engine.get_user(&id)?))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(input) = payload?;
    let user = state.engine.create_user(input)?;
    info!(user = %user.id, role = ?user.role, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<User> {
    let Json(update) = payload?;
    Ok(Json(state.engine.update_user(&id, update)?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Value> {
    state.engine.delete_user(&id)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextQuery {
    user_id: Option<UserId>,
}

pub async fn evaluator_context(
    State(state): State<AppState>,
    query: Result<Query<ContextQuery>, QueryRejection>,
) -> ApiResult<EvaluatorContext> {
    let Query(query) = query?;
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::BadRequest("userId is required".into()))?;
    Ok(Json(state.engine.evaluator_context(&user_id)?))
}
