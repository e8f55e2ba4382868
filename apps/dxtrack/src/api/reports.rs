//! Read-only rollups.

use super::{ApiResult, AppState};
use axum::Json;
use axum::extract::State;
use dxtrack_core::engine::DepartmentReport;
use dxtrack_core::rollup::{Dashboard, PipelineStage};
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    Ok(Json(state.engine.dashboard()?))
}

pub async fn pipeline(State(state): State<AppState>) -> ApiResult<Vec<PipelineStage>> {
    Ok(Json(state.engine.pipeline()?))
}

pub async fn department_stats(State(state): State<AppState>) -> ApiResult<DepartmentReport> {
    Ok(Json(state.engine.department_report()?))
}
