//! # HTTP API
//!
//! axum router over a shared [`Engine`]. Everything under `/api` goes
//! through the rate limiter and, when a key is configured, bearer auth.
//! `/health` is open.

mod admin;
mod error;
mod evaluations;
mod intake;
mod projects;
mod reports;

pub use error::ApiError;

use crate::feed::SubmissionSource;
use crate::narrative::NarrativeGenerator;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use dxtrack_core::Engine;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub type ApiResult<T> = Result<axum::Json<T>, ApiError>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub feed: Arc<dyn SubmissionSource>,
    pub narrative: Arc<dyn NarrativeGenerator>,
    api_key: Option<Arc<str>>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    pub fn new(
        engine: Engine,
        feed: Arc<dyn SubmissionSource>,
        narrative: Arc<dyn NarrativeGenerator>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            feed,
            narrative,
            api_key: None,
            limiter: None,
        }
    }

    /// Require `Authorization: Bearer <key>` on `/api` routes.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.map(Arc::from);
        self
    }

    /// Global limit of `per_second` requests. Zero turns limiting off.
    #[must_use]
    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.limiter = NonZeroU32::new(per_second)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // reports
        .route("/api/dashboard", get(reports::dashboard))
        .route("/api/pipeline", get(reports::pipeline))
        .route("/api/departments/stats", get(reports::department_stats))
        // administration
        .route("/api/config", get(admin::get_config).put(admin::put_config))
        .route(
            "/api/departments",
            get(admin::list_departments).post(admin::create_department),
        )
        .route("/api/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/api/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/api/evaluator/context", get(admin::evaluator_context))
        // projects
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/projects/map", post(intake::map_submission))
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/projects/{id}/assign", post(projects::assign_evaluators))
        // evaluations
        .route("/api/evaluations", get(evaluations::list_evaluations))
        .route("/api/evaluations/{id}", get(evaluations::get_evaluation))
        .route(
            "/api/evaluations/{id}/assign",
            post(evaluations::assign_evaluators),
        )
        .route("/api/evaluations/{id}/score", post(evaluations::submit_score))
        .route(
            "/api/evaluations/{id}/committee",
            post(evaluations::save_committee),
        )
        .route("/api/evaluations/{id}/final", put(evaluations::set_final))
        .route("/api/evaluations/{id}/stage", put(evaluations::set_stage))
        .route("/api/evaluations/{id}/meeting", put(evaluations::schedule_meeting))
        // intake
        .route("/api/submissions", get(intake::list_submissions))
        .route("/api/submissions/{id}", get(intake::get_submission))
        .route("/api/roadmap", post(intake::generate_roadmap))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(reports::health))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();
    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(next.run(request).await)
    } else {
        warn!(path = %request.uri().path(), "rejected request without valid API key");
        Err(ApiError::Unauthorized)
    }
}

async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match &state.limiter {
        Some(limiter) if limiter.check().is_err() => Err(ApiError::RateLimited),
        _ => Ok(next.run(request).await),
    }
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "dxtrack API listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
