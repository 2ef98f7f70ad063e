// routes.rs — axum router over the synchronous handlers in api.rs.
//
// Handlers do blocking file I/O under std mutexes, so every call is moved
// onto tokio's blocking pool. Body and query rejections are converted to
// the standard INVALID_REQUEST error body instead of axum's plain-text ones.

use std::future::Future;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, OriginalUri, Query, Request, State};
use axum::http::request::Parts;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dtm_workspace::CreateProjectRequest;

use crate::api::{
    self, CreateProjectResponse, HistoryQuery, HistoryResponse, ProjectsResponse,
    RestoreLatestRequest, RestoreRequest, RestoreResponse, SaveTokenRequest, SaveTokenResponse,
    ValidateQuery, ValidateResponse,
};
use crate::error::ApiError;
use crate::state::{AppState, GovernanceStore};

/// `Json<T>` whose rejection is an [`ApiError`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query<T>` whose rejection is an [`ApiError`].
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Build the governance API router.
pub fn router(state: AppState) -> Router {
    let allow_cors = state.config.allow_cors;

    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/save-token", post(save_token))
        .route("/api/global-guard/history", get(history))
        .route("/api/global-guard/restore", post(restore))
        .route("/api/global-guard/restore-latest", post(restore_latest))
        .route("/api/validate-figma-export", get(validate))
        .route("/api/workspace/create-project", post(create_project))
        .route("/api/workspace/projects", get(list_projects))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http());

    let router = if allow_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

fn blocking<T, F>(state: AppState, f: F) -> impl Future<Output = Result<Json<T>, ApiError>>
where
    T: Send + 'static,
    F: FnOnce(&GovernanceStore) -> Result<T, ApiError> + Send + 'static,
{
    async move {
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| ApiError::Internal(format!("handler task failed: {}", e)))?
            .map(Json)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn save_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveTokenRequest>,
) -> Result<Json<SaveTokenResponse>, ApiError> {
    blocking(state, move |store| api::handle_save_token(store, request)).await
}

async fn history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    blocking(state, move |store| api::handle_history(store, query)).await
}

async fn restore(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RestoreRequest>,
) -> Result<Json<RestoreResponse>, ApiError> {
    blocking(state, move |store| api::handle_restore(store, request)).await
}

async fn restore_latest(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RestoreLatestRequest>,
) -> Result<Json<RestoreResponse>, ApiError> {
    blocking(state, move |store| api::handle_restore_latest(store, request)).await
}

async fn validate(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ValidateQuery>,
) -> Result<Json<ValidateResponse>, ApiError> {
    blocking(state, move |store| api::handle_validate(store, query)).await
}

async fn create_project(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> Result<Json<CreateProjectResponse>, ApiError> {
    blocking(state, move |store| api::handle_create_project(store, request)).await
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<ProjectsResponse>, ApiError> {
    blocking(state, api::handle_list_projects).await
}

async fn not_found(method: Method, uri: OriginalUri) -> ApiError {
    ApiError::NotFound(format!("not found: {} {}", method, uri.0.path()))
}
