//! HTTP handlers for the RepoInsight server.

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, post, web};
use log::{error, warn};
use repoinsight_core::{AnalysisResult, Analyzer, RepoRef};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::openapi::ApiDoc;
use crate::store::AnalysisStore;

#[derive(Clone)]
/// Shared application state for handlers.
pub struct AppState {
    /// Repository analyzer.
    pub analyzer: Analyzer,
    /// Latest-result store.
    pub store: Arc<dyn AnalysisStore>,
}

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

/// Health check payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the server is up.
    pub status: String,
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, message: String) -> HttpResponse {
    builder.json(ErrorResponse { message })
}

#[utoipa::path(
    post,
    path = "/repos/{owner}/{repo}/analysis",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name")
    ),
    responses(
        (status = 200, description = "Analysis result", body = AnalysisResult),
        (status = 502, description = "Upstream analysis failed", body = ErrorResponse),
        (status = 500, description = "Result could not be stored", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/repos/{owner}/{repo}/analysis")]
/// Analyze a repository and store the result.
pub async fn analyze_repository(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (owner, name) = path.into_inner();
    let repo = RepoRef::new(owner, name);
    let result = match state.analyzer.analyze(&repo).await {
        Ok(result) => result,
        Err(err) => {
            warn!("analysis of {repo} failed: {err}");
            return error_response(
                HttpResponse::BadGateway(),
                format!("analysis of {repo} failed: {err}"),
            );
        }
    };

    let store = state.store.clone();
    let stored = result.clone();
    match web::block(move || store.upsert(&stored)).await {
        Ok(Ok(())) => HttpResponse::Ok().json(result),
        Ok(Err(err)) => {
            error!("storing analysis of {repo} failed: {err}");
            error_response(
                HttpResponse::InternalServerError(),
                format!("storing analysis failed: {err}"),
            )
        }
        Err(err) => error_response(
            HttpResponse::InternalServerError(),
            format!("storing analysis failed: {err}"),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/repos/{owner}/{repo}/analysis",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name")
    ),
    responses(
        (status = 200, description = "Latest stored analysis", body = AnalysisResult),
        (status = 404, description = "No analysis stored", body = ErrorResponse),
        (status = 500, description = "Store lookup failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[get("/api/repos/{owner}/{repo}/analysis")]
/// Fetch the latest stored analysis of a repository.
pub async fn latest_analysis(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (owner, name) = path.into_inner();
    let repo = RepoRef::new(owner, name);
    let store = state.store.clone();
    let full_name = repo.full_name();
    match web::block(move || store.latest(&full_name)).await {
        Ok(Ok(Some(result))) => HttpResponse::Ok().json(result),
        Ok(Ok(None)) => error_response(
            HttpResponse::NotFound(),
            format!("no analysis stored for {repo}"),
        ),
        Ok(Err(err)) => {
            error!("loading analysis of {repo} failed: {err}");
            error_response(
                HttpResponse::InternalServerError(),
                format!("loading analysis failed: {err}"),
            )
        }
        Err(err) => error_response(
            HttpResponse::InternalServerError(),
            format!("loading analysis failed: {err}"),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "system"
)]
#[get("/api/health")]
/// Liveness probe.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
