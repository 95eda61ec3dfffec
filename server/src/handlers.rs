use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::{
    ExecutorAck, ExecutorNextResponse, JobResult, NotebookResponse, PostNotebookRequest,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/notebooks", post(post_notebook))
        .route(
            "/api/v1/notebooks/:job_id",
            get(get_notebook).delete(cancel_notebook),
        )
        .route("/api/v1/executor/next", post(executor_next))
        .route(
            "/api/v1/executor/jobs/:job_id/complete",
            post(executor_complete),
        )
        .route("/api/v1/executor/jobs/:job_id/defer", post(executor_defer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers para clientes ---------------- */

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct GetNotebookParams {
    /// Incluir el notebook fuente en la respuesta
    #[serde(default)]
    source: bool,
}

// Normaliza el envío, lo encola y responde 202 con la URL del job
async fn post_notebook(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PostNotebookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = req.normalize();
    let job = state.registry.enqueue(submission)?;

    info!(
        "job {} encolado (kernel={}, enable_retry={}, {} bytes)",
        job.id,
        job.submission.kernel_name,
        job.submission.enable_retry,
        job.submission.ipynb.len()
    );

    let self_url = state.config.job_url(&job.id);
    let resp = NotebookResponse::from_job(&job, None, false, &self_url)?;

    Ok((
        StatusCode::ACCEPTED,
        [(header::LOCATION, self_url)],
        Json(resp),
    ))
}

// Estado actual del job, con resultado si ya terminó
async fn get_notebook(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    ApiQuery(params): ApiQuery<GetNotebookParams>,
) -> Result<Json<NotebookResponse>, ApiError> {
    let record = state.registry.snapshot(&job_id)?;
    let self_url = state.config.job_url(&job_id);

    let resp = NotebookResponse::from_job(
        &record.metadata,
        record.result.as_ref(),
        params.source,
        &self_url,
    )?;
    Ok(Json(resp))
}

async fn cancel_notebook(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<NotebookResponse>, ApiError> {
    let job = state.registry.cancel(&job_id)?;
    info!("job {} cancelado", job_id);

    let resp = NotebookResponse::from_job(&job, None, false, &state.config.job_url(&job_id))?;
    Ok(Json(resp))
}

/* ---------------- handlers para el ejecutor ---------------- */

// Entrega el siguiente job pendiente (si hay)
async fn executor_next(
    State(state): State<AppState>,
) -> Result<Json<ExecutorNextResponse>, ApiError> {
    let job = state.registry.claim_next()?;

    match &job {
        Some(j) => info!(
            "entregando job {} al ejecutor (kernel={})",
            j.job_id, j.submission.kernel_name
        ),
        None => info!("el ejecutor pidió un job pero no hay pendientes"),
    }

    Ok(Json(ExecutorNextResponse { job }))
}

// El ejecutor reporta el resultado de un job
async fn executor_complete(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    ApiJson(result): ApiJson<JobResult>,
) -> Result<Json<ExecutorAck>, ApiError> {
    let job = state.registry.complete(&job_id, result)?;
    info!("job {} terminado con estado {}", job.id, job.status);
    Ok(Json(ExecutorAck { ok: true }))
}

async fn executor_defer(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ExecutorAck>, ApiError> {
    state.registry.defer(&job_id)?;
    info!("job {} diferido, vuelve a la cola", job_id);
    Ok(Json(ExecutorAck { ok: true }))
}
