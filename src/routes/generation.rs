use crate::dto::generation_dto::{CreateGenerationPayload, JobQuery};
use crate::{error::Result, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/generations",
    request_body = CreateGenerationPayload,
    responses(
        (status = 202, description = "Generation job started", body = Json<serde_json::Value>),
        (status = 400, description = "Invalid request payload"),
    ),
)]
pub async fn create_generation(
    State(state): State<AppState>,
    Json(payload): Json<CreateGenerationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let request = payload.into_request(state.max_target_count)?;
    let target = request.count;
    let id = state.job_service.enqueue(request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"job_id": id, "target": target})),
    ))
}

#[utoipa::path(
    get,
    path = "/api/generations/{id}",
    params(
        ("id" = Uuid, Path, description = "Generation job ID"),
        ("include_records" = Option<bool>, Query, description = "Embed accepted records once finished")
    ),
    responses(
        (status = 200, description = "Generation job status", body = Json<serde_json::Value>),
        (status = 404, description = "Job not found"),
    ),
)]
pub async fn get_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<JobQuery>,
) -> Result<impl IntoResponse> {
    let snapshot = state
        .job_service
        .snapshot(id, query.include_records.unwrap_or(false))?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/generations/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Generation job ID")
    ),
    responses(
        (status = 202, description = "Cancellation requested"),
        (status = 400, description = "Job already finished"),
        (status = 404, description = "Job not found"),
    ),
)]
pub async fn cancel_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.cancel(id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"job_id": id, "cancelling": true})),
    ))
}
