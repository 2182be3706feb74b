use crate::services::catalog_service::CatalogService;
use axum::{response::IntoResponse, Json};

/// Subjects, topics and reference PDFs available for filtering.
pub async fn get_catalog() -> impl IntoResponse {
    Json(CatalogService::view())
}
