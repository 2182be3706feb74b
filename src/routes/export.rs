use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use crate::dto::generation_dto::ExportQuery;
use crate::error::Error;
use crate::models::record::LanguageFilter;
use crate::services::export_service::ExportService;
use crate::{error::Result, AppState};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Export the accepted questions of a finished job as CSV or XLSX
pub async fn export_generation(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let report = state.job_service.report(id)?;
    if report.records.is_empty() {
        return Err(Error::NotFound("No questions were generated for this job".into()));
    }

    let language = match query.language.as_deref() {
        Some(raw) => raw.parse::<LanguageFilter>().map_err(Error::BadRequest)?,
        None => state.job_service.snapshot(id, false)?.language,
    };
    let stamp = crate::utils::time::file_stamp(crate::utils::time::now());

    let (content_type, filename, body) = match query.format.as_deref().unwrap_or("csv") {
        "csv" => (
            "text/csv; charset=utf-8",
            format!("questions_{}_{}.csv", language.as_str(), stamp),
            ExportService::to_csv(&report.records, language).into_bytes(),
        ),
        "xlsx" => (
            XLSX_MIME,
            format!("questions_{}_{}.xlsx", language.as_str(), stamp),
            ExportService::to_xlsx(&report.records, language)?,
        ),
        other => {
            return Err(Error::BadRequest(format!("Unsupported export format '{}'", other)));
        }
    };
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
