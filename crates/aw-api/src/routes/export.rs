//! Submission exports as file downloads.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

use super::submissions::with_storage;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Creates export routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/csv", get(export_csv))
        .route("/xlsx", get(export_xlsx))
}

fn attachment(content_type: &'static str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Downloads the submissions sheet as CSV.
#[utoipa::path(
    get,
    path = "/api/export/csv",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 500, description = "Spreadsheet unreadable", body = ErrorResponse)
    ),
    tag = "Submissions"
)]
pub async fn export_csv(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let csv = with_storage(&state.submissions, |store| store.export_csv()).await?;
    Ok(attachment("text/csv; charset=utf-8", "submissions.csv", csv))
}

/// Downloads the whole workbook.
#[utoipa::path(
    get,
    path = "/api/export/xlsx",
    responses(
        (status = 200, description = "Workbook attachment", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 500, description = "Spreadsheet unreadable", body = ErrorResponse)
    ),
    tag = "Submissions"
)]
pub async fn export_xlsx(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let bytes = with_storage(&state.submissions, |store| store.export_xlsx()).await?;
    Ok(attachment(XLSX_CONTENT_TYPE, "submissions.xlsx", bytes))
}
