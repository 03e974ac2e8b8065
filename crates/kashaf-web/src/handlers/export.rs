use axum::Json;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use kashaf_reporting::ExportFormat;

use crate::models::{ApiError, ExportRequest};

/// Render posted records as a downloadable file (XLSX unless another format
/// is requested).
pub async fn export(Json(req): Json<ExportRequest>) -> Response {
    match handle_export(req) {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

fn handle_export(req: ExportRequest) -> Result<Response, ApiError> {
    let format = match req.format.as_deref() {
        Some(f) => f.parse::<ExportFormat>().map_err(ApiError::bad_request)?,
        None => ExportFormat::Xlsx,
    };

    let body = kashaf_reporting::render(&req.records, format)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let filename = match format {
        ExportFormat::Xlsx => kashaf_reporting::DEFAULT_FILENAME.to_string(),
        other => format!("kashafaat.{}", other.extension()),
    };
    tracing::info!(records = req.records.len(), format = format.label(), "export");

    Ok((
        [
            (header::CONTENT_TYPE, format.mime().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
