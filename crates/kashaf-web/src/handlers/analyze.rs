use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use kashaf_core::{AnalysisError, DocumentBackend, InferenceBackend, ProgressEvent};

use crate::models::{AnalyzeResponse, ApiError, CategoryCount};
use crate::state::AppState;
use crate::upload;

pub async fn analyze(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match handle_analyze(state, multipart).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            tracing::warn!(kind = e.kind, status = %e.status, error = %e.message, "analysis failed");
            e.into_response()
        }
    }
}

async fn handle_analyze(
    state: Arc<AppState>,
    multipart: Multipart,
) -> Result<AnalyzeResponse, ApiError> {
    let fields = upload::parse_multipart(multipart)
        .await
        .map_err(ApiError::bad_request)?;

    let mut config = state.config.clone();
    if let Some(model) = fields.model {
        config.model = model;
    }
    if let Some(key) = fields.api_key {
        config.api_key = Some(key);
    }
    if config.credential().is_none() {
        return Err(ApiError::missing_api_key());
    }

    let filename = fields.document.filename;
    let data = fields.document.data;
    tracing::info!(filename = %filename, bytes = data.len(), model = %config.model, "analysis requested");

    // Document parsing is synchronous; keep it off the async workers.
    let reader = state.reader.clone();
    let text = tokio::task::spawn_blocking(move || reader.extract_text_from_bytes(&filename, &data))
        .await
        .map_err(|e| ApiError::internal(format!("document reader panicked: {}", e)))?
        .map_err(AnalysisError::from)?;

    let hosted;
    let backend: &dyn InferenceBackend = match &state.backend {
        Some(b) => b.as_ref(),
        None => {
            hosted = kashaf_core::analyze::openai_backend(&config).map_err(AnalysisError::from)?;
            &hosted
        }
    };

    let analysis = kashaf_core::analyze_text(&text, &config, backend, &state.client, |event| {
        if let ProgressEvent::Requesting { prompt_chars, .. } = event {
            tracing::debug!(prompt_chars, "sending request");
        }
    })
    .await?;

    let summary = analysis.summary();
    let categories = CategoryCount::from_summary(&summary);
    Ok(AnalyzeResponse {
        model: analysis.model,
        page_count: analysis.pages.len(),
        records: analysis.records,
        summary,
        categories,
    })
}
