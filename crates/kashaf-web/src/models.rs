use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use kashaf_core::{
    AnalysisError, Category, CategorySummary, DocumentError, IndexRecord, InferenceError,
};

// ── Analyze ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub model: String,
    pub page_count: usize,
    pub records: Vec<IndexRecord>,
    pub summary: CategorySummary,
    /// Nonzero taxonomy counts under their Arabic labels, in taxonomy order.
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub label: &'static str,
    pub count: usize,
}

impl CategoryCount {
    pub fn from_summary(summary: &CategorySummary) -> Vec<CategoryCount> {
        Category::ALL
            .iter()
            .map(|&c| CategoryCount {
                label: c.label(),
                count: summary.count(c),
            })
            .filter(|c| c.count > 0)
            .collect()
    }
}

// ── Export ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub records: Vec<IndexRecord>,
    /// `xlsx` (default), `csv`, `json` or `markdown`.
    #[serde(default)]
    pub format: Option<String>,
}

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

/// A JSON error response tagged with the failing stage.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }

    pub fn missing_api_key() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "missing_api_key",
            message: "An API key is required".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        let status = match &e {
            AnalysisError::DocumentRead(DocumentError::Unsupported(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AnalysisError::DocumentRead(_) | AnalysisError::PageMarker(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AnalysisError::ExternalService(InferenceError::MissingApiKey) => {
                return ApiError::missing_api_key();
            }
            AnalysisError::ExternalService(InferenceError::Unauthorized { .. }) => {
                StatusCode::UNAUTHORIZED
            }
            AnalysisError::ExternalService(InferenceError::RateLimited { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AnalysisError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                kind: self.kind,
            }),
        )
            .into_response()
    }
}
