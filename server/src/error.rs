//! Error responses for API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use haraj_export::ExportError;
use haraj_scraper::PageReport;
use serde::Serialize;

/// JSON error body. Page outcomes are attached when a scrape ran but
/// produced nothing, so callers can tell empty pages from failed ones.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageReport>>,
    #[serde(rename = "discoveryError", skip_serializing_if = "Option::is_none")]
    pub discovery_error: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    /// A required query parameter is missing or blank
    MissingParameter(&'static str),
    /// The scrape finished without a single listing
    NoListings {
        pages: Vec<PageReport>,
        discovery_error: Option<String>,
    },
    /// Export of gathered listings failed
    Export(ExportError),
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        Self::Export(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingParameter(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message.to_string(),
                    pages: None,
                    discovery_error: None,
                },
            ),
            Self::NoListings {
                pages,
                discovery_error,
            } => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "no data found".to_string(),
                    pages: Some(pages),
                    discovery_error,
                },
            ),
            Self::Export(err) => {
                tracing::error!("export failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: format!("export failed: {err}"),
                        pages: None,
                        discovery_error: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
