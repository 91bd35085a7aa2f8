//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::export::ExportError;
use crate::reporting::ReportError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key is disabled")]
    ApiKeyDisabled,

    #[error("User is inactive")]
    UserInactive,

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str, Option<String>) {
    if err.is_access_denied() {
        return (StatusCode::FORBIDDEN, "forbidden", Some(err.to_string()));
    }

    // A stored value outside the known vocabulary is a data problem on our side.
    tracing::error!("Domain error: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "invalid_stored_value", None)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 401 Unauthorized
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key", None),
            AppError::ApiKeyDisabled => (StatusCode::UNAUTHORIZED, "api_key_disabled", None),
            AppError::UserInactive => (StatusCode::UNAUTHORIZED, "user_inactive", None),

            // 404 Not Found
            AppError::NotFound { id, .. } => (StatusCode::NOT_FOUND, "not_found", Some(id.clone())),

            AppError::Domain(domain_err) => domain_status(domain_err),

            AppError::Report(report_err) => match report_err {
                ReportError::UnknownDimension(name) => {
                    (StatusCode::NOT_FOUND, "report_not_found", Some(name.clone()))
                }
                ReportError::InvalidWindow { .. } => (
                    StatusCode::BAD_REQUEST,
                    "invalid_time_window",
                    Some(report_err.to_string()),
                ),
                ReportError::Domain(domain_err) => domain_status(domain_err),
                ReportError::Database(e) => {
                    tracing::error!("Database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },

            AppError::Export(export_err) => match export_err {
                // 503: environment/configuration, not the caller's data
                ExportError::CapabilityUnavailable(format) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "export_unavailable",
                    Some(format.to_string()),
                ),
                ExportError::UnsupportedFormat(format) => (
                    StatusCode::BAD_REQUEST,
                    "unsupported_format",
                    Some(format.clone()),
                ),
                ExportError::Spreadsheet(_)
                | ExportError::Document(_)
                | ExportError::TooLarge(_) => {
                    tracing::error!("Export error: {}", export_err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "export_failed", None)
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use http_body_util::BodyExt;

    async fn error_code(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["error_code"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_access_denied_is_forbidden() {
        let response = AppError::from(DomainError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_capability_unavailable_is_distinct_from_data_errors() {
        let response =
            AppError::from(ExportError::CapabilityUnavailable(ExportFormat::Document)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = AppError::from(ExportError::Document("broken".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_key_failures_are_unauthorized_with_distinct_codes() {
        for (err, code) in [
            (AppError::InvalidApiKey, "invalid_api_key"),
            (AppError::ApiKeyDisabled, "api_key_disabled"),
            (AppError::UserInactive, "user_inactive"),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(error_code(response).await, code);
        }
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Officer", 42);
        assert_eq!(err.to_string(), "Officer not found: 42");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unknown_report_is_not_found() {
        let response =
            AppError::from(ReportError::UnknownDimension("weekly".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
