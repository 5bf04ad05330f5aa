use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
    #[error("Export error: {0}")]
    Export(#[from] analytics::ExportError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("No registration data has been loaded")]
    NoData,
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Analytics(analytics_err) => {
                tracing::warn!(error = %analytics_err, "Rejected malformed registration data.");
                (StatusCode::BAD_REQUEST, analytics_err.to_string())
            }
            AppError::Export(export_err) => {
                tracing::error!(error = ?export_err, "Export error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to produce the CSV export".to_string(),
                )
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NoData => (
                StatusCode::NOT_FOUND,
                "No data found in the database. Load records first with `regdash import --file <csv>`."
                    .to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
