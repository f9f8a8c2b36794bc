use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{FormRejection, JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use histoury_data_management::DataManagerError;
use histoury_lib::{language::UnsupportedLanguage, trip::TripValidationError};
use serde_json::json;
use thiserror::Error;

use crate::services::ServiceError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("Upstream service failed: {0}")]
    Upstream(#[from] ServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("{self}");
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<DataManagerError> for AppError {
    fn from(err: DataManagerError) -> Self {
        match err {
            DataManagerError::NotFound(message) => AppError::NotFound(message),
            DataManagerError::Database(message) => AppError::Internal(format!("Database error: {message}")),
            DataManagerError::Media(message) => AppError::Internal(format!("Media error: {message}")),
        }
    }
}

impl From<TripValidationError> for AppError {
    fn from(err: TripValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<UnsupportedLanguage> for AppError {
    fn from(err: UnsupportedLanguage) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", err.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
