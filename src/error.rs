use crate::models::FieldError;
use crate::notify::NotifyError;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    NotFound(String),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl AppError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {} not found", what, id))
    }

    pub fn invalid(location: &str, field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(
            &format!("{}.{}", location, field),
            message,
        )])
    }

    /// Validation errors raised while checking a JSON body.
    pub fn from_body(errors: Vec<FieldError>) -> Self {
        AppError::Validation(
            errors
                .into_iter()
                .map(|e| FieldError {
                    field: format!("body.{}", e.field),
                    ..e
                })
                .collect(),
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Notify(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Database(e) => {
                error!(category = "database", "Database error: {}", e);
                json!({ "detail": "internal server error" })
            }
            AppError::NotFound(message) => json!({ "detail": message }),
            AppError::Validation(errors) => {
                let detail: Vec<_> = errors
                    .iter()
                    .map(|e| {
                        json!({
                            "loc": e.field.split('.').collect::<Vec<_>>(),
                            "msg": e.message,
                        })
                    })
                    .collect();
                json!({ "detail": detail })
            }
            AppError::Notify(e) => {
                error!(category = "notify", "Notification failed: {}", e);
                json!({ "detail": e.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}
