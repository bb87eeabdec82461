use crate::error::AppError;
use crate::models::{BodySchema, FieldError};
use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde_json::Value;

/// JSON body extractor whose failures use the same `detail` shape as every
/// other validation error.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: BodySchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;

        let object = value.as_object().ok_or_else(|| {
            AppError::Validation(vec![FieldError::new("body", "expected a JSON object")])
        })?;

        let errors = T::check(object);
        if !errors.is_empty() {
            return Err(AppError::from_body(errors));
        }

        serde_json::from_value(value)
            .map(ValidJson)
            .map_err(|e| AppError::Validation(vec![FieldError::new("body", e.to_string())]))
    }
}
