use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tasklist_shared::{ApiResponse, FieldError};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Invalid request body")]
    MalformedRequest,
    #[error("Task not found")]
    NotFound,
    #[error("Route not found")]
    RouteNotFound,
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Maps a store failure onto the HTTP taxonomy. Storage faults are logged
    /// here and replaced by `context`, so no internal detail leaves the server.
    pub fn from_store(err: StoreError, context: &'static str) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Validation(message) => {
                ApiError::Validation(vec![FieldError::new("text", message)])
            }
            StoreError::Database(err) => {
                log::error!("{context}: {err}");
                ApiError::Internal(context)
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => {
                ApiResponse::<()>::invalid(self.to_string(), errors.clone())
            }
            _ => ApiResponse::<()>::failure(self.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn not_found_is_a_404_envelope() {
        let (status, body) = body_json(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Task not found");
    }

    #[actix_web::test]
    async fn validation_lists_field_errors() {
        let (status, body) = body_json(ApiError::Validation(vec![FieldError::new(
            "text",
            "Task text is required",
        )]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "text");
        assert_eq!(body["message"], "Validation failed");
    }

    #[actix_web::test]
    async fn database_faults_do_not_leak_details() {
        let err = ApiError::from_store(
            StoreError::Database(sqlx::Error::PoolClosed),
            "Failed to fetch tasks",
        );
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to fetch tasks");
    }

    #[actix_web::test]
    async fn malformed_body_message_is_fixed() {
        let (status, body) = body_json(ApiError::MalformedRequest).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "message": "Invalid request body" })
        );
    }

    #[test]
    fn store_not_found_maps_to_not_found() {
        assert!(matches!(
            ApiError::from_store(StoreError::NotFound(9), "Failed to delete task"),
            ApiError::NotFound
        ));
    }
}
