use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::linkedin::ProviderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Every failed field check for one request, in the order they were found.
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }
}

/// Internal failure detail stashed on 500 responses.
/// Only rendered into the body by [`render_internal_details`].
#[derive(Debug, Clone)]
pub struct InternalDetail {
    pub message: String,
    pub stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;
        let mut internal: Option<InternalDetail> = None;

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(messages) => {
                details = Some(json!(messages));
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    messages.join("; "),
                )
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::Database(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Record not found".to_string(),
            ),
            AppError::Database(sqlx::Error::Database(db_err)) => {
                tracing::warn!("Database rejected request: {db_err}");
                let message = if db_err.is_unique_violation() {
                    "A record with these values already exists"
                } else if db_err.is_foreign_key_violation() {
                    "The request references a record that does not exist"
                } else {
                    "The database rejected the request"
                };
                (StatusCode::BAD_REQUEST, "DATABASE_ERROR", message.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                internal = Some(InternalDetail::from_error(&self));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Provider(ProviderError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "PROVIDER_UNAUTHORIZED",
                "LinkedIn authentication failed. Please re-authenticate with LinkedIn".to_string(),
            ),
            AppError::Provider(ProviderError::RateLimited) => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests to LinkedIn API".to_string(),
            ),
            AppError::Provider(e) => {
                tracing::error!("Provider error: {e}");
                internal = Some(InternalDetail::from_error(&self));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROVIDER_ERROR",
                    "The LinkedIn request failed".to_string(),
                )
            }
            AppError::NotImplemented(msg) => {
                (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                internal = Some(InternalDetail::from_error(&self));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Something went wrong".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": code,
            "message": message,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(internal) = internal {
            response.extensions_mut().insert(internal);
        }
        response
    }
}

impl InternalDetail {
    fn from_error(err: &AppError) -> Self {
        let stack = match err {
            AppError::Internal(e) => format!("{e:?}"),
            other => format!("{other:?}"),
        };
        InternalDetail {
            message: err.to_string(),
            stack,
        }
    }
}

/// Development-only middleware: rewrites 500 bodies to carry the underlying
/// error message and debug chain.
pub async fn render_internal_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(detail) = response.extensions().get::<InternalDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let body = json!({
        "error": "INTERNAL_ERROR",
        "message": "Something went wrong",
        "details": detail.message,
        "stack": detail.stack,
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_collects_messages() {
        let err = AppError::Validation(vec![
            "Company is required".to_string(),
            "Position is required".to_string(),
        ]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "Company is required; Position is required");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = AppError::Internal(anyhow::anyhow!("pool exploded")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<InternalDetail>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["message"], "Something went wrong");
        assert!(!body.to_string().contains("pool exploded"));
    }

    #[tokio::test]
    async fn test_development_middleware_renders_details() {
        use axum::{body::Body, middleware, routing::get, Router};
        use tower::ServiceExt;

        async fn failing() -> Result<(), AppError> {
            Err(AppError::Internal(anyhow::anyhow!("pool exploded")))
        }
        async fn missing() -> Result<(), AppError> {
            Err(AppError::NotFound("Job application not found".into()))
        }

        let app = Router::new()
            .route("/fail", get(failing))
            .route("/missing", get(missing))
            .layer(middleware::from_fn(render_internal_details));

        let request = axum::http::Request::builder().uri("/fail").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Something went wrong");
        assert!(body["details"].as_str().unwrap().contains("pool exploded"));
        assert!(body["stack"].is_string());

        let request = axum::http::Request::builder().uri("/missing").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body.get("stack").is_none());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Database(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (AppError::Database(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Provider(ProviderError::Unauthorized), StatusCode::UNAUTHORIZED),
            (AppError::Provider(ProviderError::RateLimited), StatusCode::TOO_MANY_REQUESTS),
            (AppError::NotImplemented("x".into()), StatusCode::NOT_IMPLEMENTED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
