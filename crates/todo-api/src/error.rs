use crate::render::RenderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use infrastructure::StorageError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const GENERIC_ERROR: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値の検証エラー（400）
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// JSON ボディのデコード失敗（400）
    #[error("Invalid request body: {0}")]
    BodyParse(#[from] serde_json::Error),

    #[error("Todo not found")]
    NotFound,

    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        source: StorageError,
        expose_details: bool,
    },

    #[error("Failed to render page: {source}")]
    Render {
        source: RenderError,
        expose_details: bool,
    },
}

/// エラーレスポンスのボディ
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            request_id: None,
        }
    }

    /// サーバ側の失敗。詳細はリクエスト ID と共にログへ出力し、
    /// クライアントには `expose_details` のときだけ返す。
    fn internal(message: &str, source: &dyn std::error::Error, expose_details: bool) -> Self {
        let request_id = Uuid::new_v4().to_string();
        tracing::error!(request_id = %request_id, error = %source, "{message}");

        Self {
            message: message.to_string(),
            error: Some(if expose_details {
                source.to_string()
            } else {
                GENERIC_ERROR.to_string()
            }),
            request_id: Some(request_id),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BodyParse(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage { .. } | ApiError::Render { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(e) => ErrorBody::message(e.to_string()),
            ApiError::BodyParse(e) => ErrorBody {
                message: "Invalid request body".to_string(),
                error: Some(e.to_string()),
                request_id: None,
            },
            ApiError::NotFound => ErrorBody::message("Todo not found"),
            ApiError::Storage {
                message,
                source,
                expose_details,
            } => ErrorBody::internal(message, &source, expose_details),
            ApiError::Render {
                source,
                expose_details,
            } => ErrorBody::internal("Failed to render page", &source, expose_details),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_has_only_message() {
        let (status, json) = body_json(ApiError::from(DomainError::TitleRequired)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({"message": "The title field is required"}));
    }

    #[tokio::test]
    async fn test_body_parse_error_carries_decoder_detail() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let detail = parse_error.to_string();

        let (status, json) = body_json(ApiError::from(parse_error)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid request body");
        assert_eq!(json["error"], detail);
    }

    #[tokio::test]
    async fn test_storage_error_is_sanitized_by_default() {
        let error = ApiError::Storage {
            message: "Failed to save todo",
            source: StorageError::Driver("connection refused".to_string()),
            expose_details: false,
        };

        let (status, json) = body_json(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Failed to save todo");
        assert_eq!(json["error"], GENERIC_ERROR);
        assert!(Uuid::parse_str(json["request_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_storage_error_detail_when_exposed() {
        let error = ApiError::Storage {
            message: "Failed to delete todo",
            source: StorageError::Driver("connection refused".to_string()),
            expose_details: true,
        };

        let (_, json) = body_json(error).await;

        assert_eq!(json["error"], "connection refused");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(DomainError::InvalidTodoId("x".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Storage {
                message: "Failed to fetch todo",
                source: StorageError::Unavailable,
                expose_details: false,
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
