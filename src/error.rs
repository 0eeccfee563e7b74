//! Error Types
//!
//! Two layers: [`DepositError`] is what the deposit service returns, and
//! [`ApiError`] is what handlers return. `ApiError` owns the mapping to HTTP
//! status codes and the JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;

/// 예치 도메인 에러
///
/// 서비스 레이어(`DepositService`)가 반환하는 에러.
/// 모두 로컬에서 복구 가능하며 자동 재시도는 하지 않음.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DepositError {
    /// 금액/기간/지갑 검증 실패
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 존재하지 않는 (또는 이미 출금된) 예치
    #[error("Deposit not found: {0}")]
    NotFound(String),

    /// 백엔드 일시 장애 (mock 에서는 설정된 확률로 발생)
    #[error("Temporarily unavailable: {0}")]
    Transient(String),
}

impl From<StoreError> for DepositError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(op) => DepositError::Transient(op),
            StoreError::Rejected(reason) => DepositError::Validation(reason),
        }
    }
}

/// HTTP 응답용 에러
///
/// 4xx 는 사용자가 고칠 수 있는 입력 문제, 5xx 는 재시도 대상.
/// 5xx 의 상세 원인은 로그에만 기록
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ============ 401 Unauthorized ============
    #[error("Authentication required")]
    Unauthorized,

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 503 Service Unavailable ============
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// 에러 응답 본문 (`details` 는 검증 실패 시에만)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // 4xx 클라이언트 에러
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", resource),
                None,
            ),

            // 5xx 서버 에러
            ApiError::ServiceUnavailable(service) => {
                // 상세 원인은 로그에만 남기고 클라이언트에는 일반 메시지
                tracing::warn!("Service unavailable: {}", service);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "The service is temporarily unavailable, please try again".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// 도메인 에러를 ApiError로 변환
impl From<DepositError> for ApiError {
    fn from(err: DepositError) -> Self {
        match err {
            DepositError::Validation(msg) => ApiError::ValidationError(msg),
            DepositError::NotFound(id) => ApiError::NotFound(format!("Deposit {}", id)),
            DepositError::Transient(op) => ApiError::ServiceUnavailable(op),
        }
    }
}
