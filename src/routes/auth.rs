//! Session Endpoints
//!
//! Mock sign-in. Every other route identifies its caller through the
//! [`CurrentUser`] extractor (`Authorization: Bearer <token>`).

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    services::{Session, SessionError, User},
    AppState,
};

/// 로그인/가입 요청
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// 인증된 요청의 사용자
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        state
            .sessions
            .resolve(token)
            .await
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = state.sessions.signup(&req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.sessions.login(&req.email, &req.password).await?))
}

/// POST /auth/logout
///
/// 연결된 지갑도 함께 해제
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        if let Some(user) = state.sessions.resolve(token).await {
            state.wallets.disconnect(&user.id).await;
        }
        state.sessions.logout(token).await;
    }
    StatusCode::NO_CONTENT
}

/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
