//! Wallet Endpoints
//!
//! Mock wallet connection for the signed-in user. The connected address is
//! what `POST /deposits` uses when the request body does not name one.

use axum::{extract::State, http::StatusCode, Json};

use crate::{error::ApiError, routes::auth::CurrentUser, services::Wallet, AppState};

/// GET /wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Wallet>, ApiError> {
    state
        .wallets
        .current(&user.id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Connected wallet".to_string()))
}

/// POST /wallet/connect
pub async fn connect_wallet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Wallet> {
    Json(state.wallets.connect(&user.id).await)
}

/// POST /wallet/disconnect
pub async fn disconnect_wallet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> StatusCode {
    state.wallets.disconnect(&user.id).await;
    StatusCode::NO_CONTENT
}
