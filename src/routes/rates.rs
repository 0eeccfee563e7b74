//! Currency Rate Endpoints
//!
//! Display-only conversion rates. The backend's deposit math never reads
//! them; the dashboard multiplies crypto amounts by `rate` for the local
//! currency column.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::ApiError,
    services::{RateError, RateQuote},
    AppState,
};

impl From<RateError> for ApiError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Unsupported(symbol) => ApiError::NotFound(format!("Rate for {}", symbol)),
            RateError::Unavailable(reason) => {
                tracing::warn!(%reason, "rate oracle unavailable");
                ApiError::ServiceUnavailable("Rate Oracle".to_string())
            }
        }
    }
}

/// GET /rates/:symbol
///
/// 암호화폐 → INR 환율 조회 (예: `/rates/eth`)
pub async fn get_rate(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<RateQuote>, ApiError> {
    Ok(Json(state.rates.get_rate(&symbol).await?))
}
