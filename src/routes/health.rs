//! Health Check Endpoint
//!
//! Reports process liveness plus a probe of the deposit store. The store is
//! in-memory today, but the probe keeps the response shape stable for when a
//! real backend replaces it.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreStatus,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct StoreStatus {
    pub available: bool,
    pub deposits: Option<usize>,
    pub latency_ms: Option<u64>,
}

/// GET /health
///
/// 서버 및 저장소 상태 확인
pub async fn health_check(
    State(state): State<AppState>,
) -> Json<HealthResponse> {
    let probe_start = std::time::Instant::now();
    let store = match state.store.health_check().await {
        Ok(count) => StoreStatus {
            available: true,
            deposits: Some(count),
            latency_ms: Some(probe_start.elapsed().as_millis() as u64),
        },
        Err(_) => StoreStatus {
            available: false,
            deposits: None,
            latency_ms: None,
        },
    };

    Json(HealthResponse {
        status: if store.available { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
