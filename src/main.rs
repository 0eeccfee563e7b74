//! Crypto Fixed Deposit API Server
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Client (Dashboard Frontend)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum Web Server                         │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                      Routes Layer                        ││
//! │  │  /health  /auth/*  /wallet/*  /rates/*  /deposits/*     ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Services Layer                        ││
//! │  │  DepositService  InterestEngine  WalletConnector        ││
//! │  │  RateOracle      SessionService                         ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Data Layer                            ││
//! │  │  DepositStore (in-memory, simulated latency)            ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_fd_api::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=crypto_fd_api=info,tower_http=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "crypto_fd_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Crypto Fixed Deposit API Server");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        seed_samples = config.seed_sample_deposits,
        failure_rate = config.simulated_failure_rate,
        "📋 Configuration loaded"
    );

    if config.rate_oracle_url.is_none() {
        tracing::info!("💱 RATE_ORACLE_URL not set, using mock rates");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // 앱 상태 + 라우터 구성
    let app = create_router(AppState::from_config(config));

    // 서버 시작
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
