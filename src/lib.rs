//! Crypto Fixed Deposit API Library
//!
//! # Overview
//!
//! 암호화폐 고정 예치(Fixed Deposit) 데모 백엔드.
//! 지갑 연결, 예치 생성, 이자 조회, 만기/중도 출금을 mock 상태로 제공합니다.
//! 실제 블록체인 호출이나 영속 저장소는 없습니다.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          API                              │
//! │                                                           │
//! │  ┌─────────┐   ┌──────────────────────────┐   ┌────────┐  │
//! │  │ Routes  │──▶│ Services                 │──▶│   DB   │  │
//! │  └─────────┘   │  DepositService          │   │ (mock) │  │
//! │                │   └─ InterestEngine      │   └────────┘  │
//! │                │  WalletConnector         │               │
//! │                │  RateOracle              │               │
//! │                │  SessionService          │               │
//! │                └──────────────────────────┘               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 비즈니스 로직 (이자 계산, 예치 생명주기, 지갑, 환율, 세션)
//! - `db`: 메모리 예치 저장소
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crypto_fd_api::{config::Config, create_router, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let app = create_router(AppState::from_config(config));
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod db;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{ApiError, DepositError};
pub use db::{DepositRepository, DepositStore};
pub use services::{
    AddressGenerator, DepositService, InterestEngine, RandomAddressGenerator, RateOracle,
    RateSchedule, SessionService, WalletConnector,
};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub deposits: Arc<DepositService>,
    pub store: Arc<dyn DepositRepository>,
    pub wallets: Arc<WalletConnector>,
    pub rates: Arc<RateOracle>,
    pub sessions: Arc<SessionService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        Self::with_generator(config, Arc::new(RandomAddressGenerator::from_entropy()))
    }

    /// 지갑 주소 생성기 주입 (테스트에서는 seeded 생성기)
    pub fn with_generator(config: Config, generator: Arc<dyn AddressGenerator>) -> Self {
        let store: Arc<dyn DepositRepository> = Arc::new(
            DepositStore::new(config.latency)
                .with_sample_seeding(config.seed_sample_deposits)
                .with_failure_rate(config.simulated_failure_rate, None),
        );

        Self {
            deposits: Arc::new(DepositService::new(store.clone(), InterestEngine::default())),
            store,
            wallets: Arc::new(WalletConnector::new(generator, config.latency.wallet)),
            rates: Arc::new(RateOracle::new(config.rate_oracle_url.clone(), config.latency.rates)),
            sessions: Arc::new(SessionService::new()),
            config: Arc::new(config),
        }
    }
}

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health                        - 서버 상태 확인
///
/// POST /auth/signup                   - 가입 (mock)
/// POST /auth/login                    - 로그인 (mock)
/// POST /auth/logout                   - 로그아웃
/// GET  /auth/me                       - 현재 사용자
///
/// POST /wallet/connect                - 지갑 연결 (mock)
/// POST /wallet/disconnect             - 지갑 연결 해제
/// GET  /wallet                        - 연결된 지갑
///
/// GET  /rates/:symbol                 - 현지 통화 환율
///
/// GET  /deposits/terms                - 기간별 이자율
/// POST /deposits/preview              - 예상 이자 미리보기
/// GET  /deposits                      - 예치 목록
/// POST /deposits                      - 예치 생성
/// GET  /deposits/:id                  - 예치 상세
/// GET  /deposits/:id/quote            - 출금 미리보기
/// POST /deposits/:id/withdraw         - 만기 출금
/// POST /deposits/:id/withdraw-early   - 중도 해지
/// ```
pub fn create_router(state: AppState) -> Router {
    // CORS 설정
    // 프로덕션: ALLOWED_ORIGINS 도메인만 허용
    // 개발: localhost 허용
    let cors = if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"), // Next.js dev server
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))

        // Session
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))

        // Wallet
        .route("/wallet", get(routes::wallet::get_wallet))
        .route("/wallet/connect", post(routes::wallet::connect_wallet))
        .route("/wallet/disconnect", post(routes::wallet::disconnect_wallet))

        // Rates
        .route("/rates/:symbol", get(routes::rates::get_rate))

        // Deposits
        .route("/deposits/terms", get(routes::deposits::get_terms))
        .route("/deposits/preview", post(routes::deposits::preview_deposit))
        .route(
            "/deposits",
            get(routes::deposits::list_deposits).post(routes::deposits::create_deposit),
        )
        .route("/deposits/:id", get(routes::deposits::get_deposit))
        .route("/deposits/:id/quote", get(routes::deposits::quote_withdrawal))
        .route("/deposits/:id/withdraw", post(routes::deposits::withdraw))
        .route("/deposits/:id/withdraw-early", post(routes::deposits::withdraw_early))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}
