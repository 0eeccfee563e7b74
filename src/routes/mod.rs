//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/auth/*` - mock 로그인 세션
//! - `/wallet/*` - mock 지갑 연결
//! - `/rates/*` - 현지 통화 환율
//! - `/deposits/*` - 고정 예치 생성/조회/출금

pub mod health;
pub mod auth;
pub mod wallet;
pub mod rates;
pub mod deposits;
