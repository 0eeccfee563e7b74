//! Configuration Module
//!
//! All settings come from environment variables (optionally via `.env`).
//! `from_env()` validates every value up front so a bad setting stops the
//! server at startup instead of surfacing on the first request.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트 (기본값: 3001)
    pub port: u16,

    /// 환경 (development, staging, production)
    pub environment: Environment,

    /// mock 백엔드 지연 시간
    pub latency: LatencyProfile,

    /// 첫 목록 조회 시 샘플 예치 2건 생성 여부
    pub seed_sample_deposits: bool,

    /// 저장소 일시 장애 시뮬레이션 확률 (0.0 ~ 1.0)
    pub simulated_failure_rate: f64,

    /// 외부 환율 API (없으면 mock 환율 테이블)
    pub rate_oracle_url: Option<String>,

    /// 프로덕션 CORS 허용 도메인
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Simulated backend latency per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    pub list: Duration,
    pub create: Duration,
    pub withdraw: Duration,
    pub wallet: Duration,
    pub rates: Duration,
}

impl LatencyProfile {
    /// 대시보드 데모 기본값 (목록 800ms, 생성 1.5s, 출금 1.2s)
    pub fn realistic() -> Self {
        Self {
            list: Duration::from_millis(800),
            create: Duration::from_millis(1500),
            withdraw: Duration::from_millis(1200),
            wallet: Duration::from_millis(1000),
            rates: Duration::from_millis(500),
        }
    }

    /// 테스트용: 지연 없음
    pub fn none() -> Self {
        Self {
            list: Duration::ZERO,
            create: Duration::ZERO,
            withdraw: Duration::ZERO,
            wallet: Duration::ZERO,
            rates: Duration::ZERO,
        }
    }
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self::realistic()
    }
}

/// 지연 시뮬레이션 (0 이면 즉시 반환)
pub async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// # Optional Environment Variables
    ///
    /// - `PORT`: 서버 포트 (기본값: 3001)
    /// - `ENVIRONMENT`: development | staging | production
    /// - `SIMULATE_LATENCY`: true | false (기본값: true)
    /// - `SEED_SAMPLE_DEPOSITS`: true | false (기본값: true)
    /// - `SIMULATED_FAILURE_RATE`: 0.0 ~ 1.0 (기본값: 0.0)
    /// - `RATE_ORACLE_URL`: 외부 환율 API
    /// - `ALLOWED_ORIGINS`: 콤마 구분 (production 전용)
    pub fn from_env() -> Result<Self> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let latency = if parse_bool("SIMULATE_LATENCY", true)? {
            LatencyProfile::realistic()
        } else {
            LatencyProfile::none()
        };

        let simulated_failure_rate: f64 = env::var("SIMULATED_FAILURE_RATE")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("SIMULATED_FAILURE_RATE must be a number")?;
        if !(0.0..=1.0).contains(&simulated_failure_rate) {
            bail!("SIMULATED_FAILURE_RATE must be between 0 and 1, got {}", simulated_failure_rate);
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "https://yourdomain.com".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("PORT must be a valid number")?,

            environment,

            latency,

            seed_sample_deposits: parse_bool("SEED_SAMPLE_DEPOSITS", true)?,

            simulated_failure_rate,

            rate_oracle_url: env::var("RATE_ORACLE_URL").ok().filter(|url| !url.is_empty()),

            allowed_origins,
        })
    }

    /// 테스트/임베딩용 설정: 지연 없음, 샘플 없음, 장애 없음
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            environment: Environment::Development,
            latency: LatencyProfile::none(),
            seed_sample_deposits: false,
            simulated_failure_rate: 0.0,
            rate_oracle_url: None,
            allowed_origins: Vec::new(),
        }
    }

    /// 프로덕션 환경인지 확인
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_bool(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => bail!("{} must be a boolean, got {:?}", key, other),
        },
    }
}
