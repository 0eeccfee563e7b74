//! Currency Rate Oracle
//!
//! Crypto → local currency (INR) multipliers used only for display: the
//! local value of a deposit never feeds into settlement math.
//!
//! # Implementation Options
//!
//! 1. Mock (기본값): 고정 환율 테이블
//! 2. External API: `RATE_ORACLE_URL` 설정 시 `GET {url}/{SYMBOL}` → `{"rate": number}`
//!
//! 두 경우 모두 심볼별로 60초 캐시

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::simulate_latency;

/// 표시 통화
pub const LOCAL_CURRENCY: &str = "INR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("unsupported asset: {0}")]
    Unsupported(String),

    #[error("rate source unavailable: {0}")]
    Unavailable(String),
}

/// 환율 데이터
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub symbol: String,
    pub currency: String,
    /// 1 단위당 현지 통화
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

struct CachedRate {
    quote: RateQuote,
    cached_at: Instant,
}

#[derive(Deserialize)]
struct RemoteRate {
    #[serde(with = "rust_decimal::serde::float")]
    rate: Decimal,
}

/// 환율 오라클 서비스
pub struct RateOracle {
    oracle_url: Option<String>,
    client: reqwest::Client,
    latency: Duration,
    /// 캐시된 환율 (빈번한 요청 최적화)
    cache: RwLock<HashMap<String, CachedRate>>,
}

impl RateOracle {
    /// 캐시 유효 시간 (초)
    const CACHE_TTL_SECS: u64 = 60;

    pub fn new(oracle_url: Option<String>, latency: Duration) -> Self {
        Self {
            oracle_url,
            client: reqwest::Client::new(),
            latency,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// mock 환율 (INR)
    pub fn mock_rate(symbol: &str) -> Option<Decimal> {
        match symbol {
            "ETH" => Some(Decimal::from(250_000)),
            "BTC" => Some(Decimal::from(5_000_000)),
            "USDT" => Some(Decimal::from(83)),
            _ => None,
        }
    }

    /// 심볼 환율 조회 (대소문자 무시)
    pub async fn get_rate(&self, symbol: &str) -> Result<RateQuote, RateError> {
        let symbol = symbol.trim().to_uppercase();

        // 캐시 확인
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&symbol) {
                if cached.cached_at.elapsed().as_secs() < Self::CACHE_TTL_SECS {
                    return Ok(cached.quote.clone());
                }
            }
        }

        // 새로 조회
        let quote = self.fetch_rate(&symbol).await?;

        // 캐시 업데이트
        self.cache.write().await.insert(
            symbol,
            CachedRate {
                quote: quote.clone(),
                cached_at: Instant::now(),
            },
        );

        Ok(quote)
    }

    async fn fetch_rate(&self, symbol: &str) -> Result<RateQuote, RateError> {
        let (rate, source) = match &self.oracle_url {
            Some(url) => (self.fetch_remote(url, symbol).await?, url.clone()),
            None => {
                simulate_latency(self.latency).await;
                let rate = Self::mock_rate(symbol).ok_or_else(|| RateError::Unsupported(symbol.to_string()))?;
                (rate, "mock".to_string())
            }
        };

        Ok(RateQuote {
            symbol: symbol.to_string(),
            currency: LOCAL_CURRENCY.to_string(),
            rate,
            source,
            updated_at: Utc::now(),
        })
    }

    async fn fetch_remote(&self, url: &str, symbol: &str) -> Result<Decimal, RateError> {
        let endpoint = format!("{}/{}", url.trim_end_matches('/'), symbol);
        tracing::debug!(%endpoint, "fetching rate");

        let resp = self
            .client
            .get(&endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RateError::Unsupported(symbol.to_string()));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        let body: RemoteRate = resp
            .json()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?;
        Ok(body.rate)
    }
}

/// 현지 통화 환산 (소수점 2자리)
///
/// 외부 환율은 범위를 보장하지 않으므로 overflow 는 `Unavailable`
pub fn to_local_value(amount: Decimal, rate: Decimal) -> Result<Decimal, RateError> {
    amount
        .checked_mul(rate)
        .map(|value| value.round_dp(2))
        .ok_or_else(|| RateError::Unavailable(format!("local value overflow at rate {}", rate)))
}
