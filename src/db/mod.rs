//! Deposit Store Module
//!
//! In-memory, per-user collection of fixed deposits that stands in for a real
//! backend. Every call awaits a simulated network delay before touching state,
//! and the mutation itself happens atomically under the write lock, so two
//! racing removals of the same id can never both succeed.
//!
//! The store is an explicit object owned by `AppState` (or a test fixture);
//! there is no process-global mock database.

mod models;
mod repository;

pub use models::*;
pub use repository::DepositRepository;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{simulate_latency, LatencyProfile};

/// 샘플 예치에 사용되는 지갑 주소
pub const SAMPLE_WALLET_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

/// 저장소 에러
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// 일시적 백엔드 장애 (상태 변경 없음)
    #[error("store unavailable during {0}")]
    Unavailable(String),

    /// 저장할 수 없는 레코드 (예: 만기일 범위 초과)
    #[error("record rejected: {0}")]
    Rejected(String),
}

#[derive(Default)]
struct StoreState {
    deposits: Vec<FixedDeposit>,
    seeded: bool,
}

/// 메모리 기반 예치 저장소
pub struct DepositStore {
    state: RwLock<StoreState>,
    latency: LatencyProfile,
    seed_samples: bool,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl DepositStore {
    pub fn new(latency: LatencyProfile) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            latency,
            seed_samples: true,
            failure_rate: 0.0,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 첫 조회 시 샘플 예치 생성 여부
    pub fn with_sample_seeding(mut self, enabled: bool) -> Self {
        self.seed_samples = enabled;
        self
    }

    /// 일시 장애 시뮬레이션 (확률은 0.0 ~ 1.0 으로 clamp)
    pub fn with_failure_rate(mut self, rate: f64, seed: Option<u64>) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        if let Some(seed) = seed {
            self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        }
        self
    }

    /// 상태를 바꾸기 전에 호출됨: 실패 시 아무것도 변경되지 않음
    fn check_available(&self, operation: &str) -> Result<(), StoreError> {
        if self.failure_rate <= 0.0 {
            return Ok(());
        }
        let roll: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen();
        if roll < self.failure_rate {
            tracing::warn!(operation, "simulated store failure");
            return Err(StoreError::Unavailable(operation.to_string()));
        }
        Ok(())
    }
}

/// Two illustrative deposits owned by `user_id`: one active, one already matured.
pub fn sample_deposits(user_id: &str, now: DateTime<Utc>) -> Vec<FixedDeposit> {
    vec![
        FixedDeposit {
            id: "fd_1".to_string(),
            user_id: user_id.to_string(),
            amount: Decimal::new(25, 1),
            duration: DepositTerm::ThreeMonths,
            interest_rate: Decimal::from(6),
            wallet_address: SAMPLE_WALLET_ADDRESS.to_string(),
            created_at: now - Duration::days(30),
            maturity_date: now + Duration::days(60),
            accrued_interest: Decimal::new(25, 3),
        },
        FixedDeposit {
            id: "fd_2".to_string(),
            user_id: user_id.to_string(),
            amount: Decimal::new(10, 1),
            duration: DepositTerm::OneMonth,
            interest_rate: Decimal::from(5),
            wallet_address: SAMPLE_WALLET_ADDRESS.to_string(),
            created_at: now - Duration::days(45),
            maturity_date: now - Duration::days(15),
            accrued_interest: Decimal::new(42, 4),
        },
    ]
}

#[async_trait]
impl DepositRepository for DepositStore {
    async fn list(&self, user_id: &str) -> Result<Vec<FixedDeposit>, StoreError> {
        simulate_latency(self.latency.list).await;
        self.check_available("list")?;

        let mut state = self.state.write().await;
        if self.seed_samples && !state.seeded {
            tracing::debug!(user_id, "seeding sample deposits");
            let samples = sample_deposits(user_id, Utc::now());
            state.deposits.extend(samples);
        }
        state.seeded = true;

        Ok(state
            .deposits
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<FixedDeposit>, StoreError> {
        simulate_latency(self.latency.list).await;
        self.check_available("get")?;

        let state = self.state.read().await;
        Ok(state.deposits.iter().find(|d| d.id == id).cloned())
    }

    async fn create(&self, deposit: NewDeposit, now: DateTime<Utc>) -> Result<FixedDeposit, StoreError> {
        simulate_latency(self.latency.create).await;
        self.check_available("create")?;

        let maturity_date = deposit
            .duration
            .maturity_from(now)
            .ok_or_else(|| StoreError::Rejected("maturity date out of range".to_string()))?;

        let record = FixedDeposit {
            id: format!("fd_{}", Uuid::new_v4().simple()),
            user_id: deposit.user_id,
            amount: deposit.amount,
            duration: deposit.duration,
            interest_rate: deposit.interest_rate,
            wallet_address: deposit.wallet_address,
            created_at: now,
            maturity_date,
            accrued_interest: Decimal::ZERO,
        };

        self.state.write().await.deposits.push(record.clone());
        Ok(record)
    }

    async fn remove(&self, id: &str) -> Result<Option<FixedDeposit>, StoreError> {
        simulate_latency(self.latency.withdraw).await;
        self.check_available("remove")?;

        let mut state = self.state.write().await;
        let removed = state
            .deposits
            .iter()
            .position(|d| d.id == id)
            .map(|index| state.deposits.remove(index));
        Ok(removed)
    }

    async fn health_check(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.deposits.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DepositStore {
        DepositStore::new(LatencyProfile::none())
    }

    fn new_deposit(user_id: &str, amount: Decimal, duration: DepositTerm) -> NewDeposit {
        NewDeposit {
            user_id: user_id.to_string(),
            amount,
            duration,
            interest_rate: Decimal::from(6),
            wallet_address: "0xabc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeds_samples_once() {
        let store = store();

        let first = store.list("user_a").await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "fd_1");
        assert_eq!(first[1].id, "fd_2");

        let now = Utc::now();
        assert!(!first[0].is_matured_at(now));
        assert!(first[1].is_matured_at(now));

        // 다른 사용자에게는 샘플이 다시 생기지 않음
        assert!(store.list("user_b").await.unwrap().is_empty());

        // 전부 삭제해도 재시딩 없음
        store.remove("fd_1").await.unwrap();
        store.remove("fd_2").await.unwrap();
        assert!(store.list("user_a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seeding_disabled() {
        let store = store().with_sample_seeding(false);
        assert!(store.list("user_a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_ordered() {
        let store = store().with_sample_seeding(false);
        let now = Utc::now();

        let a1 = store.create(new_deposit("alice", Decimal::ONE, DepositTerm::ThreeMonths), now).await.unwrap();
        store.create(new_deposit("bob", Decimal::TWO, DepositTerm::ThreeMonths), now).await.unwrap();
        let a2 = store.create(new_deposit("alice", Decimal::TEN, DepositTerm::ThreeMonths), now).await.unwrap();

        let alice = store.list("alice").await.unwrap();
        assert_eq!(alice.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec![a1.id.as_str(), a2.id.as_str()]);
        assert!(alice.iter().all(|d| d.user_id == "alice"));
    }

    #[tokio::test]
    async fn test_create_sets_dates_and_zero_accrual() {
        let store = store();
        let now = Utc::now();

        let deposit = store
            .create(new_deposit("alice", Decimal::TWO, DepositTerm::ThreeMonths), now)
            .await
            .unwrap();

        assert!(deposit.id.starts_with("fd_"));
        assert_eq!(deposit.created_at, now);
        assert_eq!(deposit.maturity_date, DepositTerm::ThreeMonths.maturity_from(now).unwrap());
        assert!(deposit.maturity_date > deposit.created_at);
        assert_eq!(deposit.accrued_interest, Decimal::ZERO);
        assert_eq!(store.get(&deposit.id).await.unwrap(), Some(deposit));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = store().with_sample_seeding(false);
        let deposit = store
            .create(new_deposit("alice", Decimal::ONE, DepositTerm::OneMonth), Utc::now())
            .await
            .unwrap();

        assert_eq!(store.remove(&deposit.id).await.unwrap().map(|d| d.id), Some(deposit.id.clone()));
        assert_eq!(store.remove(&deposit.id).await.unwrap(), None);
        assert_eq!(store.remove("fd_missing").await.unwrap(), None);
        assert_eq!(store.health_check().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_leaves_state_untouched() {
        let store = store().with_sample_seeding(false).with_failure_rate(1.0, Some(7));

        let result = store
            .create(new_deposit("alice", Decimal::ONE, DepositTerm::OneMonth), Utc::now())
            .await;
        assert_eq!(result, Err(StoreError::Unavailable("create".to_string())));
        assert_eq!(store.health_check().await.unwrap(), 0);
    }
}
