//! Repository Pattern Implementation
//!
//! The lifecycle service only talks to deposits through this trait, so a real
//! backend can replace the in-memory store without touching business logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{FixedDeposit, NewDeposit};
use super::StoreError;

/// Deposit Repository 인터페이스
#[async_trait]
pub trait DepositRepository: Send + Sync {
    /// 사용자 예치 목록 (삽입 순서)
    async fn list(&self, user_id: &str) -> Result<Vec<FixedDeposit>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<FixedDeposit>, StoreError>;

    /// `created_at = now`, `maturity_date = now + duration` 으로 생성 후 추가
    async fn create(&self, deposit: NewDeposit, now: DateTime<Utc>) -> Result<FixedDeposit, StoreError>;

    /// 멱등 삭제: 없는 id 는 `Ok(None)`
    async fn remove(&self, id: &str) -> Result<Option<FixedDeposit>, StoreError>;

    /// Health check (저장된 예치 개수)
    async fn health_check(&self) -> Result<usize, StoreError>;
}
