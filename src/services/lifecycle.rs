//! Deposit Lifecycle Service
//!
//! Orchestrates the life of a fixed deposit:
//!
//! ```text
//!   create ──▶ active ──(clock passes maturity)──▶ matured
//!                 │                                   │
//!                 └── withdraw_early ──┐   withdraw ──┘
//!                                      ▼
//!                                  withdrawn (removed from the store)
//! ```
//!
//! `active`/`matured` are never stored; they are derived from `now` at read
//! time. Both withdrawal entry points go through a single `settle` step that
//! picks on-time or early settlement from the clock, so the amount paid can
//! never disagree with the deposit's actual state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{DepositRepository, DepositStatus, DepositTerm, FixedDeposit, NewDeposit};
use crate::error::DepositError;
use crate::services::interest::{time_remaining, InterestEngine};
use crate::services::rate_oracle::{to_local_value, RateError};

/// 최소 예치 금액 (0.04)
///
/// 표준 스케줄의 가장 좁은 이자율 차이(1개월, 5% - 2%)에서도
/// 페널티가 정산 단위 0.0001 이상: `0.04 * 3 / 1200 = 0.0001`
pub fn min_deposit_amount() -> Decimal {
    Decimal::new(4, 2)
}

/// 최대 예치 금액 (이자 계산 overflow 방지)
pub fn max_deposit_amount() -> Decimal {
    Decimal::from(1_000_000_000u64)
}

/// 금액 소수점 최대 자리수
pub const MAX_AMOUNT_DP: u32 = 8;

/// 목록/상세 조회 응답: 저장된 레코드 + 조회 시점 파생 값
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositView {
    #[serde(flatten)]
    pub deposit: FixedDeposit,
    pub status: DepositStatus,
    pub time_remaining: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub maturity_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub early_withdrawal_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub penalty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub accrued_interest_to_date: Decimal,
    /// 만기 수령액의 현지 통화 환산 (환율 요청 시)
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub local_value: Option<Decimal>,
}

impl DepositView {
    pub fn with_local_rate(mut self, rate: Decimal) -> Result<Self, RateError> {
        self.local_value = Some(to_local_value(self.maturity_amount, rate)?);
        Ok(self)
    }
}

/// 출금 미리보기 (상태 변경 없음)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalQuote {
    pub deposit_id: String,
    pub status: DepositStatus,
    pub early: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub settlement_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub maturity_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub penalty: Decimal,
}

/// 출금 영수증
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub deposit_id: String,
    pub status: DepositStatus,
    pub early: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub principal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub settlement_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub penalty: Decimal,
    pub settled_at: DateTime<Utc>,
}

/// 호출자가 요청한 출금 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WithdrawalRequest {
    OnTime,
    Early,
}

/// 예치 생명주기 서비스
pub struct DepositService {
    repo: Arc<dyn DepositRepository>,
    engine: InterestEngine,
}

impl DepositService {
    pub fn new(repo: Arc<dyn DepositRepository>, engine: InterestEngine) -> Self {
        Self { repo, engine }
    }

    pub fn engine(&self) -> &InterestEngine {
        &self.engine
    }

    pub async fn list_deposits(&self, user_id: &str) -> Result<Vec<DepositView>, DepositError> {
        self.list_deposits_at(user_id, Utc::now()).await
    }

    pub async fn list_deposits_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<DepositView>, DepositError> {
        let deposits = self.repo.list(user_id).await?;
        Ok(deposits.into_iter().map(|d| self.view(d, now)).collect())
    }

    pub async fn get_deposit_at(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<DepositView, DepositError> {
        let deposit = self.owned_deposit(user_id, id).await?;
        Ok(self.view(deposit, now))
    }

    fn view(&self, deposit: FixedDeposit, now: DateTime<Utc>) -> DepositView {
        DepositView {
            status: DepositStatus::of(&deposit, now),
            time_remaining: time_remaining(now, deposit.maturity_date).to_string(),
            maturity_amount: self.engine.maturity_amount(&deposit),
            early_withdrawal_amount: self.engine.early_withdrawal_amount(&deposit),
            penalty: self.engine.penalty(&deposit),
            accrued_interest_to_date: self.engine.accrued_interest(&deposit, now),
            local_value: None,
            deposit,
        }
    }

    pub async fn create_deposit(
        &self,
        user_id: &str,
        amount: Option<Decimal>,
        duration: Option<u32>,
        wallet_address: Option<&str>,
    ) -> Result<FixedDeposit, DepositError> {
        self.create_deposit_at(user_id, amount, duration, wallet_address, Utc::now())
            .await
    }

    /// 예치 생성
    ///
    /// 검증 순서: 지갑 연결 → 금액 → 기간
    pub async fn create_deposit_at(
        &self,
        user_id: &str,
        amount: Option<Decimal>,
        duration: Option<u32>,
        wallet_address: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FixedDeposit, DepositError> {
        let wallet_address = require_wallet(wallet_address)?;
        let amount = validate_amount(amount)?;
        let duration = validate_duration(duration)?;

        // 중도 해지 페널티가 0 으로 반올림되는 금액은 받지 않음
        if self.engine.projected_penalty(amount, duration) <= Decimal::ZERO {
            return Err(DepositError::Validation(format!(
                "Amount {} is too small for a {} deposit",
                amount, duration
            )));
        }

        let new = NewDeposit {
            user_id: user_id.to_string(),
            amount,
            duration,
            interest_rate: self.engine.schedule().rate_for(duration),
            wallet_address: wallet_address.to_string(),
        };

        let deposit = self.repo.create(new, now).await?;
        tracing::info!(
            user_id,
            deposit_id = %deposit.id,
            amount = %deposit.amount,
            months = deposit.duration.months(),
            rate = %deposit.interest_rate,
            "fixed deposit created"
        );
        Ok(deposit)
    }

    pub async fn quote_withdrawal_at(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalQuote, DepositError> {
        let deposit = self.owned_deposit(user_id, id).await?;
        Ok(self.quote(&deposit, now))
    }

    pub async fn withdraw(&self, user_id: &str, id: &str) -> Result<Settlement, DepositError> {
        self.withdraw_at(user_id, id, Utc::now()).await
    }

    /// 만기 출금. 만기 전이면 거부 (중도 해지는 `withdraw_early` 로 명시적으로)
    pub async fn withdraw_at(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Settlement, DepositError> {
        self.settle(user_id, id, WithdrawalRequest::OnTime, now).await
    }

    pub async fn withdraw_early(&self, user_id: &str, id: &str) -> Result<Settlement, DepositError> {
        self.withdraw_early_at(user_id, id, Utc::now()).await
    }

    /// 중도 해지. 이미 만기된 예치면 페널티 없이 만기 금액으로 정산
    pub async fn withdraw_early_at(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Settlement, DepositError> {
        self.settle(user_id, id, WithdrawalRequest::Early, now).await
    }

    /// 유일한 정산 결정 지점
    async fn settle(
        &self,
        user_id: &str,
        id: &str,
        request: WithdrawalRequest,
        now: DateTime<Utc>,
    ) -> Result<Settlement, DepositError> {
        let deposit = self.owned_deposit(user_id, id).await?;
        let quote = self.quote(&deposit, now);

        if request == WithdrawalRequest::OnTime && quote.early {
            tracing::warn!(user_id, deposit_id = id, "withdrawal rejected: deposit not matured");
            return Err(DepositError::Validation(format!(
                "Deposit {} matures on {}; use early withdrawal to withdraw now with reduced interest",
                id,
                deposit.maturity_date.format("%Y-%m-%d")
            )));
        }

        // 삭제 결과가 최종 판정: 동시 요청 중 두 번째는 NotFound
        if self.repo.remove(id).await?.is_none() {
            tracing::warn!(user_id, deposit_id = id, "withdrawal lost race: deposit already removed");
            return Err(DepositError::NotFound(id.to_string()));
        }

        tracing::info!(
            user_id,
            deposit_id = id,
            early = quote.early,
            settlement = %quote.settlement_amount,
            penalty = %quote.penalty,
            "fixed deposit withdrawn"
        );

        Ok(Settlement {
            deposit_id: deposit.id,
            status: DepositStatus::Withdrawn,
            early: quote.early,
            principal: deposit.amount,
            settlement_amount: quote.settlement_amount,
            penalty: quote.penalty,
            settled_at: now,
        })
    }

    fn quote(&self, deposit: &FixedDeposit, now: DateTime<Utc>) -> WithdrawalQuote {
        let status = DepositStatus::of(deposit, now);
        let maturity_amount = self.engine.maturity_amount(deposit);
        let early = status == DepositStatus::Active;

        let (settlement_amount, penalty) = if early {
            (self.engine.early_withdrawal_amount(deposit), self.engine.penalty(deposit))
        } else {
            (maturity_amount, Decimal::ZERO)
        };

        WithdrawalQuote {
            deposit_id: deposit.id.clone(),
            status,
            early,
            settlement_amount,
            maturity_amount,
            penalty,
        }
    }

    /// 다른 사용자의 예치는 존재 여부를 노출하지 않고 NotFound
    async fn owned_deposit(&self, user_id: &str, id: &str) -> Result<FixedDeposit, DepositError> {
        match self.repo.get(id).await? {
            Some(deposit) if deposit.user_id == user_id => Ok(deposit),
            _ => Err(DepositError::NotFound(id.to_string())),
        }
    }
}

/// 지갑 주소 검증: 필수, 공백 불가
pub fn require_wallet(wallet_address: Option<&str>) -> Result<&str, DepositError> {
    wallet_address
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .ok_or_else(|| {
            DepositError::Validation("Wallet not connected: connect a wallet to create a fixed deposit".to_string())
        })
}

/// 금액 검증: 필수, 0.04 이상, 소수점 8자리 이하
pub fn validate_amount(amount: Option<Decimal>) -> Result<Decimal, DepositError> {
    let amount = amount
        .ok_or_else(|| DepositError::Validation("Amount is required".to_string()))?
        .normalize();

    if amount <= Decimal::ZERO {
        return Err(DepositError::Validation("Amount must be greater than zero".to_string()));
    }
    if amount < min_deposit_amount() {
        return Err(DepositError::Validation(format!(
            "Amount must be at least {}",
            min_deposit_amount()
        )));
    }
    if amount > max_deposit_amount() {
        return Err(DepositError::Validation(format!(
            "Amount must not exceed {}",
            max_deposit_amount()
        )));
    }
    if amount.scale() > MAX_AMOUNT_DP {
        return Err(DepositError::Validation(format!(
            "Amount supports at most {} decimal places",
            MAX_AMOUNT_DP
        )));
    }
    Ok(amount)
}

pub fn validate_duration(duration: Option<u32>) -> Result<DepositTerm, DepositError> {
    let months = duration.ok_or_else(|| DepositError::Validation("Duration is required".to_string()))?;
    DepositTerm::try_from(months).map_err(DepositError::Validation)
}
