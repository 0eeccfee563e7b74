//! Deposit Models
//!
//! Records held by the deposit store. Status is never stored here;
//! it is derived from the clock when a deposit is read.

use std::fmt;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 예치 기간 (개월)
///
/// 허용되는 값은 1, 3, 6, 12, 24 뿐이며 JSON 에서는 숫자로 표현됨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DepositTerm {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
    TwentyFourMonths,
}

impl DepositTerm {
    pub const ALL: [DepositTerm; 5] = [
        DepositTerm::OneMonth,
        DepositTerm::ThreeMonths,
        DepositTerm::SixMonths,
        DepositTerm::TwelveMonths,
        DepositTerm::TwentyFourMonths,
    ];

    pub fn months(self) -> u32 {
        match self {
            DepositTerm::OneMonth => 1,
            DepositTerm::ThreeMonths => 3,
            DepositTerm::SixMonths => 6,
            DepositTerm::TwelveMonths => 12,
            DepositTerm::TwentyFourMonths => 24,
        }
    }

    /// 만기일 계산 (달력 기준, 말일은 clamp)
    ///
    /// 1월 31일 + 1개월 = 2월 28/29일
    pub fn maturity_from(self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        start.checked_add_months(Months::new(self.months()))
    }
}

impl TryFrom<u32> for DepositTerm {
    type Error = String;

    fn try_from(months: u32) -> Result<Self, Self::Error> {
        DepositTerm::ALL
            .into_iter()
            .find(|term| term.months() == months)
            .ok_or_else(|| format!("Unsupported duration: {} months (allowed: 1, 3, 6, 12, 24)", months))
    }
}

impl From<DepositTerm> for u32 {
    fn from(term: DepositTerm) -> Self {
        term.months()
    }
}

impl fmt::Display for DepositTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let months = self.months();
        write!(f, "{} {}", months, if months == 1 { "Month" } else { "Months" })
    }
}

/// 고정 예치 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedDeposit {
    /// 생성 시 할당, 변경 불가
    pub id: String,

    /// 소유 사용자 (목록 조회 파티션 키)
    pub user_id: String,

    /// 원금 (암호화폐 단위)
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub duration: DepositTerm,

    /// 연 이자율 (%), 기간 테이블에서만 결정됨
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,

    pub wallet_address: String,

    pub created_at: DateTime<Utc>,

    pub maturity_date: DateTime<Utc>,

    /// 표시용 스냅샷 (정산 계산에는 사용하지 않음)
    #[serde(with = "rust_decimal::serde::float")]
    pub accrued_interest: Decimal,
}

impl FixedDeposit {
    pub fn is_matured_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.maturity_date
    }
}

/// 예치 상태 (저장하지 않고 조회 시점에 계산)
///
/// - `Active`: 저장소에 있고 만기 전
/// - `Matured`: 저장소에 있고 만기 도래
/// - `Withdrawn`: 정산 후 삭제됨 (정산 영수증에만 등장)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Active,
    Matured,
    Withdrawn,
}

impl DepositStatus {
    /// 저장소에 존재하는 예치의 현재 상태
    pub fn of(deposit: &FixedDeposit, now: DateTime<Utc>) -> Self {
        if deposit.is_matured_at(now) {
            DepositStatus::Matured
        } else {
            DepositStatus::Active
        }
    }
}

/// 예치 생성 파라미터 (검증 완료 상태)
#[derive(Debug, Clone)]
pub struct NewDeposit {
    pub user_id: String,
    pub amount: Decimal,
    pub duration: DepositTerm,
    pub interest_rate: Decimal,
    pub wallet_address: String,
}
