//! Interest Engine
//!
//! Pure, deterministic arithmetic for fixed deposits. Uses simple interest
//! throughout:
//!
//! ```text
//! total = principal * (1 + rate/100 * months/12)
//! ```
//!
//! Early withdrawal uses the same formula with the schedule's reduced rate
//! instead of the deposit's stated rate. Settlement amounts are rounded to
//! 4 decimal places (midpoint away from zero).

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::db::{DepositTerm, FixedDeposit};

/// 정산 금액 소수점 자리수
pub const SETTLEMENT_DP: u32 = 4;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// 잔여 기간 표시용 월 단위 (30일)
const DAYS_PER_MONTH_BUCKET: i64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no rate configured for {0}")]
    MissingTier(DepositTerm),

    #[error("rate for {0} must be positive")]
    NonPositiveRate(DepositTerm),

    #[error("early withdrawal rate {early}% must be below every tier rate (lowest is {lowest}%)")]
    EarlyRateTooHigh { early: Decimal, lowest: Decimal },
}

/// 기간별 이자율 테이블 + 중도 해지 이자율
///
/// 버전이 붙은 설정 값으로 취급: 테이블이 바뀌면 `version` 도 바뀜
#[derive(Debug, Clone, PartialEq)]
pub struct RateSchedule {
    version: String,
    tiers: Vec<(DepositTerm, Decimal)>,
    early_withdrawal_rate: Decimal,
}

impl RateSchedule {
    pub const STANDARD_VERSION: &'static str = "2024-01";

    /// 검증된 스케줄 생성
    ///
    /// 모든 기간에 양수 이자율이 있어야 하고, 중도 해지 이자율은
    /// 모든 기간 이자율보다 낮아야 함 (페널티가 음수가 되지 않도록)
    pub fn new(
        version: impl Into<String>,
        tiers: Vec<(DepositTerm, Decimal)>,
        early_withdrawal_rate: Decimal,
    ) -> Result<Self, ScheduleError> {
        let mut lowest: Option<Decimal> = None;
        for term in DepositTerm::ALL {
            let rate = tiers
                .iter()
                .find(|(t, _)| *t == term)
                .map(|(_, rate)| *rate)
                .ok_or(ScheduleError::MissingTier(term))?;
            if rate <= Decimal::ZERO {
                return Err(ScheduleError::NonPositiveRate(term));
            }
            lowest = Some(lowest.map_or(rate, |l: Decimal| l.min(rate)));
        }

        let lowest = lowest.unwrap_or(Decimal::ZERO);
        if early_withdrawal_rate < Decimal::ZERO || early_withdrawal_rate >= lowest {
            return Err(ScheduleError::EarlyRateTooHigh {
                early: early_withdrawal_rate,
                lowest,
            });
        }

        let mut tiers = tiers;
        tiers.sort_by_key(|(term, _)| *term);
        tiers.dedup_by_key(|(term, _)| *term);

        Ok(Self {
            version: version.into(),
            tiers,
            early_withdrawal_rate,
        })
    }

    /// 1→5%, 3→6%, 6→7%, 12→8%, 24→9%, 중도 해지 2%
    pub fn standard() -> Self {
        Self {
            version: Self::STANDARD_VERSION.to_string(),
            tiers: vec![
                (DepositTerm::OneMonth, Decimal::from(5)),
                (DepositTerm::ThreeMonths, Decimal::from(6)),
                (DepositTerm::SixMonths, Decimal::from(7)),
                (DepositTerm::TwelveMonths, Decimal::from(8)),
                (DepositTerm::TwentyFourMonths, Decimal::from(9)),
            ],
            early_withdrawal_rate: Decimal::from(2),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tiers(&self) -> &[(DepositTerm, Decimal)] {
        &self.tiers
    }

    pub fn early_withdrawal_rate(&self) -> Decimal {
        self.early_withdrawal_rate
    }

    pub fn rate_for(&self, term: DepositTerm) -> Decimal {
        self.tiers
            .iter()
            .find(|(t, _)| *t == term)
            .map(|(_, rate)| *rate)
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

/// 단리 원리금 (반올림 전)
///
/// `principal * (1 + rate/100 * months/12)`
pub fn simple_total(principal: Decimal, annual_rate: Decimal, months: u32) -> Decimal {
    principal + principal * annual_rate * Decimal::from(months) / Decimal::from(1200)
}

pub fn round_settlement(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SETTLEMENT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Interest calculator bound to one rate schedule.
#[derive(Debug, Clone, Default)]
pub struct InterestEngine {
    schedule: RateSchedule,
}

impl InterestEngine {
    pub fn new(schedule: RateSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &RateSchedule {
        &self.schedule
    }

    /// 만기 수령액 (예치 이자율 적용)
    pub fn maturity_amount(&self, deposit: &FixedDeposit) -> Decimal {
        round_settlement(simple_total(
            deposit.amount,
            deposit.interest_rate,
            deposit.duration.months(),
        ))
    }

    /// 중도 해지 수령액 (감면 이자율 적용)
    pub fn early_withdrawal_amount(&self, deposit: &FixedDeposit) -> Decimal {
        round_settlement(simple_total(
            deposit.amount,
            self.schedule.early_withdrawal_rate,
            deposit.duration.months(),
        ))
    }

    pub fn penalty(&self, deposit: &FixedDeposit) -> Decimal {
        self.maturity_amount(deposit) - self.early_withdrawal_amount(deposit)
    }

    /// 만기 시 받을 이자 (생성 폼 미리보기)
    pub fn projected_interest(&self, amount: Decimal, term: DepositTerm) -> Decimal {
        let rate = self.schedule.rate_for(term);
        round_settlement(simple_total(amount, rate, term.months()) - amount)
    }

    /// 생성 전 만기 수령액. 같은 금액/기간이면 `maturity_amount` 와 동일
    pub fn projected_maturity_amount(&self, amount: Decimal, term: DepositTerm) -> Decimal {
        round_settlement(simple_total(amount, self.schedule.rate_for(term), term.months()))
    }

    /// 생성 전 중도 해지 페널티
    pub fn projected_penalty(&self, amount: Decimal, term: DepositTerm) -> Decimal {
        self.projected_maturity_amount(amount, term)
            - round_settlement(simple_total(amount, self.schedule.early_withdrawal_rate, term.months()))
    }

    /// 현재까지 발생한 이자 (경과 시간 비례, 만기에서 cap)
    pub fn accrued_interest(&self, deposit: &FixedDeposit, now: DateTime<Utc>) -> Decimal {
        let term_secs = (deposit.maturity_date - deposit.created_at).num_seconds();
        if term_secs <= 0 || now <= deposit.created_at {
            return Decimal::ZERO;
        }
        let elapsed_secs = (now.min(deposit.maturity_date) - deposit.created_at).num_seconds();

        let full_interest =
            simple_total(deposit.amount, deposit.interest_rate, deposit.duration.months()) - deposit.amount;
        round_settlement(full_interest * Decimal::from(elapsed_secs) / Decimal::from(term_secs))
    }
}

/// 만기까지 남은 기간
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Matured,
    /// 30일 = 1개월 기준으로 분할
    Remaining { months: i64, days: i64 },
}

/// `now >= maturity` 이면 `Matured`, 아니면 남은 일수 (내림)
///
/// 30일 이하는 일 단위로만, 그 이상은 개월 + 일
pub fn time_remaining(now: DateTime<Utc>, maturity_date: DateTime<Utc>) -> TimeRemaining {
    if now >= maturity_date {
        return TimeRemaining::Matured;
    }

    let days = (maturity_date - now).num_seconds() / SECONDS_PER_DAY;
    if days > DAYS_PER_MONTH_BUCKET {
        TimeRemaining::Remaining {
            months: days / DAYS_PER_MONTH_BUCKET,
            days: days % DAYS_PER_MONTH_BUCKET,
        }
    } else {
        TimeRemaining::Remaining { months: 0, days }
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRemaining::Matured => write!(f, "matured"),
            TimeRemaining::Remaining { months: 0, days } => write!(f, "{}", plural(*days, "day")),
            TimeRemaining::Remaining { months, days } => {
                write!(f, "{} {}", plural(*months, "month"), plural(*days, "day"))
            }
        }
    }
}
