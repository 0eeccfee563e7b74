//! Fixed Deposit Endpoints
//!
//! Thin HTTP layer over [`DepositService`](crate::services::DepositService):
//! resolves the caller, parses loosely-typed JSON input, and attaches
//! display-only currency conversions. Validation rules and settlement live
//! in the service; handlers only run the same validators in request order.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db::{DepositTerm, FixedDeposit},
    error::ApiError,
    routes::auth::CurrentUser,
    services::{
        min_deposit_amount, require_wallet, to_local_value, validate_amount, validate_duration,
        DepositView, Settlement, WithdrawalQuote,
    },
    types::{parse_amount, parse_duration},
    AppState,
};

// ============ Request/Response Types ============

/// 예치 생성 요청
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepositRequest {
    /// 숫자 또는 문자열
    pub amount: Option<Value>,
    /// 개월 (1, 3, 6, 12, 24), 숫자 또는 문자열
    pub duration: Option<Value>,
    /// 없으면 연결된 지갑 사용
    pub wallet_address: Option<String>,
}

/// 미리보기 요청
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub amount: Option<Value>,
    pub duration: Option<Value>,
    /// 현지 통화 환산용 심볼 (예: ETH)
    pub currency: Option<String>,
}

/// 목록 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// 지정 시 `localValue` 포함
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub duration: DepositTerm,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub projected_interest: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub maturity_amount: Decimal,
    /// 예상 이자의 현지 통화 환산
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub local_interest: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsResponse {
    pub version: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub early_withdrawal_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub minimum_amount: Decimal,
    pub tiers: Vec<TermTier>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermTier {
    pub duration: DepositTerm,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,
}

// ============ Handlers ============

/// GET /deposits/terms
///
/// 기간별 이자율 테이블
pub async fn get_terms(State(state): State<AppState>) -> Json<TermsResponse> {
    let schedule = state.deposits.engine().schedule();
    Json(TermsResponse {
        version: schedule.version().to_string(),
        early_withdrawal_rate: schedule.early_withdrawal_rate(),
        minimum_amount: min_deposit_amount(),
        tiers: schedule
            .tiers()
            .iter()
            .map(|(term, rate)| TermTier {
                duration: *term,
                label: term.to_string(),
                interest_rate: *rate,
            })
            .collect(),
    })
}

/// POST /deposits/preview
///
/// 생성 폼의 예상 이자 (저장하지 않음)
pub async fn preview_deposit(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let amount = validate_amount(parse_amount(req.amount.as_ref())?)?;
    let duration = validate_duration(parse_duration(req.duration.as_ref())?)?;

    let engine = state.deposits.engine();
    let projected_interest = engine.projected_interest(amount, duration);

    let local_interest = match req.currency.as_deref() {
        Some(symbol) => {
            let quote = state.rates.get_rate(symbol).await?;
            Some(to_local_value(projected_interest, quote.rate)?)
        }
        None => None,
    };

    Ok(Json(PreviewResponse {
        amount,
        duration,
        interest_rate: engine.schedule().rate_for(duration),
        projected_interest,
        maturity_amount: engine.projected_maturity_amount(amount, duration),
        local_interest,
    }))
}

/// GET /deposits
///
/// 현재 사용자의 예치 목록 (생성 순서)
///
/// # Response
///
/// ```json
/// [{
///   "id": "fd_1", "userId": "user_...", "amount": 2.5, "duration": 3,
///   "interestRate": 6.0, "walletAddress": "0x...",
///   "createdAt": "...", "maturityDate": "...", "accruedInterest": 0.025,
///   "status": "active", "timeRemaining": "2 months 0 days",
///   "maturityAmount": 2.5375, "earlyWithdrawalAmount": 2.5125, "penalty": 0.025,
///   "accruedInterestToDate": 0.0124
/// }]
/// ```
pub async fn list_deposits(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DepositView>>, ApiError> {
    let views = state.deposits.list_deposits(&user.id).await?;

    let views = match query.currency.as_deref() {
        Some(symbol) => {
            let rate = state.rates.get_rate(symbol).await?.rate;
            views
                .into_iter()
                .map(|v| v.with_local_rate(rate))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => views,
    };

    Ok(Json(views))
}

/// POST /deposits
///
/// 예치 생성. 지갑 주소가 없으면 연결된 지갑을 사용하고,
/// 연결된 지갑도 없으면 400
///
/// 검증 순서: 지갑 → 금액 → 기간 (입력 파싱 실패도 같은 순서로 보고)
pub async fn create_deposit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateDepositRequest>,
) -> Result<(StatusCode, Json<FixedDeposit>), ApiError> {
    let wallet_address = match req.wallet_address {
        Some(address) => Some(address),
        None => state.wallets.current(&user.id).await.map(|w| w.address),
    };
    require_wallet(wallet_address.as_deref())?;
    let amount = validate_amount(parse_amount(req.amount.as_ref())?)?;
    let duration = validate_duration(parse_duration(req.duration.as_ref())?)?;

    let deposit = state
        .deposits
        .create_deposit(&user.id, Some(amount), Some(duration.months()), wallet_address.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(deposit)))
}

/// GET /deposits/:id
pub async fn get_deposit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DepositView>, ApiError> {
    Ok(Json(state.deposits.get_deposit_at(&user.id, &id, Utc::now()).await?))
}

/// GET /deposits/:id/quote
///
/// 지금 출금하면 받을 금액 (중도 해지 다이얼로그용)
pub async fn quote_withdrawal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<WithdrawalQuote>, ApiError> {
    Ok(Json(state.deposits.quote_withdrawal_at(&user.id, &id, Utc::now()).await?))
}

/// POST /deposits/:id/withdraw
///
/// 만기 출금 (만기 전이면 400)
pub async fn withdraw(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Settlement>, ApiError> {
    Ok(Json(state.deposits.withdraw(&user.id, &id).await?))
}

/// POST /deposits/:id/withdraw-early
///
/// 중도 해지 (2% 감면 이자율). 이미 만기면 전액 정산
pub async fn withdraw_early(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Settlement>, ApiError> {
    Ok(Json(state.deposits.withdraw_early(&user.id, &id).await?))
}
