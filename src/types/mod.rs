//! Common Types Module
//!
//! 요청 파싱 등 라우트 전반에서 사용되는 공통 타입/헬퍼

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::DepositError;

/// JSON 금액 입력 파싱
///
/// 숫자(`1.5`)와 문자열(`"1.5"`) 모두 허용. 누락/`null` 은 `Ok(None)` 으로
/// 넘겨서 "필수 값" 검증은 서비스 레이어에서 처리
pub fn parse_amount(value: Option<&Value>) -> Result<Option<Decimal>, DepositError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(DepositError::Validation("Amount must be a number".to_string())),
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map(Some)
        .map_err(|_| DepositError::Validation(format!("Amount must be a number, got {:?}", raw)))
}

/// JSON 기간(개월) 입력 파싱
///
/// 정수(`3`)와 정수 문자열(`"3"`) 허용. 누락/`null` 은 `Ok(None)`,
/// 음수/소수/그 외 타입은 검증 에러. 허용 기간인지는 서비스 레이어에서 확인
pub fn parse_duration(value: Option<&Value>) -> Result<Option<u32>, DepositError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(DepositError::Validation(
                "Duration must be a whole number of months".to_string(),
            ))
        }
    };

    raw.parse::<u32>().map(Some).map_err(|_| {
        DepositError::Validation(format!(
            "Duration must be a whole number of months, got {:?}",
            raw
        ))
    })
}
