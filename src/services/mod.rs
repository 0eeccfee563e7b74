//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `interest`: 이자/만기/페널티 계산 (순수 함수)
//! - `DepositService`: 예치 생성/조회/출금 생명주기
//! - `WalletConnector`: mock 지갑 연결
//! - `RateOracle`: 현지 통화 환율
//! - `SessionService`: mock 로그인 세션

pub mod interest;
mod lifecycle;
mod rate_oracle;
mod session;
mod wallet;

pub use interest::{InterestEngine, RateSchedule, TimeRemaining};
pub use lifecycle::{
    max_deposit_amount, min_deposit_amount, require_wallet, validate_amount, validate_duration,
    DepositService, DepositView, Settlement, WithdrawalQuote, MAX_AMOUNT_DP,
};
pub use rate_oracle::{to_local_value, RateError, RateOracle, RateQuote, LOCAL_CURRENCY};
pub use session::{Session, SessionError, SessionService, User};
pub use wallet::{
    is_valid_address, to_checksum_address, AddressGenerator, RandomAddressGenerator, Wallet,
    WalletConnector, WalletSeed,
};
