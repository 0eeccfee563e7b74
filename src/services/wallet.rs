//! Wallet Connector (mock)
//!
//! Simulates a browser-wallet connection. No signing and no chain calls:
//! connecting just produces an address and a display balance, and the deposit
//! flow only ever consumes the address string.
//!
//! Addresses come from an injectable [`AddressGenerator`], so tests can use a
//! seeded generator and get the same wallet every run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use sha3::{Digest, Keccak256};
use tokio::sync::RwLock;

use crate::config::simulate_latency;

/// Ethereum mainnet
pub const MOCK_CHAIN_ID: u64 = 1;

/// 연결된 지갑
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// EIP-55 checksum 주소
    pub address: String,
    /// 표시용 잔액 (0 ~ 10, 소수점 4자리)
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub chain_id: u64,
}

/// 생성된 지갑 원재료
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSeed {
    pub address: [u8; 20],
    pub balance: Decimal,
}

/// 지갑 주소 생성기
pub trait AddressGenerator: Send + Sync {
    fn next_wallet(&self) -> WalletSeed;
}

/// 난수 기반 생성기
pub struct RandomAddressGenerator {
    rng: Mutex<StdRng>,
}

impl RandomAddressGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 테스트용: 같은 seed → 같은 지갑 순서
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AddressGenerator for RandomAddressGenerator {
    fn next_wallet(&self) -> WalletSeed {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut address = [0u8; 20];
        rng.fill(&mut address);
        // [0, 100000) / 10^4 → [0, 10), 4 dp
        let balance = Decimal::new(rng.gen_range(0..100_000), 4);
        WalletSeed { address, balance }
    }
}

/// EIP-55 mixed-case checksum encoding
///
/// 소문자 hex 주소의 Keccak256 해시에서 해당 nibble 이 8 이상이면 대문자
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// 0x + 40 hex
pub fn is_valid_address(addr: &str) -> bool {
    addr.len() == 42 && addr.starts_with("0x") && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// 사용자별 mock 지갑 연결 관리
pub struct WalletConnector {
    wallets: RwLock<HashMap<String, Wallet>>,
    generator: Arc<dyn AddressGenerator>,
    latency: Duration,
}

impl WalletConnector {
    pub fn new(generator: Arc<dyn AddressGenerator>, latency: Duration) -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
            generator,
            latency,
        }
    }

    /// 지갑 연결
    ///
    /// 이미 연결된 사용자는 기존 지갑을 그대로 반환
    pub async fn connect(&self, user_id: &str) -> Wallet {
        simulate_latency(self.latency).await;

        let mut wallets = self.wallets.write().await;
        if let Some(existing) = wallets.get(user_id) {
            return existing.clone();
        }

        let seed = self.generator.next_wallet();
        let wallet = Wallet {
            address: to_checksum_address(&seed.address),
            balance: seed.balance,
            chain_id: MOCK_CHAIN_ID,
        };
        tracing::info!(user_id, address = %wallet.address, "wallet connected");

        wallets.insert(user_id.to_string(), wallet.clone());
        wallet
    }

    /// 연결 해제 (연결되어 있지 않으면 no-op)
    pub async fn disconnect(&self, user_id: &str) -> bool {
        let removed = self.wallets.write().await.remove(user_id).is_some();
        if removed {
            tracing::info!(user_id, "wallet disconnected");
        }
        removed
    }

    pub async fn current(&self, user_id: &str) -> Option<Wallet> {
        self.wallets.read().await.get(user_id).cloned()
    }
}
