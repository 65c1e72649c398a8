use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Behavioral features for one wallet, derived from every valid record in
/// which the wallet holds the account role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletFeatures {
    pub wallet: String,
    pub amount_usd_sum: Decimal,
    pub amount_usd_mean: Decimal,
    /// Sample standard deviation. `None` for wallets with a single transaction.
    pub amount_usd_std: Option<Decimal>,
    pub transaction_count: u64,
    pub asset_nunique: u64,
    /// USD liquidated while this wallet held the account role.
    pub amount_usd_liquidation: Decimal,
    pub amount_usd_borrow: Decimal,
    /// Zero whenever `amount_usd_borrow` is zero.
    pub liquidation_to_borrow_ratio: Decimal,
    pub liquidator_count: u64,
    pub liquidatee_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredWallet {
    #[serde(flatten)]
    pub features: WalletFeatures,
    /// Always within [0, 100].
    pub score: Decimal,
}

impl ScoredWallet {
    pub fn wallet(&self) -> &str {
        &self.features.wallet
    }
}

/// Row of the persisted top-N file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopWallet {
    pub wallet: String,
    pub score: Decimal,
}

impl From<&ScoredWallet> for TopWallet {
    fn from(scored: &ScoredWallet) -> Self {
        Self {
            wallet: scored.features.wallet.clone(),
            score: scored.score,
        }
    }
}
