use rust_decimal::Decimal;

use crate::models::{ScoredWallet, WalletFeatures};

pub const BASE_SCORE: i64 = 50;
pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 100;

/// Cap on the average-ticket reward.
const MAX_VOLUME_REWARD: i64 = 20;
const ASSET_DIVERSITY_WEIGHT: i64 = 2;
const LIQUIDATION_RATIO_PENALTY: i64 = 30;
const LIQUIDATEE_PENALTY: i64 = 5;
const LIQUIDATOR_REWARD: i64 = 2;

/// Score every wallet, preserving input order.
pub fn score_all(features: Vec<WalletFeatures>) -> Vec<ScoredWallet> {
    features.into_iter().map(score_wallet).collect()
}

pub fn score_wallet(features: WalletFeatures) -> ScoredWallet {
    let score = credit_score(&features);
    ScoredWallet { features, score }
}

/// Linear credit heuristic, clipped to [0, 100]:
///
/// ```text
/// 50 + clip(sum / count, 0, 20)
///    + 2 * distinct assets
///    - 30 * liquidation-to-borrow ratio
///    - 5 * times liquidated
///    + 2 * times acting as liquidator
/// ```
///
/// Intermediate terms saturate instead of overflowing; only the final
/// clip bounds the result.
pub fn credit_score(f: &WalletFeatures) -> Decimal {
    let avg_ticket = if f.transaction_count == 0 {
        Decimal::ZERO
    } else {
        f.amount_usd_sum / Decimal::from(f.transaction_count)
    };

    let score = Decimal::from(BASE_SCORE)
        .saturating_add(clip(avg_ticket, Decimal::ZERO, Decimal::from(MAX_VOLUME_REWARD)))
        .saturating_add(weighted(ASSET_DIVERSITY_WEIGHT, Decimal::from(f.asset_nunique)))
        .saturating_sub(weighted(LIQUIDATION_RATIO_PENALTY, f.liquidation_to_borrow_ratio))
        .saturating_sub(weighted(LIQUIDATEE_PENALTY, Decimal::from(f.liquidatee_count)))
        .saturating_add(weighted(LIQUIDATOR_REWARD, Decimal::from(f.liquidator_count)));

    clip(score, Decimal::from(MIN_SCORE), Decimal::from(MAX_SCORE))
}

/// max(lo, min(hi, x))
pub fn clip(x: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    lo.max(hi.min(x))
}

fn weighted(weight: i64, value: Decimal) -> Decimal {
    Decimal::from(weight).saturating_mul(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
