use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::{Decimal, MathematicalOps};

use crate::errors::{Result, ScoringError};
use crate::models::{Transaction, TransactionKind, WalletFeatures};

/// Per-wallet running state, filled in one pass and finalized afterwards.
#[derive(Debug, Default)]
struct WalletAccumulator<'a> {
    amounts: Vec<Decimal>,
    sum: Decimal,
    assets: BTreeSet<&'a str>,
    liquidated: Decimal,
    borrowed: Decimal,
}

impl<'a> WalletAccumulator<'a> {
    /// Returns None if a running total leaves the Decimal range.
    fn push(&mut self, tx: &'a Transaction) -> Option<()> {
        self.sum = self.sum.checked_add(tx.amount_usd)?;
        match tx.kind {
            TransactionKind::Liquidation => {
                self.liquidated = self.liquidated.checked_add(tx.amount_usd)?
            }
            TransactionKind::Borrow => self.borrowed = self.borrowed.checked_add(tx.amount_usd)?,
            _ => {}
        }

        self.amounts.push(tx.amount_usd);
        if let Some(symbol) = tx.asset_symbol.as_deref() {
            self.assets.insert(symbol);
        }
        Some(())
    }

    fn finalize(self, wallet: &str, roles: &LiquidationRoles) -> WalletFeatures {
        let count = self.amounts.len() as u64;
        let mean = self.sum / Decimal::from(count);

        WalletFeatures {
            wallet: wallet.to_string(),
            amount_usd_sum: self.sum,
            amount_usd_mean: mean,
            amount_usd_std: sample_std_dev(&self.amounts, mean),
            transaction_count: count,
            asset_nunique: self.assets.len() as u64,
            amount_usd_liquidation: self.liquidated,
            amount_usd_borrow: self.borrowed,
            liquidation_to_borrow_ratio: liquidation_to_borrow_ratio(self.liquidated, self.borrowed),
            liquidator_count: roles.liquidator_count(wallet),
            liquidatee_count: roles.liquidatee_count(wallet),
        }
    }
}

// ---------------------------------------------------------------------------
// Liquidation roles
// ---------------------------------------------------------------------------

/// How often each wallet appeared on either side of a liquidation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiquidationRoles {
    pub liquidators: BTreeMap<String, u64>,
    pub liquidatees: BTreeMap<String, u64>,
}

impl LiquidationRoles {
    pub fn liquidator_count(&self, wallet: &str) -> u64 {
        self.liquidators.get(wallet).copied().unwrap_or(0)
    }

    pub fn liquidatee_count(&self, wallet: &str) -> u64 {
        self.liquidatees.get(wallet).copied().unwrap_or(0)
    }
}

/// Count liquidation events per liquidator and per liquidatee identifier.
/// A liquidation without a liquidatee is attributed to its account, the
/// victim of the event. A missing liquidator is not counted.
pub fn tally_liquidation_roles(transactions: &[Transaction]) -> LiquidationRoles {
    let mut roles = LiquidationRoles::default();

    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Liquidation)
    {
        if let Some(liquidator) = &tx.liquidator {
            *roles.liquidators.entry(liquidator.clone()).or_default() += 1;
        }
        if let Some(liquidatee) = tx.liquidatee.as_ref().or(tx.account.as_ref()) {
            *roles.liquidatees.entry(liquidatee.clone()).or_default() += 1;
        }
    }

    roles
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Build one feature row per wallet seen in the account role, sorted by
/// wallet identifier. Records without an account contribute only to the
/// liquidation role tallies. Fails if a wallet's amount totals overflow.
pub fn aggregate(transactions: &[Transaction]) -> Result<Vec<WalletFeatures>> {
    let mut wallets: BTreeMap<&str, WalletAccumulator<'_>> = BTreeMap::new();

    for tx in transactions {
        if let Some(account) = tx.account.as_deref() {
            if wallets.entry(account).or_default().push(tx).is_none() {
                tracing::error!(wallet = account, amount = %tx.amount_usd, "Wallet amount total overflowed");
                return Err(ScoringError::Overflow {
                    wallet: account.to_string(),
                });
            }
        }
    }

    let roles = tally_liquidation_roles(transactions);

    let features: Vec<WalletFeatures> = wallets
        .into_iter()
        .map(|(wallet, acc)| acc.finalize(wallet, &roles))
        .collect();

    tracing::debug!(
        wallets = features.len(),
        liquidators = roles.liquidators.len(),
        liquidatees = roles.liquidatees.len(),
        "Aggregated wallet features"
    );

    Ok(features)
}

/// Liquidated / borrowed, defined as zero when nothing was borrowed.
pub fn liquidation_to_borrow_ratio(liquidated: Decimal, borrowed: Decimal) -> Decimal {
    if borrowed.is_zero() {
        return Decimal::ZERO;
    }

    liquidated.checked_div(borrowed).unwrap_or_else(|| {
        if liquidated.is_sign_negative() == borrowed.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

/// Sample standard deviation (n - 1 denominator).
/// Returns None for fewer than two values, or if the computation overflows.
pub fn sample_std_dev(values: &[Decimal], mean: Decimal) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }

    let mut squares = Decimal::ZERO;
    for value in values {
        let diff = value.checked_sub(mean)?;
        squares = squares.checked_add(diff.checked_mul(diff)?)?;
    }

    let variance = squares / Decimal::from(values.len() as u64 - 1);
    variance.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: TransactionKind, account: &str, amount: i64, asset: &str) -> Transaction {
        Transaction {
            kind,
            account: Some(account.to_string()),
            amount_usd: Decimal::from(amount),
            timestamp: None,
            asset_symbol: Some(asset.to_string()),
            liquidator: None,
            liquidatee: None,
        }
    }

    fn liquidation(account: &str, amount: i64, liquidator: Option<&str>, liquidatee: Option<&str>) -> Transaction {
        Transaction {
            liquidator: liquidator.map(String::from),
            liquidatee: liquidatee.map(String::from),
            ..tx(TransactionKind::Liquidation, account, amount, "USDC")
        }
    }

    fn find<'a>(features: &'a [WalletFeatures], wallet: &str) -> &'a WalletFeatures {
        features
            .iter()
            .find(|f| f.wallet == wallet)
            .expect("wallet should have a feature row")
    }

    #[test]
    fn test_basic_statistics() {
        let txs = vec![
            tx(TransactionKind::Deposit, "0xA", 10, "USDC"),
            tx(TransactionKind::Deposit, "0xA", 20, "DAI"),
            tx(TransactionKind::Withdraw, "0xA", 30, "USDC"),
        ];

        let features = aggregate(&txs).unwrap();
        assert_eq!(features.len(), 1);

        let a = &features[0];
        assert_eq!(a.amount_usd_sum, Decimal::from(60));
        assert_eq!(a.amount_usd_mean, Decimal::from(20));
        // sample variance = (100 + 0 + 100) / 2 = 100
        let std = a.amount_usd_std.expect("std defined for three values");
        assert!((std - Decimal::from(10)).abs() < Decimal::new(1, 12));
        assert_eq!(a.transaction_count, 3);
        assert_eq!(a.asset_nunique, 2);
    }

    #[test]
    fn test_single_transaction_std_is_undefined() {
        let features = aggregate(&[tx(TransactionKind::Deposit, "0xA", 10, "USDC")]).unwrap();
        assert_eq!(features[0].amount_usd_std, None);
    }

    #[test]
    fn test_ratio_zero_without_borrows() {
        let features = aggregate(&[liquidation("0xA", 50, None, None)]).unwrap();
        let a = &features[0];
        assert_eq!(a.amount_usd_liquidation, Decimal::from(50));
        assert_eq!(a.amount_usd_borrow, Decimal::ZERO);
        assert_eq!(a.liquidation_to_borrow_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_ratio_with_borrows() {
        let features = aggregate(&[
            tx(TransactionKind::Borrow, "0xA", 100, "DAI"),
            liquidation("0xA", 50, None, None),
        ])
        .unwrap();
        assert_eq!(features[0].liquidation_to_borrow_ratio, Decimal::new(5, 1));
    }

    #[test]
    fn test_role_counts_joined_by_wallet() {
        let txs = vec![
            tx(TransactionKind::Deposit, "0xBB", 5, "ETH"),
            liquidation("0xAA", 50, Some("0xBB"), Some("0xAA")),
            liquidation("0xAA", 10, Some("0xBB"), None),
        ];

        let features = aggregate(&txs).unwrap();
        let aa = find(&features, "0xAA");
        let bb = find(&features, "0xBB");

        // second event has no liquidatee and falls back to its account
        assert_eq!(aa.liquidatee_count, 2);
        assert_eq!(aa.liquidator_count, 0);
        assert_eq!(bb.liquidator_count, 2);
        assert_eq!(bb.liquidatee_count, 0);
    }

    #[test]
    fn test_roles_tallied_for_wallets_without_account_rows() {
        let txs = vec![liquidation("0xAA", 50, Some("0xBB"), Some("0xAA"))];

        let features = aggregate(&txs).unwrap();
        assert_eq!(features.len(), 1);

        let roles = tally_liquidation_roles(&txs);
        assert_eq!(roles.liquidator_count("0xBB"), 1);
        assert_eq!(roles.liquidatee_count("0xAA"), 1);
        assert_eq!(roles.liquidatee_count("0xZZ"), 0);
    }

    #[test]
    fn test_explicit_liquidatee_wins_over_account() {
        let roles = tally_liquidation_roles(&[liquidation("0xAA", 5, None, Some("0xCC"))]);
        assert_eq!(roles.liquidatee_count("0xCC"), 1);
        assert_eq!(roles.liquidatee_count("0xAA"), 0);
        assert!(roles.liquidators.is_empty());
    }

    #[test]
    fn test_records_without_account_skipped() {
        let mut orphan = tx(TransactionKind::Deposit, "unused", 10, "USDC");
        orphan.account = None;

        let features = aggregate(&[orphan, tx(TransactionKind::Deposit, "0xA", 1, "USDC")]).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].wallet, "0xA");
    }

    #[test]
    fn test_rows_sorted_by_wallet() {
        let features = aggregate(&[
            tx(TransactionKind::Deposit, "0xC", 1, "USDC"),
            tx(TransactionKind::Deposit, "0xA", 1, "USDC"),
            tx(TransactionKind::Deposit, "0xB", 1, "USDC"),
        ])
        .unwrap();
        let wallets: Vec<&str> = features.iter().map(|f| f.wallet.as_str()).collect();
        assert_eq!(wallets, vec!["0xA", "0xB", "0xC"]);
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let mut huge = tx(TransactionKind::Borrow, "0xA", 0, "USDC");
        huge.amount_usd = Decimal::MAX - Decimal::ONE;

        let err = aggregate(&[huge.clone(), huge]).unwrap_err();
        assert!(matches!(err, ScoringError::Overflow { ref wallet } if wallet == "0xA"));
    }

    #[test]
    fn test_large_totals_within_range() {
        let mut big = tx(TransactionKind::Deposit, "0xA", 0, "USDC");
        big.amount_usd = Decimal::MAX / Decimal::from(3);

        let features = aggregate(&[big.clone(), big.clone()]).unwrap();
        assert_eq!(features[0].amount_usd_sum, big.amount_usd * Decimal::TWO);
    }

    #[test]
    fn test_order_independent() {
        let mut txs = vec![
            tx(TransactionKind::Deposit, "0xA", 10, "USDC"),
            tx(TransactionKind::Borrow, "0xB", 40, "DAI"),
            liquidation("0xB", 20, Some("0xA"), Some("0xB")),
            tx(TransactionKind::Repay, "0xA", 7, "ETH"),
        ];
        let forward = aggregate(&txs).unwrap();
        txs.reverse();
        assert_eq!(forward, aggregate(&txs).unwrap());
    }
}
