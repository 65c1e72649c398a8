use crate::models::{ScoredWallet, TopWallet};

/// The `n` highest-scoring wallets, descending by score.
///
/// The sort is stable, so tied wallets keep the order they were produced
/// in by the aggregator. Tie order carries no meaning.
pub fn select_top(scored: &[ScoredWallet], n: usize) -> Vec<TopWallet> {
    let mut ranked: Vec<&ScoredWallet> = scored.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    ranked.into_iter().take(n).map(TopWallet::from).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletFeatures;
    use rust_decimal::Decimal;

    fn scored(wallet: &str, score: i64) -> ScoredWallet {
        ScoredWallet {
            features: WalletFeatures {
                wallet: wallet.into(),
                amount_usd_sum: Decimal::ZERO,
                amount_usd_mean: Decimal::ZERO,
                amount_usd_std: None,
                transaction_count: 1,
                asset_nunique: 0,
                amount_usd_liquidation: Decimal::ZERO,
                amount_usd_borrow: Decimal::ZERO,
                liquidation_to_borrow_ratio: Decimal::ZERO,
                liquidator_count: 0,
                liquidatee_count: 0,
            },
            score: Decimal::from(score),
        }
    }

    #[test]
    fn test_descending_and_truncated() {
        let wallets = vec![
            scored("0xA", 40),
            scored("0xB", 90),
            scored("0xC", 10),
            scored("0xD", 70),
        ];

        let top = select_top(&wallets, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].wallet, "0xB");
        assert_eq!(top[1].wallet, "0xD");
    }

    #[test]
    fn test_n_larger_than_population() {
        let wallets = vec![scored("0xA", 1), scored("0xB", 2)];
        assert_eq!(select_top(&wallets, 1000).len(), 2);
    }

    #[test]
    fn test_excluded_never_outscore_included() {
        let wallets: Vec<ScoredWallet> = (0..50)
            .map(|i| scored(&format!("0x{i:02}"), (i * 37) % 11))
            .collect();

        let top = select_top(&wallets, 7);
        let min_included = top.iter().map(|t| t.score).min().unwrap();
        let included: Vec<&str> = top.iter().map(|t| t.wallet.as_str()).collect();

        for w in wallets.iter().filter(|w| !included.contains(&w.wallet())) {
            assert!(w.score <= min_included);
        }
        assert!(top.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn test_zero_requested() {
        assert!(select_top(&[scored("0xA", 5)], 0).is_empty());
    }
}
