use std::str::FromStr;

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::{RawTransaction, Transaction};

/// Output of the normalization stage.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    /// Records dropped because their amount could not be coerced.
    pub dropped: usize,
}

/// Coerce amounts and timestamps. Records without a usable amount are
/// dropped; a bad timestamp only clears the timestamp.
pub fn normalize(records: Vec<RawTransaction>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for raw in records {
        let Some(amount_usd) = raw.amount_usd.as_ref().and_then(coerce_amount) else {
            tracing::trace!(
                kind = %raw.kind,
                account = ?raw.account,
                amount = ?raw.amount_usd,
                "Dropping record with invalid amountUSD"
            );
            batch.dropped += 1;
            continue;
        };

        batch.transactions.push(Transaction {
            kind: raw.kind,
            account: raw.account,
            amount_usd,
            timestamp: raw.timestamp.as_ref().and_then(coerce_timestamp),
            asset_symbol: raw.asset_symbol,
            liquidator: raw.liquidator,
            liquidatee: raw.liquidatee,
        });
    }

    if batch.dropped > 0 {
        tracing::debug!(dropped = batch.dropped, "Records dropped during normalization");
    }
    counter!("records_dropped_total").increment(batch.dropped as u64);

    batch
}

/// Coerce a JSON number or numeric string to a finite decimal.
pub fn coerce_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Coerce epoch seconds (number or numeric string) to a UTC timestamp.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => return DateTime::from_timestamp(secs, 0),
            None => n.as_f64()?,
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return DateTime::from_timestamp(secs, 0);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };

    from_fractional_seconds(seconds)
}

fn from_fractional_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    let secs = i64::from_f64(whole)?;
    DateTime::from_timestamp(secs, nanos.min(999_999_999))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use serde_json::json;

    fn raw(amount: Value, timestamp: Value) -> RawTransaction {
        RawTransaction {
            kind: TransactionKind::Deposit,
            account: Some("0xA".into()),
            amount_usd: Some(amount),
            timestamp: Some(timestamp),
            asset_symbol: Some("USDC".into()),
            liquidator: None,
            liquidatee: None,
        }
    }

    #[test]
    fn test_coerce_amount_forms() {
        assert_eq!(coerce_amount(&json!("100")), Some(Decimal::from(100)));
        assert_eq!(coerce_amount(&json!(" 12.5 ")), Some(Decimal::new(125, 1)));
        assert_eq!(coerce_amount(&json!(42)), Some(Decimal::from(42)));
        assert_eq!(coerce_amount(&json!("1e3")), Some(Decimal::from(1000)));
        assert_eq!(coerce_amount(&json!("abc")), None);
        assert_eq!(coerce_amount(&json!("")), None);
        assert_eq!(coerce_amount(&json!("NaN")), None);
        assert_eq!(coerce_amount(&json!(true)), None);
    }

    #[test]
    fn test_coerce_timestamp_forms() {
        let expected = DateTime::from_timestamp(1_620_000_000, 0);
        assert_eq!(coerce_timestamp(&json!(1_620_000_000)), expected);
        assert_eq!(coerce_timestamp(&json!("1620000000")), expected);
        assert_eq!(coerce_timestamp(&json!("yesterday")), None);
        assert_eq!(coerce_timestamp(&json!(null)), None);
    }

    #[test]
    fn test_invalid_amount_dropped_invalid_timestamp_kept() {
        let batch = normalize(vec![
            raw(json!("oops"), json!("1620000000")),
            raw(json!("10"), json!("not-a-time")),
        ]);

        assert_eq!(batch.dropped, 1);
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].amount_usd, Decimal::from(10));
        assert_eq!(batch.transactions[0].timestamp, None);
    }

    #[test]
    fn test_missing_amount_dropped() {
        let mut record = raw(json!("1"), json!(0));
        record.amount_usd = None;
        let batch = normalize(vec![record]);
        assert_eq!(batch.dropped, 1);
        assert!(batch.transactions.is_empty());
    }
}
