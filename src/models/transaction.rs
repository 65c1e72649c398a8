use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Borrow,
    Repay,
    Withdraw,
    Liquidation,
}

impl TransactionKind {
    /// Every kind, paired with the top-level collection it is read from.
    pub const SOURCES: [(&'static str, TransactionKind); 5] = [
        ("deposits", TransactionKind::Deposit),
        ("borrows", TransactionKind::Borrow),
        ("repayments", TransactionKind::Repay),
        ("withdrawals", TransactionKind::Withdraw),
        ("liquidations", TransactionKind::Liquidation),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Borrow => "borrow",
            TransactionKind::Repay => "repay",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Liquidation => "liquidation",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawTransaction — loader output, amounts not yet coerced
// ---------------------------------------------------------------------------

/// One record as it came out of an input file, tagged with the kind of the
/// collection it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub kind: TransactionKind,
    pub account: Option<String>,
    pub amount_usd: Option<Value>,
    pub timestamp: Option<Value>,
    pub asset_symbol: Option<String>,
    /// Only populated for liquidations.
    pub liquidator: Option<String>,
    /// Only populated for liquidations.
    pub liquidatee: Option<String>,
}

// ---------------------------------------------------------------------------
// Transaction — normalized record fed to the aggregator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub account: Option<String>,
    pub amount_usd: Decimal,
    pub timestamp: Option<DateTime<Utc>>,
    pub asset_symbol: Option<String>,
    pub liquidator: Option<String>,
    pub liquidatee: Option<String>,
}
