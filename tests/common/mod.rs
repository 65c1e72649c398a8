use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

/// Scratch directory holding fixture input files.
pub struct Fixture {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Write a JSON document and return its path.
    pub fn write_json(&self, name: &str, document: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_vec_pretty(document).unwrap())
            .expect("Failed to write fixture");
        path
    }

    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// A subgraph-shaped record with nested account and asset objects.
#[allow(dead_code)]
pub fn record(account: &str, amount: &str, symbol: &str) -> Value {
    json!({
        "account": {"id": account},
        "amountUSD": amount,
        "timestamp": "1620000000",
        "asset": {"symbol": symbol}
    })
}

#[allow(dead_code)]
pub fn liquidation(account: &str, amount: &str, liquidator: &str, liquidatee: &str) -> Value {
    json!({
        "account": {"id": account},
        "amountUSD": amount,
        "timestamp": "1620000000",
        "asset": {"symbol": "USDC"},
        "liquidator": {"id": liquidator},
        "liquidatee": {"id": liquidatee}
    })
}
