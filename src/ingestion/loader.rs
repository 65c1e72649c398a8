use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use metrics::counter;
use serde_json::Value;

use crate::errors::{Result, ScoringError};
use crate::models::{RawTransaction, TransactionKind};

/// Records pulled out of a set of input files.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<RawTransaction>,
    /// Number of records loaded per kind, across every file.
    pub per_kind: BTreeMap<TransactionKind, usize>,
    pub files: usize,
}

impl LoadedRecords {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn extend(&mut self, records: Vec<RawTransaction>) {
        for record in &records {
            *self.per_kind.entry(record.kind).or_default() += 1;
        }
        self.records.extend(records);
        self.files += 1;
    }
}

/// Load every file concurrently and flatten them into one record stream.
///
/// Records keep the order of `paths`, and within a file the order of
/// [`TransactionKind::SOURCES`]. A file that cannot be read or parsed
/// fails the whole load.
pub async fn load_files(paths: &[PathBuf]) -> Result<LoadedRecords> {
    let reads = paths.iter().cloned().map(|path| async move {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ScoringError::Read {
                path: path.clone(),
                source,
            })?;
        let records = parse_document(&path, &bytes)?;
        tracing::info!(
            file = %path.display(),
            records = records.len(),
            "Loaded transaction file"
        );
        Ok::<_, ScoringError>(records)
    });

    let per_file = try_join_all(reads).await?;

    let mut loaded = LoadedRecords::default();
    for records in per_file {
        loaded.extend(records);
    }

    for (kind, count) in &loaded.per_kind {
        counter!("records_loaded_total", "kind" => kind.as_str()).increment(*count as u64);
    }

    Ok(loaded)
}

/// Parse one file's contents. Collections absent from the document are
/// skipped silently.
pub fn parse_document(path: &Path, bytes: &[u8]) -> Result<Vec<RawTransaction>> {
    let root: Value = serde_json::from_slice(bytes).map_err(|source| ScoringError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let document = root.as_object().ok_or_else(|| ScoringError::NotAnObject {
        path: path.to_path_buf(),
    })?;

    let mut records = Vec::new();

    for (collection, kind) in TransactionKind::SOURCES {
        match document.get(collection) {
            Some(Value::Array(items)) => {
                records.extend(items.iter().map(|item| raw_record(kind, item)));
            }
            Some(Value::Null) | None => {}
            Some(_) => {
                tracing::debug!(
                    file = %path.display(),
                    collection,
                    "Collection is not a list, skipping"
                );
            }
        }
    }

    Ok(records)
}

fn raw_record(kind: TransactionKind, item: &Value) -> RawTransaction {
    let is_liquidation = kind == TransactionKind::Liquidation;

    RawTransaction {
        kind,
        account: lookup(item, "account.id").and_then(identifier),
        amount_usd: lookup(item, "amountUSD").cloned(),
        timestamp: lookup(item, "timestamp").cloned(),
        asset_symbol: lookup(item, "asset.symbol").and_then(identifier),
        liquidator: is_liquidation
            .then(|| lookup(item, "liquidator.id").and_then(identifier))
            .flatten(),
        liquidatee: is_liquidation
            .then(|| lookup(item, "liquidatee.id").and_then(identifier))
            .flatten(),
    }
}

/// Resolve a dotted field, accepting either a flat `"a.b"` key or nested
/// `{"a": {"b": ..}}` objects. JSON null counts as absent.
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let found = match record.get(path) {
        Some(value) => Some(value),
        None => path
            .split('.')
            .try_fold(record, |current, segment| current.get(segment)),
    };

    found.filter(|value| !value.is_null())
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
