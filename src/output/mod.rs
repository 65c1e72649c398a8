pub mod csv;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;

use crate::errors::{Result, ScoringError};
use crate::models::{ScoredWallet, TopWallet};

pub const TOP_WALLETS_HEADER: [&str; 2] = ["wallet", "score"];

pub const FEATURE_TABLE_HEADER: [&str; 12] = [
    "wallet",
    "amount_usd_sum",
    "amount_usd_mean",
    "amount_usd_std",
    "transaction_count",
    "asset_nunique",
    "amount_usd_liquidation",
    "amount_usd_borrow",
    "liquidation_to_borrow_ratio",
    "liquidator_count",
    "liquidatee_count",
    "score",
];

/// Write the two-column `wallet,score` file.
pub fn write_top_wallets(path: &Path, wallets: &[TopWallet]) -> Result<()> {
    commit(vec![stage_top_wallets(path, wallets)?])?;
    tracing::info!(path = %path.display(), rows = wallets.len(), "Top wallets written");
    Ok(())
}

/// Write the full per-wallet feature table, score included.
pub fn write_feature_table(path: &Path, wallets: &[ScoredWallet]) -> Result<()> {
    commit(vec![stage_feature_table(path, wallets)?])?;
    tracing::info!(path = %path.display(), rows = wallets.len(), "Feature table written");
    Ok(())
}

pub fn stage_top_wallets(path: &Path, wallets: &[TopWallet]) -> Result<StagedFile> {
    let rows = wallets
        .iter()
        .map(|w| vec![w.wallet.clone(), format_decimal(w.score)]);

    stage(path, &TOP_WALLETS_HEADER, rows)
}

/// An undefined standard deviation becomes an empty cell.
pub fn stage_feature_table(path: &Path, wallets: &[ScoredWallet]) -> Result<StagedFile> {
    let rows = wallets.iter().map(|w| {
        let f = &w.features;
        vec![
            f.wallet.clone(),
            format_decimal(f.amount_usd_sum),
            format_decimal(f.amount_usd_mean),
            f.amount_usd_std.map(format_decimal).unwrap_or_default(),
            f.transaction_count.to_string(),
            f.asset_nunique.to_string(),
            format_decimal(f.amount_usd_liquidation),
            format_decimal(f.amount_usd_borrow),
            format_decimal(f.liquidation_to_borrow_ratio),
            f.liquidator_count.to_string(),
            f.liquidatee_count.to_string(),
            format_decimal(w.score),
        ]
    });

    stage(path, &FEATURE_TABLE_HEADER, rows)
}

fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

/// A fully written sibling temp file waiting to be renamed over its target.
/// Dropping it before [`commit`] removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

fn stage<I>(path: &Path, header: &[&str], rows: I) -> Result<StagedFile>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let staged = StagedFile {
        tmp: temp_path(path),
        path: path.to_path_buf(),
        committed: false,
    };

    let written = (|| -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&staged.tmp)?);
        writeln!(writer, "{}", csv::join_record(header.iter().copied()))?;
        for row in rows {
            writeln!(writer, "{}", csv::join_record(row.iter().map(String::as_str)))?;
        }
        writer.flush()
    })();

    written.map_err(|source| ScoringError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(staged)
}

/// Rename every staged file into place. If any rename fails, files already
/// renamed are removed and the remaining temp files are discarded, so either
/// all outputs exist or none do.
pub fn commit(staged: Vec<StagedFile>) -> Result<()> {
    let mut renamed: Vec<PathBuf> = Vec::with_capacity(staged.len());

    for mut file in staged {
        if let Err(source) = fs::rename(&file.tmp, &file.path) {
            for path in &renamed {
                let _ = fs::remove_file(path);
            }
            return Err(ScoringError::Write {
                path: file.path.clone(),
                source,
            });
        }
        file.committed = true;
        renamed.push(file.path.clone());
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
