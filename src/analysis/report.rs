use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::analysis::stats::{boxplot_outliers, pearson, score_histogram, BoxPlot, HistogramBin};
use crate::models::TopWallet;
use crate::output::csv::parse_records;
use crate::output::TOP_WALLETS_HEADER;

pub const HISTOGRAM_BINS: usize = 20;
pub const EXTREMES: usize = 5;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a `wallet,score` file.
pub fn load_top_wallets(path: &Path) -> anyhow::Result<Vec<TopWallet>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut records = parse_records(&contents).into_iter();

    let header = records.next().unwrap_or_default();
    if header != TOP_WALLETS_HEADER {
        anyhow::bail!(
            "{}: expected header `{}`, found `{}`",
            path.display(),
            TOP_WALLETS_HEADER.join(","),
            header.join(",")
        );
    }

    records
        .enumerate()
        .map(|(i, fields)| -> anyhow::Result<TopWallet> {
            match fields.as_slice() {
                [wallet, score] => Ok(TopWallet {
                    wallet: wallet.clone(),
                    score: Decimal::from_str(score.trim())
                        .with_context(|| format!("{}: record {}: bad score", path.display(), i + 1))?,
                }),
                _ => anyhow::bail!("{}: record {}: expected 2 fields", path.display(), i + 1),
            }
        })
        .collect()
}

/// Numeric columns of a feature table. Non-numeric columns are left out;
/// empty cells are missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl FeatureTable {
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }
}

pub fn load_feature_table(path: &Path) -> anyhow::Result<FeatureTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut records = parse_records(&contents).into_iter();

    let header = records
        .next()
        .with_context(|| format!("{}: empty feature table", path.display()))?;

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); header.len()];
    for (i, fields) in records.enumerate() {
        if fields.len() != header.len() {
            anyhow::bail!(
                "{}: record {}: expected {} fields, found {}",
                path.display(),
                i + 1,
                header.len(),
                fields.len()
            );
        }
        for (column, field) in cells.iter_mut().zip(fields) {
            column.push(field);
        }
    }

    let columns = header
        .into_iter()
        .zip(cells)
        .filter_map(|(name, raw)| numeric_column(&raw).map(|values| (name, values)))
        .collect();

    Ok(FeatureTable { columns })
}

fn numeric_column(raw: &[String]) -> Option<Vec<Option<f64>>> {
    raw.iter()
        .map(|cell| {
            let cell = cell.trim();
            if cell.is_empty() {
                Some(None)
            } else {
                cell.parse::<f64>().ok().map(Some)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Highest and lowest `k` wallets by score.
pub fn extremes(wallets: &[TopWallet], k: usize) -> (Vec<TopWallet>, Vec<TopWallet>) {
    let mut ranked: Vec<&TopWallet> = wallets.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    let top = ranked.iter().take(k).map(|w| (*w).clone()).collect();

    ranked.sort_by(|a, b| a.score.cmp(&b.score));
    let bottom = ranked.iter().take(k).map(|w| (*w).clone()).collect();

    (top, bottom)
}

/// Correlation of every numeric column against `target`.
pub fn correlations_with(table: &FeatureTable, target: &str) -> Option<Vec<(String, Option<f64>)>> {
    let target_values = table.column(target)?;

    Some(
        table
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), pearson(values, target_values)))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub wallets: usize,
    pub histogram: Vec<HistogramBin>,
    pub boxplot: Option<BoxPlot>,
    pub highest: Vec<TopWallet>,
    pub lowest: Vec<TopWallet>,
    pub correlations: Option<Vec<(String, Option<f64>)>>,
}

/// Build the report. A missing or unreadable feature table only drops the
/// correlation section.
pub fn analyze(top_wallets: &Path, features: Option<&Path>) -> anyhow::Result<AnalysisReport> {
    let wallets = load_top_wallets(top_wallets)?;
    tracing::info!(path = %top_wallets.display(), wallets = wallets.len(), "Top wallets loaded");

    let scores: Vec<f64> = wallets.iter().filter_map(|w| w.score.to_f64()).collect();
    let (highest, lowest) = extremes(&wallets, EXTREMES);

    let correlations = features.and_then(|path| match load_feature_table(path) {
        Ok(table) => {
            let correlations = correlations_with(&table, "score");
            if correlations.is_none() {
                tracing::warn!(path = %path.display(), "Feature table has no score column");
            }
            correlations
        }
        Err(e) => {
            tracing::warn!(error = %e, "Skipping correlation analysis");
            None
        }
    });

    Ok(AnalysisReport {
        wallets: wallets.len(),
        histogram: score_histogram(&scores, HISTOGRAM_BINS),
        boxplot: boxplot_outliers(&scores),
        highest,
        lowest,
        correlations,
    })
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wallets: {}", self.wallets)?;

        writeln!(f, "\nScore distribution:")?;
        let widest = self.histogram.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for bin in &self.histogram {
            let bar = "#".repeat(bin.count * 40 / widest);
            writeln!(f, "  [{:>6.2}, {:>6.2}] {:>6} {bar}", bin.lower, bin.upper, bin.count)?;
        }

        if let Some(bp) = &self.boxplot {
            writeln!(
                f,
                "\nQuartiles: q1={:.2} median={:.2} q3={:.2} (fences {:.2} .. {:.2})",
                bp.q1, bp.median, bp.q3, bp.lower_fence, bp.upper_fence
            )?;
            writeln!(f, "Outliers: {}", bp.outliers.len())?;
        }

        writeln!(f, "\nTop {} wallets with highest scores:", self.highest.len())?;
        for w in &self.highest {
            writeln!(f, "  {} {}", w.wallet, w.score.normalize())?;
        }

        writeln!(f, "\nTop {} wallets with lowest scores:", self.lowest.len())?;
        for w in &self.lowest {
            writeln!(f, "  {} {}", w.wallet, w.score.normalize())?;
        }

        if let Some(correlations) = &self.correlations {
            writeln!(f, "\nCorrelations with score:")?;
            for (name, r) in correlations {
                match r {
                    Some(r) => writeln!(f, "  {name:<28} {r:>7.3}")?,
                    None => writeln!(f, "  {name:<28}     n/a")?,
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
