use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use metrics::{gauge, histogram};

use crate::config::AppConfig;
use crate::errors::{Result, ScoringError};
use crate::ingestion::loader::load_files;
use crate::ingestion::normalize::normalize;
use crate::intelligence::{aggregate, score_all, select_top};
use crate::models::{ScoredWallet, TopWallet, TransactionKind};
use crate::output;

/// Everything a scoring run produces, before anything is persisted.
#[derive(Debug, Clone)]
pub struct ScoringRun {
    /// Records loaded per kind, before invalid amounts were dropped.
    pub loaded_per_kind: BTreeMap<TransactionKind, usize>,
    pub dropped: usize,
    /// All wallets, sorted by wallet identifier.
    pub scored: Vec<ScoredWallet>,
    /// Highest scores first.
    pub top: Vec<TopWallet>,
}

impl ScoringRun {
    pub fn loaded(&self) -> usize {
        self.loaded_per_kind.values().sum()
    }
}

/// Run the scoring pipeline over `paths`:
/// 1. Load and flatten every input file
/// 2. Coerce amounts and timestamps, dropping invalid amounts
/// 3. Aggregate per-wallet features
/// 4. Score every wallet
/// 5. Select the top `top_n`
pub async fn run(paths: &[PathBuf], top_n: usize) -> Result<ScoringRun> {
    let start = Instant::now();

    // Step 1: Load
    let loaded = load_files(paths).await?;
    if loaded.is_empty() {
        tracing::warn!(files = paths.len(), "No data was loaded from the input files");
        return Err(ScoringError::NoData);
    }
    tracing::info!(
        files = loaded.files,
        records = loaded.records.len(),
        "Raw records loaded"
    );

    // Step 2: Normalize
    let batch = normalize(loaded.records);
    if batch.transactions.is_empty() {
        tracing::warn!(dropped = batch.dropped, "Every loaded record had an invalid amount");
        return Err(ScoringError::NoData);
    }

    // Step 3: Aggregate
    let features = aggregate(&batch.transactions)?;
    tracing::info!(
        wallets = features.len(),
        valid = batch.transactions.len(),
        dropped = batch.dropped,
        "Feature engineering completed"
    );

    // Step 4: Score
    let scored = score_all(features);
    gauge!("wallets_scored").set(scored.len() as f64);

    // Step 5: Select
    let top = select_top(&scored, top_n);
    tracing::info!(selected = top.len(), requested = top_n, "Credit scoring completed");

    histogram!("pipeline_duration_seconds").record(start.elapsed().as_secs_f64());

    Ok(ScoringRun {
        loaded_per_kind: loaded.per_kind,
        dropped: batch.dropped,
        scored,
        top,
    })
}

/// Run the pipeline and persist its outputs. Nothing is written unless
/// every stage succeeded.
pub async fn run_and_persist(config: &AppConfig) -> Result<ScoringRun> {
    let run = run(&config.input_files, config.top_n).await?;

    let mut staged = vec![output::stage_top_wallets(&config.top_wallets_path, &run.top)?];
    if let Some(path) = &config.features_path {
        staged.push(output::stage_feature_table(path, &run.scored)?);
    }

    let written: Vec<String> = staged.iter().map(|f| f.path().display().to_string()).collect();
    output::commit(staged)?;
    tracing::info!(files = ?written, top = run.top.len(), wallets = run.scored.len(), "Outputs written");

    Ok(run)
}
