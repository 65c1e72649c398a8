use std::path::PathBuf;

use clap::{Parser, Subcommand};

use creditscore::analysis;
use creditscore::config::AppConfig;
use creditscore::ingestion::pipeline::run_and_persist;
use creditscore::metrics::{init_metrics, write_snapshot};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score wallets from lending-protocol transaction files
    Score {
        /// Input JSON files (overrides INPUT_FILES)
        files: Vec<PathBuf>,

        /// Number of wallets to keep (overrides TOP_N)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Two-column wallet,score output (overrides TOP_WALLETS_PATH)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Full per-wallet feature table (overrides FEATURES_PATH)
        #[arg(long)]
        features_output: Option<PathBuf>,

        /// Prometheus text snapshot of run metrics (overrides METRICS_PATH)
        #[arg(long)]
        metrics_output: Option<PathBuf>,
    },
    /// Summarize a scored wallet file
    Analyze {
        #[arg(long, default_value = "top_wallets.csv")]
        top_wallets: PathBuf,

        /// Feature table for correlation analysis
        #[arg(long)]
        features: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            files,
            top_n,
            output,
            features_output,
            metrics_output,
        } => {
            let mut config = AppConfig::from_env()?;
            if !files.is_empty() {
                config.input_files = files;
            }
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(path) = output {
                config.top_wallets_path = path;
            }
            if features_output.is_some() {
                config.features_path = features_output;
            }
            if metrics_output.is_some() {
                config.metrics_path = metrics_output;
            }

            if !config.has_inputs() {
                anyhow::bail!("no input files: pass them as arguments or set INPUT_FILES");
            }

            let metrics_handle = match &config.metrics_path {
                Some(_) => Some(init_metrics()?),
                None => None,
            };

            tracing::info!(
                files = config.input_files.len(),
                top_n = config.top_n,
                output = %config.top_wallets_path.display(),
                "Starting scoring run"
            );

            let run = run_and_persist(&config).await?;

            tracing::info!(
                loaded = run.loaded(),
                dropped = run.dropped,
                wallets = run.scored.len(),
                selected = run.top.len(),
                "Scoring run finished"
            );

            if let (Some(handle), Some(path)) = (&metrics_handle, &config.metrics_path) {
                write_snapshot(handle, path)?;
            }
        }

        Commands::Analyze {
            top_wallets,
            features,
        } => {
            let report = analysis::analyze(&top_wallets, features.as_deref())?;
            print!("{report}");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
