use std::env;
use std::path::PathBuf;

pub const DEFAULT_TOP_N: usize = 1000;
const DEFAULT_TOP_WALLETS_PATH: &str = "top_wallets.csv";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input_files: Vec<PathBuf>,
    pub top_n: usize,
    pub top_wallets_path: PathBuf,

    // Optional outputs
    pub features_path: Option<PathBuf>,
    pub metrics_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_files: Vec::new(),
            top_n: DEFAULT_TOP_N,
            top_wallets_path: PathBuf::from(DEFAULT_TOP_WALLETS_PATH),
            features_path: None,
            metrics_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let input_files_raw = env::var("INPUT_FILES").unwrap_or_default();

        Ok(Self {
            input_files: split_paths(&input_files_raw),
            top_n: match env::var("TOP_N") {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("TOP_N must be a non-negative integer: {e}"))?,
                Err(_) => DEFAULT_TOP_N,
            },
            top_wallets_path: env::var("TOP_WALLETS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOP_WALLETS_PATH)),
            features_path: non_empty_var("FEATURES_PATH").map(PathBuf::from),
            metrics_path: non_empty_var("METRICS_PATH").map(PathBuf::from),
        })
    }

    /// Returns true if at least one input file is configured.
    pub fn has_inputs(&self) -> bool {
        !self.input_files.is_empty()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paths_skips_blanks() {
        let paths = split_paths(" a.json, ,b.json,");
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.top_n, 1000);
        assert_eq!(config.top_wallets_path, PathBuf::from("top_wallets.csv"));
        assert!(!config.has_inputs());
    }
}
