use std::path::PathBuf;

/// Fatal conditions that abort a scoring run. Recoverable per-record
/// problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: expected a JSON object at the top level", path.display())]
    NotAnObject { path: PathBuf },

    #[error("no data: none of the input files contained a transaction record")]
    NoData,

    #[error("amountUSD totals for wallet {wallet} exceed the decimal range")]
    Overflow { wallet: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScoringError {
    /// The file this error is about, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ScoringError::Read { path, .. }
            | ScoringError::Parse { path, .. }
            | ScoringError::NotAnObject { path }
            | ScoringError::Write { path, .. } => Some(path),
            ScoringError::NoData | ScoringError::Overflow { .. } => None,
        }
    }
}

pub type Result<T, E = ScoringError> = std::result::Result<T, E>;
