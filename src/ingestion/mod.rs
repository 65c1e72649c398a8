pub mod loader;
pub mod normalize;
pub mod pipeline;

pub use loader::{load_files, parse_document, LoadedRecords};
pub use normalize::{normalize, NormalizedBatch};
pub use pipeline::{run, run_and_persist, ScoringRun};
