pub mod report;
pub mod stats;

pub use report::{analyze, correlations_with, extremes, load_feature_table, load_top_wallets, AnalysisReport, FeatureTable};
pub use stats::{boxplot_outliers, pearson, score_histogram, BoxPlot, HistogramBin};
