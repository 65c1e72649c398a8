pub mod aggregator;
pub mod scorer;
pub mod selector;

pub use aggregator::{aggregate, tally_liquidation_roles, LiquidationRoles};
pub use scorer::{credit_score, score_all, score_wallet};
pub use selector::select_top;
