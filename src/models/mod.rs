pub mod transaction;
pub mod wallet;

pub use transaction::{RawTransaction, Transaction, TransactionKind};
pub use wallet::{ScoredWallet, TopWallet, WalletFeatures};
