//! Core business logic abstractions

pub mod config;
pub mod ledger;
pub mod log;
pub mod market;
pub mod metrics;
pub mod models;
pub mod store;
pub mod validation;

// Re-export main types for cleaner imports
pub use market::{Market, MarketDataProvider};
pub use metrics::DashboardMetrics;
pub use models::{
    BorrowingPosition, Dashboard, LendingPosition, NewPosition, NewTransaction, Transaction,
    TransactionKind, UpsertUser, User,
};
pub use store::PositionStore;
