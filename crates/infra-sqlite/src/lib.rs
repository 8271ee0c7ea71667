// Futon Infrastructure - SQLite Adapter
// Implements: ItemStore, OrderStore, HistoryLedger, TransactionalDryingStore, UserDirectory

mod connection;
mod error;
mod migration;
mod queries;
mod rows;
mod store;
mod transaction;
mod user_directory;

pub use connection::create_pool;
pub use migration::{current_version, run_migrations};
pub use store::SqliteDryingStore;
pub use transaction::SqliteDryingTransaction;
pub use user_directory::SqliteUserDirectory;

// Note: sqlx::Error conversion is handled by `error::map_sqlx_error`
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
