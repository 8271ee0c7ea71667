// Port Layer - Interfaces for external dependencies

pub mod history_ledger;
pub mod id_provider; // For deterministic testing
pub mod item_store;
pub mod mocks;
pub mod notifier;
pub mod order_store;
pub mod time_provider;
pub mod transaction;
pub mod user_directory;

// Re-exports
pub use history_ledger::HistoryLedger;
pub use id_provider::{IdProvider, RecordKind};
pub use item_store::ItemStore;
pub use notifier::{NotificationKind, NotificationPayload, Notifier};
pub use order_store::OrderStore;
pub use time_provider::TimeProvider;
pub use transaction::{DryingTransaction, Transaction, TransactionalDryingStore};
pub use user_directory::{UserContact, UserDirectory};
